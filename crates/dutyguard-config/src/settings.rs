//! Validated settings structures

use crate::schema::{
    RawConfig, RawCountdownConfig, RawCrewConfig, RawServiceConfig, RawWarningThreshold,
};
use crate::validation::parse_severity;
use dutyguard_api::{
    Acclimatization, CrewComposition, CrewPreferences, WarningSeverity, WarningThreshold,
};
use dutyguard_util::{DATABASE_FILENAME, default_data_dir};
use std::path::PathBuf;
use std::time::Duration;

/// Default poll cadence of the live countdown
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 60;

/// Validated settings ready for use by the duty engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub service: ServiceConfig,

    /// Crew defaults applied when preferences are not stored yet
    pub crew: CrewPreferences,

    pub countdown: CountdownPolicy,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            crew: convert_crew(raw.crew),
            countdown: CountdownPolicy::from_raw(raw.countdown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILENAME)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Live FDP countdown settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownPolicy {
    pub poll_interval: Duration,
    /// Sorted from earliest to latest (largest `minutes_before` first)
    pub warnings: Vec<WarningThreshold>,
}

impl CountdownPolicy {
    fn from_raw(raw: RawCountdownConfig) -> Self {
        let warnings = raw
            .warnings
            .map(|w| w.into_iter().map(convert_warning).collect())
            .unwrap_or_else(default_warning_thresholds);

        Self {
            poll_interval: Duration::from_secs(
                raw.poll_interval_seconds
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS),
            ),
            warnings: sorted(warnings),
        }
    }
}

impl Default for CountdownPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
            warnings: default_warning_thresholds(),
        }
    }
}

// Conversion helpers

fn convert_crew(raw: RawCrewConfig) -> CrewPreferences {
    CrewPreferences {
        acclimatization: raw
            .acclimatized
            .map(Acclimatization::from_flag)
            .unwrap_or_default(),
        crew: raw
            .augmented
            .map(CrewComposition::from_flag)
            .unwrap_or_default(),
    }
}

fn convert_warning(raw: RawWarningThreshold) -> WarningThreshold {
    WarningThreshold {
        minutes_before: raw.minutes_before,
        severity: parse_severity(&raw.severity).unwrap_or(WarningSeverity::Warn),
        message_template: raw.message,
    }
}

fn sorted(mut warnings: Vec<WarningThreshold>) -> Vec<WarningThreshold> {
    warnings.sort_by(|a, b| b.minutes_before.cmp(&a.minutes_before));
    warnings
}

fn default_warning_thresholds() -> Vec<WarningThreshold> {
    vec![
        WarningThreshold {
            minutes_before: 60,
            severity: WarningSeverity::Info,
            message_template: Some("1 hour of FDP remaining".into()),
        },
        WarningThreshold {
            minutes_before: 30,
            severity: WarningSeverity::Warn,
            message_template: Some("30 minutes of FDP remaining".into()),
        },
        WarningThreshold {
            minutes_before: 10,
            severity: WarningSeverity::Critical,
            message_template: Some("10 minutes of FDP remaining!".into()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.crew.acclimatization, Acclimatization::Acclimatized);
        assert_eq!(settings.crew.crew, CrewComposition::Standard);
        assert_eq!(settings.countdown.poll_interval, Duration::from_secs(60));

        let minutes: Vec<u32> = settings
            .countdown
            .warnings
            .iter()
            .map(|w| w.minutes_before)
            .collect();
        assert_eq!(minutes, vec![60, 30, 10]);
    }

    #[test]
    fn test_warnings_sorted_latest_first() {
        let raw = RawCountdownConfig {
            poll_interval_seconds: Some(5),
            warnings: Some(vec![
                RawWarningThreshold {
                    minutes_before: 15,
                    severity: "critical".into(),
                    message: None,
                },
                RawWarningThreshold {
                    minutes_before: 90,
                    severity: "info".into(),
                    message: Some("90 minutes left".into()),
                },
            ]),
        };

        let policy = CountdownPolicy::from_raw(raw);
        assert_eq!(policy.poll_interval, Duration::from_secs(5));
        assert_eq!(policy.warnings[0].minutes_before, 90);
        assert_eq!(policy.warnings[1].severity, WarningSeverity::Critical);
    }

    #[test]
    fn test_database_path() {
        let service = ServiceConfig {
            data_dir: PathBuf::from("/srv/dutyguard"),
        };
        assert_eq!(
            service.database_path(),
            PathBuf::from("/srv/dutyguard/dutyguard.db")
        );
    }
}
