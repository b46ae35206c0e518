//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    #[serde(default)]
    pub service: RawServiceConfig,

    /// Crew defaults used when a command omits them
    #[serde(default)]
    pub crew: RawCrewConfig,

    #[serde(default)]
    pub countdown: RawCountdownConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the record store
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCrewConfig {
    pub acclimatized: Option<bool>,
    pub augmented: Option<bool>,
}

/// Live FDP countdown settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCountdownConfig {
    /// How often `watch` re-evaluates the active duty
    pub poll_interval_seconds: Option<u64>,

    /// Replaces the built-in warnings when present
    pub warnings: Option<Vec<RawWarningThreshold>>,
}

/// Warning threshold
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawWarningThreshold {
    /// Minutes before the end of the maximum FDP
    pub minutes_before: u32,

    /// Severity: "info", "warn", "critical"
    #[serde(default = "default_severity")]
    pub severity: String,

    /// Message template
    pub message: Option<String>,
}

fn default_severity() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [service]
            data_dir = "/var/lib/dutyguard"

            [crew]
            acclimatized = false
            augmented = true

            [countdown]
            poll_interval_seconds = 30

            [[countdown.warnings]]
            minutes_before = 45
            severity = "critical"
            message = "45 minutes of FDP left"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.data_dir, Some(PathBuf::from("/var/lib/dutyguard")));
        assert_eq!(config.crew.acclimatized, Some(false));
        assert_eq!(config.countdown.poll_interval_seconds, Some(30));
        let warnings = config.countdown.warnings.unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, "critical");
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.service.data_dir.is_none());
        assert!(config.crew.augmented.is_none());
        assert!(config.countdown.warnings.is_none());
    }

    #[test]
    fn severity_defaults_to_warn() {
        let toml_str = r#"
            config_version = 1

            [[countdown.warnings]]
            minutes_before = 20
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.countdown.warnings.unwrap()[0].severity, "warn");
    }
}
