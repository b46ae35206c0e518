//! Shared types for crew settings and warnings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the crew member's body clock matches local time at the report location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acclimatization {
    #[default]
    Acclimatized,
    Unacclimatized,
}

impl Acclimatization {
    pub fn from_flag(acclimatized: bool) -> Self {
        if acclimatized {
            Self::Acclimatized
        } else {
            Self::Unacclimatized
        }
    }

    pub fn is_acclimatized(&self) -> bool {
        matches!(self, Self::Acclimatized)
    }
}

/// Flight crew composition, selecting the flight-time ceiling of a single duty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewComposition {
    /// Minimum crew, no in-flight relief
    #[default]
    Standard,
    /// Additional crew carried for in-flight relief
    Augmented,
}

impl CrewComposition {
    pub fn from_flag(augmented: bool) -> Self {
        if augmented {
            Self::Augmented
        } else {
            Self::Standard
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Augmented => "augmented",
        }
    }
}

impl fmt::Display for CrewComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Persisted crew preferences used when a caller omits a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrewPreferences {
    pub acclimatization: Acclimatization,
    pub crew: CrewComposition,
}

/// Warning severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Warn,
    Critical,
}

/// FDP countdown warning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningThreshold {
    /// Minutes before the end of the maximum FDP to issue this warning
    pub minutes_before: u32,
    pub severity: WarningSeverity,
    pub message_template: Option<String>,
}
