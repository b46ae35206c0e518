//! Configuration validation

use crate::schema::{RawConfig, RawWarningThreshold};
use dutyguard_api::WarningSeverity;
use dutyguard_rules::fdp::MIN_ABSOLUTE_FDP;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Warning at {minutes}m must be between 1 and 539 minutes before the FDP end")]
    WarningOutOfRange { minutes: u32 },

    #[error("Duplicate warning threshold: {0}m")]
    DuplicateWarning(u32),

    #[error("Unknown warning severity '{0}' (expected info, warn or critical)")]
    UnknownSeverity(String),

    #[error("Poll interval must be at least 1 second, got {0}")]
    InvalidPollInterval(u64),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(poll) = config.countdown.poll_interval_seconds
        && poll == 0
    {
        errors.push(ValidationError::InvalidPollInterval(poll));
    }

    if let Some(warnings) = &config.countdown.warnings {
        errors.extend(validate_warnings(warnings));
    }

    if let Some(dir) = &config.service.data_dir
        && dir.as_os_str().is_empty()
    {
        errors.push(ValidationError::GlobalError(
            "service.data_dir cannot be empty".into(),
        ));
    }

    errors
}

fn validate_warnings(warnings: &[RawWarningThreshold]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for warning in warnings {
        // A warning must be able to fire before even the shortest maximum FDP ends
        if warning.minutes_before == 0 || warning.minutes_before >= MIN_ABSOLUTE_FDP {
            errors.push(ValidationError::WarningOutOfRange {
                minutes: warning.minutes_before,
            });
        }

        if !seen.insert(warning.minutes_before) {
            errors.push(ValidationError::DuplicateWarning(warning.minutes_before));
        }

        if parse_severity(&warning.severity).is_none() {
            errors.push(ValidationError::UnknownSeverity(warning.severity.clone()));
        }
    }

    errors
}

/// Parse a severity name, case-insensitively
pub fn parse_severity(s: &str) -> Option<WarningSeverity> {
    match s.to_lowercase().as_str() {
        "info" => Some(WarningSeverity::Info),
        "warn" | "warning" => Some(WarningSeverity::Warn),
        "critical" => Some(WarningSeverity::Critical),
        _ => None,
    }
}
