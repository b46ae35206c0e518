//! Status classification shared by every limit check

use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of the limit (percent) at which a check enters WARNING
pub const WARNING_PERCENT: u64 = 85;

/// Share of the limit (percent) at which a check enters DANGER
pub const DANGER_PERCENT: u64 = 95;

/// How close a running total is to its limit, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Good,
    Warning,
    Danger,
    Exceeded,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Good => "GOOD",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
            Self::Exceeded => "EXCEEDED",
        };
        f.write_str(label)
    }
}

/// Classify `current` against `limit`.
///
/// Ratios are compared in integer arithmetic so boundary values
/// (exactly 85%, exactly 100%) land in the higher tier.
pub fn classify(current: u32, limit: u32) -> ComplianceStatus {
    if limit == 0 {
        return if current == 0 {
            ComplianceStatus::Good
        } else {
            ComplianceStatus::Exceeded
        };
    }

    let scaled = current as u64 * 100;
    let limit = limit as u64;

    if scaled >= limit * 100 {
        ComplianceStatus::Exceeded
    } else if scaled >= limit * DANGER_PERCENT {
        ComplianceStatus::Danger
    } else if scaled >= limit * WARNING_PERCENT {
        ComplianceStatus::Warning
    } else {
        ComplianceStatus::Good
    }
}

/// Percentage of the limit consumed, capped at 100 for display.
pub fn percentage_of_limit(current: u32, limit: u32) -> f64 {
    if limit == 0 {
        return if current == 0 { 0.0 } else { 100.0 };
    }
    (current as f64 / limit as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let limit = 3600;
        assert_eq!(classify(3060, limit), ComplianceStatus::Warning); // exactly 85%
        assert_eq!(classify(3059, limit), ComplianceStatus::Good);
        assert_eq!(classify(3420, limit), ComplianceStatus::Danger); // exactly 95%
        assert_eq!(classify(3419, limit), ComplianceStatus::Warning);
        assert_eq!(classify(3600, limit), ComplianceStatus::Exceeded);
        assert_eq!(classify(3599, limit), ComplianceStatus::Danger);
        assert_eq!(classify(0, limit), ComplianceStatus::Good);
    }

    #[test]
    fn boundaries_on_uneven_limit() {
        // 85% of 11400 = 9690, 95% = 10830
        assert_eq!(classify(9690, 11400), ComplianceStatus::Warning);
        assert_eq!(classify(9689, 11400), ComplianceStatus::Good);
        assert_eq!(classify(10830, 11400), ComplianceStatus::Danger);
    }

    #[test]
    fn percentage_is_capped() {
        assert_eq!(percentage_of_limit(1800, 3600), 50.0);
        assert_eq!(percentage_of_limit(3600, 3600), 100.0);
        assert_eq!(percentage_of_limit(7200, 3600), 100.0);
        assert_eq!(percentage_of_limit(0, 3600), 0.0);
    }

    #[test]
    fn zero_limit() {
        assert_eq!(classify(0, 0), ComplianceStatus::Good);
        assert_eq!(classify(1, 0), ComplianceStatus::Exceeded);
    }

    #[test]
    fn ordering_from_best_to_worst() {
        assert!(ComplianceStatus::Good < ComplianceStatus::Warning);
        assert!(ComplianceStatus::Warning < ComplianceStatus::Danger);
        assert!(ComplianceStatus::Danger < ComplianceStatus::Exceeded);
    }

    #[test]
    fn serializes_upper_case() {
        let json = serde_json::to_string(&ComplianceStatus::Exceeded).unwrap();
        assert_eq!(json, "\"EXCEEDED\"");
    }
}
