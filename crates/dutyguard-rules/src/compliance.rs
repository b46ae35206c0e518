//! Rolling-window compliance aggregation
//!
//! Duty and flight minutes from logged records are summed over trailing
//! 7, 28 and 365 day windows and classified against cumulative limits. An
//! active duty contributes two instantaneous checks on top.

use chrono::{Days, NaiveDate};
use dutyguard_api::{CrewComposition, DutyRecord};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::status::{ComplianceStatus, classify, percentage_of_limit};

/// Duty in any 7 days (60h)
pub const SEVEN_DAY_DUTY_LIMIT: u32 = 3600;
/// Duty in any 28 days (190h)
pub const TWENTY_EIGHT_DAY_DUTY_LIMIT: u32 = 11400;
/// Flight time in any 28 days (112h)
pub const TWENTY_EIGHT_DAY_FLIGHT_LIMIT: u32 = 6720;
/// Flight time in any 365 days (1000h)
pub const YEAR_FLIGHT_LIMIT: u32 = 60000;

/// Flight time in a single duty, standard crew (8h)
pub const STANDARD_FLIGHT_TIME_LIMIT: u32 = 480;
/// Flight time in a single duty, augmented crew (13h)
pub const AUGMENTED_FLIGHT_TIME_LIMIT: u32 = 780;

/// Which limit a [`ComplianceCheck`] measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    SevenDayDuty,
    TwentyEightDayDuty,
    TwentyEightDayFlight,
    YearFlight,
    CurrentFdp,
    CurrentFlightTime,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SevenDayDuty => "7-Day Duty",
            Self::TwentyEightDayDuty => "28-Day Duty",
            Self::TwentyEightDayFlight => "28-Day Flight Time",
            Self::YearFlight => "365-Day Flight Time",
            Self::CurrentFdp => "Current FDP",
            Self::CurrentFlightTime => "Current Flight Time",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trailing windows in evaluation order: kind, days, limit, summed field
const WINDOWS: [(CheckKind, u64, u32, Metric); 4] = [
    (CheckKind::SevenDayDuty, 7, SEVEN_DAY_DUTY_LIMIT, Metric::Duty),
    (
        CheckKind::TwentyEightDayDuty,
        28,
        TWENTY_EIGHT_DAY_DUTY_LIMIT,
        Metric::Duty,
    ),
    (
        CheckKind::TwentyEightDayFlight,
        28,
        TWENTY_EIGHT_DAY_FLIGHT_LIMIT,
        Metric::Flight,
    ),
    (CheckKind::YearFlight, 365, YEAR_FLIGHT_LIMIT, Metric::Flight),
];

#[derive(Debug, Clone, Copy)]
enum Metric {
    Duty,
    Flight,
}

impl Metric {
    fn minutes(&self, record: &DutyRecord) -> u32 {
        match self {
            Self::Duty => record.duty_minutes(),
            Self::Flight => record.flight_minutes,
        }
    }
}

/// What a check is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckScope {
    /// Trailing window of `days` ending today, both ends inclusive
    Window { days: u32 },
    /// Point-in-time check on the active duty
    Instant { crew: CrewComposition },
}

/// One metric evaluated against its limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceCheck {
    pub kind: CheckKind,
    pub current_minutes: u32,
    pub limit_minutes: u32,
    pub remaining_minutes: u32,
    /// Share of the limit consumed, capped at 100
    pub percentage: f64,
    pub status: ComplianceStatus,
    /// False only when the limit is strictly exceeded
    pub compliant: bool,
    pub scope: CheckScope,
    pub record_count: usize,
}

impl ComplianceCheck {
    pub fn new(
        kind: CheckKind,
        current_minutes: u32,
        limit_minutes: u32,
        scope: CheckScope,
        record_count: usize,
    ) -> Self {
        Self {
            kind,
            current_minutes,
            limit_minutes,
            remaining_minutes: limit_minutes.saturating_sub(current_minutes),
            percentage: percentage_of_limit(current_minutes, limit_minutes),
            status: classify(current_minutes, limit_minutes),
            compliant: current_minutes <= limit_minutes,
            scope,
            record_count,
        }
    }
}

/// Figures from an in-progress duty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDutyMetrics {
    pub elapsed_fdp_minutes: u32,
    pub max_fdp_minutes: u32,
    pub elapsed_flight_minutes: u32,
    pub crew: CrewComposition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub as_of: NaiveDate,
    pub overall: ComplianceStatus,
    pub checks: Vec<ComplianceCheck>,
    /// Checks whose limit is strictly exceeded
    pub violations: Vec<ComplianceCheck>,
    /// Checks in the WARNING band
    pub warnings: Vec<ComplianceCheck>,
}

impl ComplianceReport {
    /// Assemble a report from evaluated checks.
    ///
    /// The overall status is EXCEEDED when any limit is strictly exceeded,
    /// then DANGER, WARNING and GOOD by the worst remaining check. A check
    /// exactly on its limit has EXCEEDED status yet stays compliant; it
    /// raises the overall status to DANGER rather than being ignored, which
    /// is a deliberate departure from counting only checks in the DANGER
    /// band.
    pub fn from_checks(as_of: NaiveDate, checks: Vec<ComplianceCheck>) -> Self {
        let violations: Vec<ComplianceCheck> =
            checks.iter().filter(|c| !c.compliant).cloned().collect();
        let warnings: Vec<ComplianceCheck> = checks
            .iter()
            .filter(|c| c.status == ComplianceStatus::Warning)
            .cloned()
            .collect();

        let overall = if !violations.is_empty() {
            ComplianceStatus::Exceeded
        } else if checks.iter().any(|c| c.status >= ComplianceStatus::Danger) {
            ComplianceStatus::Danger
        } else if !warnings.is_empty() {
            ComplianceStatus::Warning
        } else {
            ComplianceStatus::Good
        };

        Self {
            as_of,
            overall,
            checks,
            violations,
            warnings,
        }
    }

    pub fn check(&self, kind: CheckKind) -> Option<&ComplianceCheck> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Evaluate every limit over `records` as of `today`.
///
/// Records dated after `today` are ignored. An empty record set is a valid,
/// fully compliant history.
pub fn evaluate_compliance(
    records: &[DutyRecord],
    active: Option<&ActiveDutyMetrics>,
    today: NaiveDate,
) -> ComplianceReport {
    let mut checks: Vec<ComplianceCheck> = WINDOWS
        .iter()
        .map(|&(kind, days, limit, metric)| {
            let start = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
            let in_window: Vec<&DutyRecord> = records
                .iter()
                .filter(|r| r.date >= start && r.date <= today)
                .collect();
            let total = in_window
                .iter()
                .fold(0u32, |sum, r| sum.saturating_add(metric.minutes(r)));

            ComplianceCheck::new(
                kind,
                total,
                limit,
                CheckScope::Window { days: days as u32 },
                in_window.len(),
            )
        })
        .collect();

    if let Some(active) = active {
        let scope = CheckScope::Instant { crew: active.crew };
        checks.push(ComplianceCheck::new(
            CheckKind::CurrentFdp,
            active.elapsed_fdp_minutes,
            active.max_fdp_minutes,
            scope,
            0,
        ));
        checks.push(ComplianceCheck::new(
            CheckKind::CurrentFlightTime,
            active.elapsed_flight_minutes,
            flight_time_limit(active.crew),
            scope,
            0,
        ));
    }

    let report = ComplianceReport::from_checks(today, checks);

    debug!(
        as_of = %today,
        records = records.len(),
        active = active.is_some(),
        overall = %report.overall,
        violations = report.violations.len(),
        "Compliance evaluated"
    );

    report
}

/// Single-duty flight-time ceiling for a crew composition
pub fn flight_time_limit(crew: CrewComposition) -> u32 {
    match crew {
        CrewComposition::Standard => STANDARD_FLIGHT_TIME_LIMIT,
        CrewComposition::Augmented => AUGMENTED_FLIGHT_TIME_LIMIT,
    }
}

/// The most restrictive of the short-term cumulative limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub limiting_factor: CheckKind,
    pub remaining_minutes: u32,
}

/// Headroom left before the first of the 7-day duty, 28-day duty and 28-day
/// flight limits is reached. Ties go to the earlier of those checks.
///
/// Returns `None` if the report carries none of those checks.
pub fn availability(report: &ComplianceReport) -> Option<Availability> {
    [
        CheckKind::SevenDayDuty,
        CheckKind::TwentyEightDayDuty,
        CheckKind::TwentyEightDayFlight,
    ]
    .into_iter()
    .filter_map(|kind| report.check(kind))
    .min_by_key(|check| check.remaining_minutes)
    .map(|check| Availability {
        limiting_factor: check.kind,
        remaining_minutes: check.remaining_minutes,
    })
}
