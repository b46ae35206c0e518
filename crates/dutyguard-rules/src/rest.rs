//! Minimum rest after a duty

use chrono::{Days, NaiveDate};
use dutyguard_api::DutyRecord;
use dutyguard_util::{DutyError, TimeOfDay, day_offset, format_duration};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Rest after a duty shorter than 12h
pub const STANDARD_REST: u32 = 600;
/// Rest after a duty of 12h up to 14h
pub const EXTENDED_REST: u32 = 720;
/// Rest after a duty of 14h or more
pub const LONG_DUTY_REST: u32 = 840;

pub const EXTENDED_REST_THRESHOLD_HOURS: f64 = 12.0;
pub const LONG_DUTY_THRESHOLD_HOURS: f64 = 14.0;

/// Minimum uninterrupted sleep opportunity (8h)
pub const MIN_SLEEP_OPPORTUNITY: u32 = 480;
/// Travel and personal time around the sleep opportunity (2h)
pub const TRANSITION_ALLOWANCE: u32 = 120;

pub const MAX_PRECEDING_DUTY_HOURS: f64 = 24.0;
pub const MAX_TIMEZONES_CROSSED: u32 = 12;

/// Consecutive duty days allowed before mandatory time off
pub const MAX_CONSECUTIVE_DUTY_DAYS: u32 = 7;
/// Mandatory time off once the consecutive-day limit is reached (36h)
pub const MIN_TIME_OFF_MINUTES: u32 = 2160;

/// What a line of the minimum-rest breakdown represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestComponentKind {
    Base,
    TimezoneAdjustment,
    SleepOpportunityFloor,
}

/// One itemized contribution to the minimum rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestComponent {
    pub kind: RestComponentKind,
    pub minutes: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestResult {
    pub duty_end: TimeOfDay,
    pub preceding_duty_hours: f64,
    pub timezones_crossed: u32,
    pub min_rest_minutes: u32,
    /// Advisory only, never enforced
    pub recommended_rest_minutes: u32,
    pub next_report: TimeOfDay,
    /// Days between the duty end and the earliest next report
    pub days_later: u32,
    pub components: Vec<RestComponent>,
}

impl RestResult {
    pub fn next_report_display(&self) -> String {
        match self.days_later {
            0 => self.next_report.to_string(),
            n => format!("{} (+{})", self.next_report, n),
        }
    }
}

/// Compute the minimum rest following a duty.
///
/// # Errors
///
/// Returns [`DutyError::InvalidInput`] for a malformed end time, a preceding
/// duty outside `[0, 24]` hours, or more than 12 time zones crossed.
pub fn compute_min_rest(
    duty_end: &str,
    preceding_duty_hours: f64,
    timezones_crossed: u32,
) -> Result<RestResult, DutyError> {
    let end = TimeOfDay::parse(duty_end).ok_or_else(|| {
        DutyError::invalid(format!(
            "Invalid duty end time '{}': expected HH:MM (00:00-23:59)",
            duty_end
        ))
    })?;

    compute_min_rest_at(end, preceding_duty_hours, timezones_crossed)
}

/// Compute the minimum rest for an already-parsed duty end time.
pub fn compute_min_rest_at(
    duty_end: TimeOfDay,
    preceding_duty_hours: f64,
    timezones_crossed: u32,
) -> Result<RestResult, DutyError> {
    if !preceding_duty_hours.is_finite()
        || !(0.0..=MAX_PRECEDING_DUTY_HOURS).contains(&preceding_duty_hours)
    {
        return Err(DutyError::invalid(format!(
            "Preceding duty must be between 0 and 24 hours, got {}",
            preceding_duty_hours
        )));
    }
    if timezones_crossed > MAX_TIMEZONES_CROSSED {
        return Err(DutyError::invalid(format!(
            "Time zones crossed must be between 0 and {}, got {}",
            MAX_TIMEZONES_CROSSED, timezones_crossed
        )));
    }

    let mut components = Vec::new();

    let (base, base_description) = if preceding_duty_hours >= LONG_DUTY_THRESHOLD_HOURS {
        (LONG_DUTY_REST, "Long duty (14h or more)")
    } else if preceding_duty_hours >= EXTENDED_REST_THRESHOLD_HOURS {
        (EXTENDED_REST, "Extended duty (12h to 14h)")
    } else {
        (STANDARD_REST, "Standard duty (under 12h)")
    };
    components.push(RestComponent {
        kind: RestComponentKind::Base,
        minutes: base,
        description: format!("{}: {}", base_description, format_duration(base)),
    });
    let mut total = base;

    let adjustment = timezone_adjustment(timezones_crossed);
    if adjustment > 0 {
        components.push(RestComponent {
            kind: RestComponentKind::TimezoneAdjustment,
            minutes: adjustment,
            description: format!(
                "{} time zones crossed: +{}",
                timezones_crossed,
                format_duration(adjustment)
            ),
        });
        total += adjustment;
    }

    let floor = MIN_SLEEP_OPPORTUNITY + TRANSITION_ALLOWANCE;
    if total < floor {
        components.push(RestComponent {
            kind: RestComponentKind::SleepOpportunityFloor,
            minutes: floor - total,
            description: format!(
                "Raised to {} sleep opportunity plus {} transition",
                format_duration(MIN_SLEEP_OPPORTUNITY),
                format_duration(TRANSITION_ALLOWANCE)
            ),
        });
        total = floor;
    }

    let recommended = (total * 5).div_ceil(4);
    let next_minutes = duty_end.as_minutes() as i64 + total as i64;

    debug!(
        duty_end = %duty_end,
        preceding_duty_hours,
        timezones_crossed,
        min_rest = total,
        "Minimum rest computed"
    );

    Ok(RestResult {
        duty_end,
        preceding_duty_hours,
        timezones_crossed,
        min_rest_minutes: total,
        recommended_rest_minutes: recommended,
        next_report: TimeOfDay::from_minutes_wrapping(next_minutes),
        days_later: day_offset(next_minutes) as u32,
        components,
    })
}

/// Extra rest for time zones crossed: 0-2 none, 3-4 one hour, 5+ two hours
pub fn timezone_adjustment(timezones_crossed: u32) -> u32 {
    match timezones_crossed {
        0..=2 => 0,
        3..=4 => 60,
        _ => 120,
    }
}

/// How a proposed rest compares with the required minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "minutes", rename_all = "snake_case")]
pub enum RestMargin {
    Surplus(u32),
    Deficit(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestCompliance {
    pub compliant: bool,
    pub proposed_rest_minutes: u32,
    pub required_rest_minutes: u32,
    pub margin: RestMargin,
}

/// Check a proposed rest length against the minimum for the preceding duty.
pub fn check_rest_compliance(
    proposed_rest_minutes: u32,
    preceding_duty_minutes: u32,
    timezones_crossed: u32,
) -> Result<RestCompliance, DutyError> {
    // Only the duration matters, so any anchor time will do.
    let required = compute_min_rest_at(
        TimeOfDay::MIDNIGHT,
        preceding_duty_minutes as f64 / 60.0,
        timezones_crossed,
    )?
    .min_rest_minutes;

    let margin = if proposed_rest_minutes >= required {
        RestMargin::Surplus(proposed_rest_minutes - required)
    } else {
        RestMargin::Deficit(required - proposed_rest_minutes)
    };

    Ok(RestCompliance {
        compliant: matches!(margin, RestMargin::Surplus(_)),
        proposed_rest_minutes,
        required_rest_minutes: required,
        margin,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsecutiveDaysStatus {
    pub consecutive_days: u32,
    pub max_consecutive_days: u32,
    pub days_remaining: u32,
    pub time_off_required: bool,
    pub minimum_time_off_minutes: u32,
}

/// Days left before mandatory time off, given the current run of duty days.
pub fn consecutive_days_status(consecutive_days: u32) -> ConsecutiveDaysStatus {
    ConsecutiveDaysStatus {
        consecutive_days,
        max_consecutive_days: MAX_CONSECUTIVE_DUTY_DAYS,
        days_remaining: MAX_CONSECUTIVE_DUTY_DAYS.saturating_sub(consecutive_days),
        time_off_required: consecutive_days >= MAX_CONSECUTIVE_DUTY_DAYS,
        minimum_time_off_minutes: MIN_TIME_OFF_MINUTES,
    }
}

/// Length of the current run of calendar days carrying at least one duty.
///
/// The run ends today, or yesterday when nothing is logged for today yet.
pub fn consecutive_duty_days(records: &[DutyRecord], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = records
        .iter()
        .map(|r| r.date)
        .filter(|d| *d <= today)
        .collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut count = 0;
    while days.contains(&day) {
        count += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest(hours: f64, zones: u32) -> RestResult {
        compute_min_rest("18:00", hours, zones).unwrap()
    }

    #[test]
    fn tiering() {
        assert_eq!(rest(11.9, 0).min_rest_minutes, 600);
        assert_eq!(rest(12.0, 0).min_rest_minutes, 720);
        assert_eq!(rest(13.99, 0).min_rest_minutes, 720);
        assert_eq!(rest(14.0, 0).min_rest_minutes, 840);
        assert_eq!(rest(0.0, 0).min_rest_minutes, 600);
        assert_eq!(rest(24.0, 0).min_rest_minutes, 840);
    }

    #[test]
    fn timezone_adjustment_buckets() {
        assert_eq!(rest(8.0, 2).min_rest_minutes, 600);
        assert_eq!(rest(8.0, 3).min_rest_minutes, 660);
        assert_eq!(rest(8.0, 4).min_rest_minutes, 660);
        assert_eq!(rest(8.0, 5).min_rest_minutes, 720);
        assert_eq!(rest(14.0, 12).min_rest_minutes, 960);
    }

    #[test]
    fn components_are_itemized() {
        let result = rest(12.5, 4);
        assert_eq!(result.components.len(), 2);
        assert_eq!(result.components[0].kind, RestComponentKind::Base);
        assert_eq!(result.components[0].minutes, 720);
        assert_eq!(result.components[1].kind, RestComponentKind::TimezoneAdjustment);
        assert_eq!(result.components[1].minutes, 60);

        let no_zones = rest(8.0, 0);
        assert_eq!(no_zones.components.len(), 1);
    }

    #[test]
    fn recommended_rest_rounds_up() {
        assert_eq!(rest(8.0, 0).recommended_rest_minutes, 750);
        // 660 * 1.25 = 825
        assert_eq!(rest(8.0, 3).recommended_rest_minutes, 825);
        // 840 * 1.25 = 1050
        assert_eq!(rest(15.0, 0).recommended_rest_minutes, 1050);
    }

    #[test]
    fn next_report_rolls_over() {
        let result = rest(8.0, 0);
        assert_eq!(result.next_report, TimeOfDay::hm(4, 0));
        assert_eq!(result.days_later, 1);
        assert_eq!(result.next_report_display(), "04:00 (+1)");

        let morning = compute_min_rest("01:00", 8.0, 0).unwrap();
        assert_eq!(morning.next_report, TimeOfDay::hm(11, 0));
        assert_eq!(morning.days_later, 0);
        assert_eq!(morning.next_report_display(), "11:00");
    }

    #[test]
    fn invalid_inputs_are_errors() {
        assert!(matches!(
            compute_min_rest("18:60", 8.0, 0),
            Err(DutyError::InvalidInput(_))
        ));
        assert!(compute_min_rest("18:00", -0.5, 0).is_err());
        assert!(compute_min_rest("18:00", 24.5, 0).is_err());
        assert!(compute_min_rest("18:00", f64::NAN, 0).is_err());
        assert!(compute_min_rest("18:00", 8.0, 13).is_err());
    }

    #[test]
    fn rest_compliance_surplus_and_deficit() {
        let ok = check_rest_compliance(700, 9 * 60, 0).unwrap();
        assert!(ok.compliant);
        assert_eq!(ok.required_rest_minutes, 600);
        assert_eq!(ok.margin, RestMargin::Surplus(100));

        let exact = check_rest_compliance(720, 12 * 60, 0).unwrap();
        assert!(exact.compliant);
        assert_eq!(exact.margin, RestMargin::Surplus(0));

        let short = check_rest_compliance(700, 14 * 60, 5).unwrap();
        assert!(!short.compliant);
        assert_eq!(short.required_rest_minutes, 960);
        assert_eq!(short.margin, RestMargin::Deficit(260));

        assert!(check_rest_compliance(600, 25 * 60, 0).is_err());
    }

    #[test]
    fn consecutive_days_limit() {
        let fresh = consecutive_days_status(3);
        assert_eq!(fresh.days_remaining, 4);
        assert!(!fresh.time_off_required);

        let limit = consecutive_days_status(7);
        assert_eq!(limit.days_remaining, 0);
        assert!(limit.time_off_required);
        assert_eq!(limit.minimum_time_off_minutes, 2160);

        assert_eq!(consecutive_days_status(9).days_remaining, 0);
    }

    #[test]
    fn consecutive_duty_days_from_records() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let record = |days_ago: u64| {
            DutyRecord::new(
                today.checked_sub_days(Days::new(days_ago)).unwrap(),
                TimeOfDay::hm(8, 0),
                TimeOfDay::hm(16, 0),
            )
        };

        assert_eq!(consecutive_duty_days(&[], today), 0);

        let run = vec![record(0), record(1), record(2), record(4)];
        assert_eq!(consecutive_duty_days(&run, today), 3);

        // Nothing yet today: the run ending yesterday still counts
        let run = vec![record(1), record(2)];
        assert_eq!(consecutive_duty_days(&run, today), 2);

        // Two duties on one day count once
        let run = vec![record(0), record(0), record(1)];
        assert_eq!(consecutive_duty_days(&run, today), 2);

        // Gap of two days breaks the run
        let run = vec![record(2), record(3)];
        assert_eq!(consecutive_duty_days(&run, today), 0);
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn minimum_rest_never_below_floor(hours in 0.0f64..=24.0, zones in 0u32..=12) {
                let result = compute_min_rest_at(TimeOfDay::MIDNIGHT, hours, zones).unwrap();
                prop_assert!(result.min_rest_minutes >= MIN_SLEEP_OPPORTUNITY + TRANSITION_ALLOWANCE);
                prop_assert!(result.recommended_rest_minutes >= result.min_rest_minutes);
            }
        }
    }
}
