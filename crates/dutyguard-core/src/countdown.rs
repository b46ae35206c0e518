//! Live FDP countdown

use chrono::{DateTime, Local};
use dutyguard_api::ActiveDutySession;
use dutyguard_rules::{ComplianceStatus, classify, percentage_of_limit};
use dutyguard_util::{SessionId, TimeOfDay, format_duration};
use serde::Serialize;

/// Point-in-time view of an active duty against its maximum FDP
///
/// Each evaluation is independent; a later `now` simply yields a later view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DutyCountdown {
    pub session_id: SessionId,
    pub report_time: TimeOfDay,
    pub sectors: u8,
    pub elapsed_minutes: u32,
    pub remaining_minutes: u32,
    pub max_fdp_minutes: u32,
    /// Share of the maximum FDP consumed, capped at 100
    pub percentage: f64,
    pub fdp_end: DateTime<Local>,
    pub status: ComplianceStatus,
}

impl DutyCountdown {
    pub fn evaluate(session: &ActiveDutySession, now: DateTime<Local>) -> Self {
        let elapsed = session.elapsed_minutes(now);

        Self {
            session_id: session.session_id,
            report_time: session.report_time,
            sectors: session.sectors,
            elapsed_minutes: elapsed,
            remaining_minutes: session.remaining_minutes(now),
            max_fdp_minutes: session.max_fdp_minutes,
            percentage: percentage_of_limit(elapsed, session.max_fdp_minutes),
            fdp_end: session.fdp_deadline(),
            status: classify(elapsed, session.max_fdp_minutes),
        }
    }

    pub fn is_exceeded(&self) -> bool {
        self.remaining_minutes == 0
    }

    /// One-line summary, e.g. `4h 10m elapsed, 9h 50m remaining (29.8%) GOOD`
    pub fn summary(&self) -> String {
        format!(
            "{} elapsed, {} remaining ({:.1}%) {}",
            format_duration(self.elapsed_minutes),
            format_duration(self.remaining_minutes),
            self.percentage,
            self.status
        )
    }
}
