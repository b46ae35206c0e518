//! The active duty session

use chrono::{DateTime, Local, NaiveDate};
use dutyguard_util::{SessionId, TimeOfDay};
use serde::{Deserialize, Serialize};

use crate::{Acclimatization, CrewComposition};

/// A duty currently in progress
///
/// At most one exists at a time. The value is never patched in place:
/// sector changes and warning bookkeeping produce a new value that replaces
/// the stored one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDutySession {
    pub session_id: SessionId,
    /// Absolute start instant, for elapsed-time computation
    pub started_at: DateTime<Local>,
    pub report_date: NaiveDate,
    /// Local report time, for the FDP table lookup
    pub report_time: TimeOfDay,
    pub sectors: u8,
    pub acclimatization: Acclimatization,
    pub crew: CrewComposition,
    pub max_fdp_minutes: u32,
    /// Warning thresholds already issued (minutes before FDP end)
    #[serde(default)]
    pub warnings_issued: Vec<u32>,
}

impl ActiveDutySession {
    /// New value with a different sector count and its recomputed max FDP
    pub fn with_sectors(&self, sectors: u8, max_fdp_minutes: u32) -> Self {
        Self {
            sectors,
            max_fdp_minutes,
            ..self.clone()
        }
    }

    /// New value recording that a warning threshold fired
    pub fn with_warning_issued(&self, minutes_before: u32) -> Self {
        let mut next = self.clone();
        if !next.warnings_issued.contains(&minutes_before) {
            next.warnings_issued.push(minutes_before);
        }
        next
    }

    /// Wall-clock instant at which the maximum FDP runs out
    pub fn fdp_deadline(&self) -> DateTime<Local> {
        self.started_at + chrono::Duration::minutes(self.max_fdp_minutes as i64)
    }

    /// Whole minutes on duty so far (zero if `now` precedes the start)
    pub fn elapsed_minutes(&self, now: DateTime<Local>) -> u32 {
        let elapsed = now.signed_duration_since(self.started_at).num_minutes();
        elapsed.clamp(0, u32::MAX as i64) as u32
    }

    /// Minutes left before the maximum FDP is reached
    pub fn remaining_minutes(&self, now: DateTime<Local>) -> u32 {
        self.max_fdp_minutes
            .saturating_sub(self.elapsed_minutes(now))
    }

    pub fn is_fdp_exceeded(&self, now: DateTime<Local>) -> bool {
        self.elapsed_minutes(now) >= self.max_fdp_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_session() -> ActiveDutySession {
        let started_at = Local.with_ymd_and_hms(2025, 6, 1, 7, 0, 0).unwrap();
        ActiveDutySession {
            session_id: SessionId::new(),
            started_at,
            report_date: started_at.date_naive(),
            report_time: TimeOfDay::hm(7, 0),
            sectors: 2,
            acclimatization: Acclimatization::Acclimatized,
            crew: CrewComposition::Standard,
            max_fdp_minutes: 840,
            warnings_issued: vec![],
        }
    }

    #[test]
    fn elapsed_and_remaining() {
        let session = make_session();
        let later = session.started_at + chrono::Duration::minutes(90);

        assert_eq!(session.elapsed_minutes(later), 90);
        assert_eq!(session.remaining_minutes(later), 750);
        assert!(!session.is_fdp_exceeded(later));

        let before = session.started_at - chrono::Duration::minutes(5);
        assert_eq!(session.elapsed_minutes(before), 0);
    }

    #[test]
    fn deadline_and_expiry() {
        let session = make_session();
        let deadline = session.fdp_deadline();
        assert_eq!(deadline, Local.with_ymd_and_hms(2025, 6, 1, 21, 0, 0).unwrap());
        assert!(session.is_fdp_exceeded(deadline));
        assert_eq!(session.remaining_minutes(deadline), 0);
    }

    #[test]
    fn with_sectors_returns_new_value() {
        let session = make_session();
        let updated = session.with_sectors(4, 780);

        assert_eq!(session.sectors, 2);
        assert_eq!(session.max_fdp_minutes, 840);
        assert_eq!(updated.sectors, 4);
        assert_eq!(updated.max_fdp_minutes, 780);
        assert_eq!(updated.session_id, session.session_id);
    }

    #[test]
    fn warnings_recorded_once() {
        let session = make_session()
            .with_warning_issued(60)
            .with_warning_issued(60)
            .with_warning_issued(15);
        assert_eq!(session.warnings_issued, vec![60, 15]);
    }
}
