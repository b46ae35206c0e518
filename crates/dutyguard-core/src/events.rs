//! Core events emitted by the engine

use chrono::{DateTime, Local};
use dutyguard_api::{ActiveDutySession, DutyRecord, WarningSeverity};
use dutyguard_rules::FdpResult;
use dutyguard_util::SessionId;

/// Events emitted by the duty engine
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// Duty started and the maximum FDP fixed
    DutyStarted {
        session: ActiveDutySession,
        fdp: FdpResult,
    },

    /// Sector count changed and the maximum FDP reclassified
    SectorsChanged {
        session_id: SessionId,
        previous_sectors: u8,
        sectors: u8,
        previous_max_fdp_minutes: u32,
        fdp: FdpResult,
    },

    /// Warning threshold reached
    Warning {
        session_id: SessionId,
        minutes_before: u32,
        remaining_minutes: u32,
        severity: WarningSeverity,
        message: Option<String>,
    },

    /// Elapsed duty reached the maximum FDP
    FdpExceeded {
        session_id: SessionId,
        max_fdp_minutes: u32,
        fdp_end: DateTime<Local>,
    },

    /// Duty ended, with the record it produced when one was kept
    DutyEnded {
        session_id: SessionId,
        record: Option<DutyRecord>,
        duty_minutes: u32,
    },

    /// Duty discarded without a record
    DutyCancelled { session_id: SessionId },
}
