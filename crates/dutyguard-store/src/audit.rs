//! Audit event types

use chrono::{DateTime, Local, NaiveDate};
use dutyguard_util::{RecordId, SessionId, TimeOfDay};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Settings loaded at startup
    ConfigLoaded { warning_count: usize },

    DutyStarted {
        session_id: SessionId,
        report_date: NaiveDate,
        report_time: TimeOfDay,
        sectors: u8,
        max_fdp_minutes: u32,
    },

    SectorsChanged {
        session_id: SessionId,
        sectors: u8,
        max_fdp_minutes: u32,
    },

    FdpWarningIssued {
        session_id: SessionId,
        minutes_before: u32,
    },

    FdpExceeded {
        session_id: SessionId,
        max_fdp_minutes: u32,
    },

    /// Duty ended, with the record it produced if one was kept
    DutyEnded {
        session_id: SessionId,
        record_id: Option<RecordId>,
        duty_minutes: u32,
    },

    /// Duty discarded without a record
    DutyCancelled { session_id: SessionId },

    RecordLogged {
        record_id: RecordId,
        date: NaiveDate,
        duty_minutes: u32,
    },

    RecordUpdated {
        record_id: RecordId,
        duty_minutes: u32,
    },

    RecordDeleted { record_id: RecordId },

    PreferencesChanged,
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: dutyguard_util::now(),
            event,
        }
    }
}
