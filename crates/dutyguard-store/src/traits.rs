//! Store trait definitions

use dutyguard_api::{ActiveDutySession, CrewPreferences, DutyRecord};
use dutyguard_util::RecordId;

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Duty records

    /// All logged records, oldest first
    fn list_duty_records(&self) -> StoreResult<Vec<DutyRecord>>;

    fn get_duty_record(&self, id: &RecordId) -> StoreResult<Option<DutyRecord>>;

    fn insert_duty_record(&self, record: &DutyRecord) -> StoreResult<()>;

    /// Replace an existing record. Fails with `NotFound` if the id is unknown.
    fn update_duty_record(&self, record: &DutyRecord) -> StoreResult<()>;

    /// Returns whether a record was removed
    fn delete_duty_record(&self, id: &RecordId) -> StoreResult<bool>;

    // Active duty

    fn get_active_session(&self) -> StoreResult<Option<ActiveDutySession>>;

    /// Store the active session, replacing any previous value wholesale
    fn put_active_session(&self, session: &ActiveDutySession) -> StoreResult<()>;

    fn clear_active_session(&self) -> StoreResult<()>;

    /// Clear the active session and insert its record, if any, as one
    /// transaction. On error neither change is kept.
    fn finish_active_session(&self, record: Option<&DutyRecord>) -> StoreResult<()>;

    // Preferences

    fn load_preferences(&self) -> StoreResult<Option<CrewPreferences>>;

    fn save_preferences(&self, preferences: &CrewPreferences) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
