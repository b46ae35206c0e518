//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate};
use dutyguard_api::{ActiveDutySession, CrewPreferences, DutyRecord};
use dutyguard_util::{RecordId, TimeOfDay};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, Store, StoreError, StoreResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Completed duties; duty minutes are derived on load
            CREATE TABLE IF NOT EXISTS duty_records (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                report_time TEXT NOT NULL,
                release_time TEXT NOT NULL,
                flight_minutes INTEGER NOT NULL DEFAULT 0,
                sectors INTEGER NOT NULL DEFAULT 1,
                note TEXT NOT NULL DEFAULT ''
            );

            -- Active duty (single row)
            CREATE TABLE IF NOT EXISTS active_session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                session_json TEXT NOT NULL
            );

            -- Crew preferences (single row)
            CREATE TABLE IF NOT EXISTS preferences (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                preferences_json TEXT NOT NULL
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_duty_records_date ON duty_records(date);
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

/// Columns of one `duty_records` row, as stored
struct RecordRow {
    id: String,
    date: String,
    report_time: String,
    release_time: String,
    flight_minutes: i64,
    sectors: i64,
    note: String,
}

impl RecordRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            report_time: row.get(2)?,
            release_time: row.get(3)?,
            flight_minutes: row.get(4)?,
            sectors: row.get(5)?,
            note: row.get(6)?,
        })
    }

    fn into_record(self) -> StoreResult<DutyRecord> {
        let id: RecordId = self
            .id
            .parse()
            .map_err(|e| StoreError::Serialization(format!("record id '{}': {}", self.id, e)))?;
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| StoreError::Serialization(format!("record date '{}': {}", self.date, e)))?;
        let report = parse_time(&self.report_time)?;
        let release = parse_time(&self.release_time)?;

        Ok(DutyRecord::new(date, report, release)
            .with_id(id)
            .with_flight_minutes(self.flight_minutes.max(0) as u32)
            .with_sectors(self.sectors.clamp(0, u8::MAX as i64) as u8)
            .with_note(self.note))
    }
}

fn insert_record(conn: &Connection, record: &DutyRecord) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO duty_records
            (id, date, report_time, release_time, flight_minutes, sectors, note)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            record.id.to_string(),
            record.date.format(DATE_FORMAT).to_string(),
            record.report_time().to_string(),
            record.release_time().to_string(),
            record.flight_minutes,
            record.sectors,
            record.note,
        ],
    )
}

fn parse_time(s: &str) -> StoreResult<TimeOfDay> {
    TimeOfDay::parse(s).ok_or_else(|| StoreError::Serialization(format!("time of day '{}'", s)))
}

const RECORD_COLUMNS: &str =
    "id, date, report_time, release_time, flight_minutes, sectors, note";

impl Store for SqliteStore {
    fn list_duty_records(&self) -> StoreResult<Vec<DutyRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM duty_records ORDER BY date, report_time",
            RECORD_COLUMNS
        ))?;
        let rows = stmt.query_map([], RecordRow::read)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }

        debug!(count = records.len(), "Duty records listed");
        Ok(records)
    }

    fn get_duty_record(&self, id: &RecordId) -> StoreResult<Option<DutyRecord>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                &format!("SELECT {} FROM duty_records WHERE id = ?", RECORD_COLUMNS),
                [id.to_string()],
                RecordRow::read,
            )
            .optional()?;

        row.map(RecordRow::into_record).transpose()
    }

    fn insert_duty_record(&self, record: &DutyRecord) -> StoreResult<()> {
        let conn = self.conn()?;
        insert_record(&conn, record)?;

        debug!(record_id = %record.id, date = %record.date, "Duty record inserted");
        Ok(())
    }

    fn update_duty_record(&self, record: &DutyRecord) -> StoreResult<()> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE duty_records
            SET date = ?, report_time = ?, release_time = ?,
                flight_minutes = ?, sectors = ?, note = ?
            WHERE id = ?
            "#,
            params![
                record.date.format(DATE_FORMAT).to_string(),
                record.report_time().to_string(),
                record.release_time().to_string(),
                record.flight_minutes,
                record.sectors,
                record.note,
                record.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("duty record {}", record.id)));
        }

        debug!(record_id = %record.id, "Duty record updated");
        Ok(())
    }

    fn delete_duty_record(&self, id: &RecordId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM duty_records WHERE id = ?", [id.to_string()])?;

        debug!(record_id = %id, removed = removed > 0, "Duty record deleted");
        Ok(removed > 0)
    }

    fn get_active_session(&self) -> StoreResult<Option<ActiveDutySession>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT session_json FROM active_session WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn put_active_session(&self, session: &ActiveDutySession) -> StoreResult<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(session)?;

        conn.execute(
            r#"
            INSERT INTO active_session (id, session_json)
            VALUES (1, ?)
            ON CONFLICT(id)
            DO UPDATE SET session_json = excluded.session_json
            "#,
            [json],
        )?;

        debug!(session_id = %session.session_id, "Active session saved");
        Ok(())
    }

    fn clear_active_session(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM active_session WHERE id = 1", [])?;
        debug!("Active session cleared");
        Ok(())
    }

    fn finish_active_session(&self, record: Option<&DutyRecord>) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM active_session WHERE id = 1", [])?;
        if let Some(record) = record {
            insert_record(&tx, record)?;
        }
        tx.commit()?;

        debug!(
            record_id = ?record.map(|r| r.id),
            "Active session finished"
        );
        Ok(())
    }

    fn load_preferences(&self) -> StoreResult<Option<CrewPreferences>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT preferences_json FROM preferences WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn save_preferences(&self, preferences: &CrewPreferences) -> StoreResult<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(preferences)?;

        conn.execute(
            r#"
            INSERT INTO preferences (id, preferences_json)
            VALUES (1, ?)
            ON CONFLICT(id)
            DO UPDATE SET preferences_json = excluded.preferences_json
            "#,
            [json],
        )?;

        debug!("Preferences saved");
        Ok(())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| dutyguard_util::now());
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditEventType;
    use dutyguard_api::{Acclimatization, CrewComposition};
    use dutyguard_util::SessionId;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn record(day: u32, report: &str, release: &str) -> DutyRecord {
        DutyRecord::new(
            date(day),
            TimeOfDay::parse(report).unwrap(),
            TimeOfDay::parse(release).unwrap(),
        )
    }

    fn session() -> ActiveDutySession {
        ActiveDutySession {
            session_id: SessionId::new(),
            started_at: dutyguard_util::now(),
            report_date: date(10),
            report_time: TimeOfDay::hm(7, 0),
            sectors: 2,
            acclimatization: Acclimatization::Acclimatized,
            crew: CrewComposition::Standard,
            max_fdp_minutes: 840,
            warnings_issued: vec![],
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_record_crud() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.list_duty_records().unwrap().is_empty());

        let rec = record(3, "06:00", "14:30")
            .with_flight_minutes(310)
            .with_sectors(3)
            .with_note("LHR-CDG-LHR");
        store.insert_duty_record(&rec).unwrap();

        let loaded = store.get_duty_record(&rec.id).unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert_eq!(loaded.duty_minutes(), 510);

        let mut changed = loaded.clone();
        changed.set_release_time(TimeOfDay::hm(16, 0));
        store.update_duty_record(&changed).unwrap();
        let loaded = store.get_duty_record(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.duty_minutes(), 600);

        assert!(store.delete_duty_record(&rec.id).unwrap());
        assert!(!store.delete_duty_record(&rec.id).unwrap());
        assert!(store.get_duty_record(&rec.id).unwrap().is_none());
    }

    #[test]
    fn test_overnight_record_recomputed_on_load() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record(5, "23:00", "01:00");
        store.insert_duty_record(&rec).unwrap();

        let loaded = store.get_duty_record(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.duty_minutes(), 120);
    }

    #[test]
    fn test_records_listed_in_date_order() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_duty_record(&record(9, "06:00", "12:00")).unwrap();
        store.insert_duty_record(&record(2, "14:00", "20:00")).unwrap();
        store.insert_duty_record(&record(2, "05:00", "09:00")).unwrap();

        let dates: Vec<(NaiveDate, String)> = store
            .list_duty_records()
            .unwrap()
            .iter()
            .map(|r| (r.date, r.report_time().to_string()))
            .collect();
        assert_eq!(
            dates,
            vec![
                (date(2), "05:00".to_string()),
                (date(2), "14:00".to_string()),
                (date(9), "06:00".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_unknown_record() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.update_duty_record(&record(1, "06:00", "10:00"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_active_session() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_active_session().unwrap().is_none());

        let original = session();
        store.put_active_session(&original).unwrap();
        assert_eq!(store.get_active_session().unwrap(), Some(original.clone()));

        // Replaced wholesale
        let changed = original.with_sectors(5, 720);
        store.put_active_session(&changed).unwrap();
        let loaded = store.get_active_session().unwrap().unwrap();
        assert_eq!(loaded.sectors, 5);
        assert_eq!(loaded.max_fdp_minutes, 720);

        store.clear_active_session().unwrap();
        assert!(store.get_active_session().unwrap().is_none());
    }

    #[test]
    fn test_finish_active_session_keeps_record() {
        let store = SqliteStore::in_memory().unwrap();
        store.put_active_session(&session()).unwrap();

        let r = record(10, "07:00", "15:00");
        store.finish_active_session(Some(&r)).unwrap();
        assert!(store.get_active_session().unwrap().is_none());
        assert_eq!(store.list_duty_records().unwrap(), vec![r]);

        store.put_active_session(&session()).unwrap();
        store.finish_active_session(None).unwrap();
        assert!(store.get_active_session().unwrap().is_none());
        assert_eq!(store.list_duty_records().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_finish_rolls_back() {
        let store = SqliteStore::in_memory().unwrap();
        let r = record(10, "07:00", "15:00");
        store.insert_duty_record(&r).unwrap();
        let active = session();
        store.put_active_session(&active).unwrap();

        // Same id again: the insert fails and the session delete is undone
        assert!(store.finish_active_session(Some(&r)).is_err());
        assert_eq!(store.get_active_session().unwrap(), Some(active));
        assert_eq!(store.list_duty_records().unwrap().len(), 1);
    }

    #[test]
    fn test_preferences() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_preferences().unwrap().is_none());

        let prefs = CrewPreferences {
            acclimatization: Acclimatization::Unacclimatized,
            crew: CrewComposition::Augmented,
        };
        store.save_preferences(&prefs).unwrap();
        assert_eq!(store.load_preferences().unwrap(), Some(prefs));
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(AuditEventType::ConfigLoaded { warning_count: 3 }))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::PreferencesChanged))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, AuditEventType::PreferencesChanged));
        assert!(matches!(
            events[1].event,
            AuditEventType::ConfigLoaded { warning_count: 3 }
        ));

        assert_eq!(store.get_recent_audits(1).unwrap().len(), 1);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dutyguard.db");
        let rec = record(12, "08:00", "18:00");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_duty_record(&rec).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let records = store.list_duty_records().unwrap();
        assert_eq!(records, vec![rec]);
    }
}
