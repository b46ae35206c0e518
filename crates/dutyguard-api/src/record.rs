//! Completed duty records

use chrono::NaiveDate;
use dutyguard_util::{RecordId, TimeOfDay, duty_minutes};
use serde::{Deserialize, Serialize};

/// A completed duty period
///
/// `duty_minutes` is derived from the report and release times and is
/// recomputed whenever either changes; it cannot be set directly.
/// `flight_minutes` is logged independently of the duty span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DutyRecordFields")]
pub struct DutyRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    report_time: TimeOfDay,
    release_time: TimeOfDay,
    duty_minutes: u32,
    pub flight_minutes: u32,
    pub sectors: u8,
    pub note: String,
}

impl DutyRecord {
    pub fn new(date: NaiveDate, report_time: TimeOfDay, release_time: TimeOfDay) -> Self {
        Self {
            id: RecordId::new(),
            date,
            report_time,
            release_time,
            duty_minutes: duty_minutes(report_time, release_time),
            flight_minutes: 0,
            sectors: 1,
            note: String::new(),
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    pub fn with_flight_minutes(mut self, flight_minutes: u32) -> Self {
        self.flight_minutes = flight_minutes;
        self
    }

    pub fn with_sectors(mut self, sectors: u8) -> Self {
        self.sectors = sectors;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn report_time(&self) -> TimeOfDay {
        self.report_time
    }

    pub fn release_time(&self) -> TimeOfDay {
        self.release_time
    }

    pub fn duty_minutes(&self) -> u32 {
        self.duty_minutes
    }

    pub fn set_report_time(&mut self, report_time: TimeOfDay) {
        self.report_time = report_time;
        self.recompute();
    }

    pub fn set_release_time(&mut self, release_time: TimeOfDay) {
        self.release_time = release_time;
        self.recompute();
    }

    /// Whether the logged flight time is longer than the duty itself
    pub fn flight_exceeds_duty(&self) -> bool {
        self.flight_minutes > self.duty_minutes
    }

    fn recompute(&mut self) {
        self.duty_minutes = duty_minutes(self.report_time, self.release_time);
    }
}

/// Deserialization shape; any stored `duty_minutes` is ignored and recomputed
#[derive(Deserialize)]
struct DutyRecordFields {
    id: RecordId,
    date: NaiveDate,
    report_time: TimeOfDay,
    release_time: TimeOfDay,
    #[serde(default)]
    flight_minutes: u32,
    #[serde(default = "default_sectors")]
    sectors: u8,
    #[serde(default)]
    note: String,
}

fn default_sectors() -> u8 {
    1
}

impl From<DutyRecordFields> for DutyRecord {
    fn from(raw: DutyRecordFields) -> Self {
        DutyRecord::new(raw.date, raw.report_time, raw.release_time)
            .with_id(raw.id)
            .with_flight_minutes(raw.flight_minutes)
            .with_sectors(raw.sectors)
            .with_note(raw.note)
    }
}
