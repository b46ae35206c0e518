//! Core duty engine

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use dutyguard_api::{
    Acclimatization, ActiveDutySession, CrewComposition, CrewPreferences, DutyRecord,
    WarningThreshold,
};
use dutyguard_config::Settings;
use dutyguard_rules::{
    ActiveDutyMetrics, ComplianceReport, ConsecutiveDaysStatus, FdpResult, RestResult,
    compute_max_fdp_at, compute_min_rest_at, consecutive_days_status, consecutive_duty_days,
    evaluate_compliance,
    fdp::{MAX_SECTORS, MIN_SECTORS},
};
use dutyguard_store::{AuditEvent, AuditEventType, Store};
use dutyguard_util::{DutyError, RecordId, SessionId, TimeOfDay};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{CoreEvent, DutyCountdown};

/// Marker kept in `warnings_issued` once the FDP-exceeded event has fired.
/// Configured warnings are always at least one minute before the end.
const FDP_EXCEEDED_MARK: u32 = 0;

/// Settings the engine needs from the validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Largest `minutes_before` first
    pub warnings: Vec<WarningThreshold>,
    /// Crew defaults used until preferences are stored
    pub defaults: CrewPreferences,
}

impl From<&Settings> for EngineSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            warnings: settings.countdown.warnings.clone(),
            defaults: settings.crew,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Request to start a duty
#[derive(Debug, Clone, Default)]
pub struct StartDuty {
    /// Defaults to the date of `now`
    pub report_date: Option<NaiveDate>,
    /// Defaults to the time of `now`
    pub report_time: Option<TimeOfDay>,
    pub sectors: u32,
    /// Defaults to the stored preference
    pub acclimatization: Option<Acclimatization>,
    /// Defaults to the stored preference
    pub crew: Option<CrewComposition>,
}

/// Request to end the active duty
#[derive(Debug, Clone)]
pub struct EndDuty {
    /// Defaults to the time of `now`
    pub release_time: Option<TimeOfDay>,
    pub flight_minutes: u32,
    pub note: String,
    /// Whether to keep a duty record
    pub record: bool,
}

impl Default for EndDuty {
    fn default() -> Self {
        Self {
            release_time: None,
            flight_minutes: 0,
            note: String::new(),
            record: true,
        }
    }
}

/// Changes to a logged record; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub report_time: Option<TimeOfDay>,
    pub release_time: Option<TimeOfDay>,
    pub flight_minutes: Option<u32>,
}

/// The core duty engine
///
/// All state lives in the store: the engine reads a snapshot for each call
/// and writes back whole values.
pub struct DutyEngine {
    settings: EngineSettings,
    store: Arc<dyn Store>,
}

impl DutyEngine {
    /// Create a new duty engine
    pub fn new(settings: EngineSettings, store: Arc<dyn Store>) -> Self {
        let _ = store.append_audit(AuditEvent::new(AuditEventType::ConfigLoaded {
            warning_count: settings.warnings.len(),
        }));

        info!(warnings = settings.warnings.len(), "Duty engine initialized");

        Self { settings, store }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Stored crew preferences, or the configured defaults
    pub fn preferences(&self) -> Result<CrewPreferences, DutyError> {
        Ok(self
            .store
            .load_preferences()?
            .unwrap_or(self.settings.defaults))
    }

    pub fn set_preferences(&self, preferences: CrewPreferences) -> Result<(), DutyError> {
        self.store.save_preferences(&preferences)?;
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::PreferencesChanged));

        info!(
            acclimatized = preferences.acclimatization.is_acclimatized(),
            crew = %preferences.crew,
            "Preferences changed"
        );
        Ok(())
    }

    pub fn active_session(&self) -> Result<Option<ActiveDutySession>, DutyError> {
        Ok(self.store.get_active_session()?)
    }

    fn require_session(&self) -> Result<ActiveDutySession, DutyError> {
        self.store
            .get_active_session()?
            .ok_or(DutyError::NoActiveSession)
    }

    /// Start a duty, fixing its maximum FDP
    pub fn start_duty(&self, request: StartDuty, now: DateTime<Local>) -> Result<CoreEvent, DutyError> {
        if let Some(active) = self.store.get_active_session()? {
            warn!(session_id = %active.session_id, "Duty already active");
            return Err(DutyError::SessionAlreadyActive);
        }

        let preferences = self.preferences()?;
        let acclimatization = request
            .acclimatization
            .unwrap_or(preferences.acclimatization);
        let crew = request.crew.unwrap_or(preferences.crew);
        let now_time = TimeOfDay::from_naive_time(now.time());
        let report_time = request.report_time.unwrap_or(now_time);
        // A report later in the day than now was yesterday's
        let report_date = match request.report_date {
            Some(date) => date,
            None if report_time > now_time => now
                .date_naive()
                .pred_opt()
                .ok_or_else(|| DutyError::invalid("Report date out of range"))?,
            None => now.date_naive(),
        };

        let fdp = compute_max_fdp_at(report_time, request.sectors, acclimatization)?;

        // Elapsed time counts from the report, which may precede the command
        let started_at = Local
            .from_local_datetime(&report_date.and_time(report_time.to_naive_time()))
            .earliest()
            .unwrap_or(now);
        if started_at > now {
            warn!(report = %started_at, "Rejected report in the future");
            return Err(DutyError::invalid(format!(
                "Report {} {} is in the future",
                report_date, report_time
            )));
        }

        let session = ActiveDutySession {
            session_id: SessionId::new(),
            started_at,
            report_date,
            report_time,
            sectors: request.sectors as u8,
            acclimatization,
            crew,
            max_fdp_minutes: fdp.max_fdp_minutes,
            warnings_issued: Vec::new(),
        };
        self.store.put_active_session(&session)?;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::DutyStarted {
            session_id: session.session_id,
            report_date,
            report_time,
            sectors: session.sectors,
            max_fdp_minutes: fdp.max_fdp_minutes,
        }));

        info!(
            session_id = %session.session_id,
            report = %report_time,
            sectors = session.sectors,
            max_fdp_minutes = fdp.max_fdp_minutes,
            wocl = fdp.wocl_encroachment,
            "Duty started"
        );

        Ok(CoreEvent::DutyStarted { session, fdp })
    }

    /// Change the planned sector count, reclassifying the maximum FDP
    pub fn change_sectors(&self, sectors: u32) -> Result<CoreEvent, DutyError> {
        let session = self.require_session()?;
        let fdp = self.fdp_for(&session, sectors)?;

        let updated = session.with_sectors(sectors as u8, fdp.max_fdp_minutes);
        self.store.put_active_session(&updated)?;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SectorsChanged {
            session_id: updated.session_id,
            sectors: updated.sectors,
            max_fdp_minutes: updated.max_fdp_minutes,
        }));

        info!(
            session_id = %updated.session_id,
            from = session.sectors,
            to = updated.sectors,
            max_fdp_minutes = updated.max_fdp_minutes,
            "Sectors changed"
        );

        Ok(CoreEvent::SectorsChanged {
            session_id: updated.session_id,
            previous_sectors: session.sectors,
            sectors: updated.sectors,
            previous_max_fdp_minutes: session.max_fdp_minutes,
            fdp,
        })
    }

    fn fdp_for(&self, session: &ActiveDutySession, sectors: u32) -> Result<FdpResult, DutyError> {
        compute_max_fdp_at(session.report_time, sectors, session.acclimatization)
    }

    /// The full FDP evaluation behind the active duty
    pub fn active_fdp(&self) -> Result<Option<FdpResult>, DutyError> {
        match self.store.get_active_session()? {
            Some(session) => Ok(Some(self.fdp_for(&session, session.sectors as u32)?)),
            None => Ok(None),
        }
    }

    /// End the active duty, optionally keeping a record of it
    pub fn end_duty(&self, request: EndDuty, now: DateTime<Local>) -> Result<CoreEvent, DutyError> {
        let session = self.require_session()?;
        let release = request
            .release_time
            .unwrap_or_else(|| TimeOfDay::from_naive_time(now.time()));

        let record = DutyRecord::new(session.report_date, session.report_time, release)
            .with_flight_minutes(request.flight_minutes)
            .with_sectors(session.sectors)
            .with_note(request.note);
        let duty_minutes = record.duty_minutes();

        let record = if request.record {
            check_record(&record)?;
            Some(record)
        } else {
            None
        };
        self.store.finish_active_session(record.as_ref())?;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::DutyEnded {
            session_id: session.session_id,
            record_id: record.as_ref().map(|r| r.id),
            duty_minutes,
        }));

        info!(
            session_id = %session.session_id,
            release = %release,
            duty_minutes,
            recorded = record.is_some(),
            "Duty ended"
        );

        Ok(CoreEvent::DutyEnded {
            session_id: session.session_id,
            record,
            duty_minutes,
        })
    }

    /// Discard the active duty without a record
    pub fn cancel_duty(&self) -> Result<CoreEvent, DutyError> {
        let session = self.require_session()?;
        self.store.clear_active_session()?;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::DutyCancelled {
            session_id: session.session_id,
        }));

        info!(session_id = %session.session_id, "Duty cancelled");

        Ok(CoreEvent::DutyCancelled {
            session_id: session.session_id,
        })
    }

    /// Current countdown of the active duty, if any
    pub fn countdown(&self, now: DateTime<Local>) -> Result<Option<DutyCountdown>, DutyError> {
        Ok(self
            .store
            .get_active_session()?
            .map(|session| DutyCountdown::evaluate(&session, now)))
    }

    /// Tick the engine - check for warnings and the end of the maximum FDP
    ///
    /// Each warning fires once per duty, as does the exceeded event.
    pub fn tick(&self, now: DateTime<Local>) -> Result<Vec<CoreEvent>, DutyError> {
        let mut events = Vec::new();

        let Some(mut session) = self.store.get_active_session()? else {
            return Ok(events);
        };
        let before = session.warnings_issued.len();
        let remaining = session.remaining_minutes(now);

        for threshold in &self.settings.warnings {
            let minutes_before = threshold.minutes_before;
            if minutes_before >= session.max_fdp_minutes
                || remaining > minutes_before
                || remaining == 0
                || session.warnings_issued.contains(&minutes_before)
            {
                continue;
            }

            session = session.with_warning_issued(minutes_before);

            let _ = self.store.append_audit(AuditEvent::new(AuditEventType::FdpWarningIssued {
                session_id: session.session_id,
                minutes_before,
            }));

            info!(
                session_id = %session.session_id,
                minutes_before,
                remaining_minutes = remaining,
                "FDP warning issued"
            );

            events.push(CoreEvent::Warning {
                session_id: session.session_id,
                minutes_before,
                remaining_minutes: remaining,
                severity: threshold.severity,
                message: threshold.message_template.clone(),
            });
        }

        if session.is_fdp_exceeded(now) && !session.warnings_issued.contains(&FDP_EXCEEDED_MARK) {
            session = session.with_warning_issued(FDP_EXCEEDED_MARK);

            let _ = self.store.append_audit(AuditEvent::new(AuditEventType::FdpExceeded {
                session_id: session.session_id,
                max_fdp_minutes: session.max_fdp_minutes,
            }));

            warn!(
                session_id = %session.session_id,
                max_fdp_minutes = session.max_fdp_minutes,
                "Maximum FDP exceeded"
            );

            events.push(CoreEvent::FdpExceeded {
                session_id: session.session_id,
                max_fdp_minutes: session.max_fdp_minutes,
                fdp_end: session.fdp_deadline(),
            });
        }

        if session.warnings_issued.len() != before {
            self.store.put_active_session(&session)?;
        }

        Ok(events)
    }

    /// Compliance over the stored history, plus the active duty if any
    pub fn compliance_report(
        &self,
        now: DateTime<Local>,
        elapsed_flight_minutes: u32,
    ) -> Result<ComplianceReport, DutyError> {
        let records = self.store.list_duty_records()?;
        let active = self
            .store
            .get_active_session()?
            .map(|session| ActiveDutyMetrics {
                elapsed_fdp_minutes: session.elapsed_minutes(now),
                max_fdp_minutes: session.max_fdp_minutes,
                elapsed_flight_minutes,
                crew: session.crew,
            });

        Ok(evaluate_compliance(&records, active.as_ref(), now.date_naive()))
    }

    /// Log a completed duty directly
    pub fn log_record(&self, record: DutyRecord) -> Result<DutyRecord, DutyError> {
        check_record(&record)?;
        self.store.insert_duty_record(&record)?;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::RecordLogged {
            record_id: record.id,
            date: record.date,
            duty_minutes: record.duty_minutes(),
        }));

        info!(
            record_id = %record.id,
            date = %record.date,
            duty_minutes = record.duty_minutes(),
            flight_minutes = record.flight_minutes,
            "Duty record logged"
        );
        Ok(record)
    }

    /// Change the times of a logged record; duty minutes follow
    pub fn update_record_times(
        &self,
        id: &RecordId,
        update: RecordUpdate,
    ) -> Result<DutyRecord, DutyError> {
        let mut record = self
            .store
            .get_duty_record(id)?
            .ok_or(DutyError::RecordNotFound(*id))?;

        if let Some(report) = update.report_time {
            record.set_report_time(report);
        }
        if let Some(release) = update.release_time {
            record.set_release_time(release);
        }
        if let Some(flight) = update.flight_minutes {
            record.flight_minutes = flight;
        }

        check_record(&record)?;
        self.store.update_duty_record(&record)?;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::RecordUpdated {
            record_id: record.id,
            duty_minutes: record.duty_minutes(),
        }));

        info!(
            record_id = %record.id,
            duty_minutes = record.duty_minutes(),
            "Duty record updated"
        );
        Ok(record)
    }

    pub fn delete_record(&self, id: &RecordId) -> Result<(), DutyError> {
        if !self.store.delete_duty_record(id)? {
            return Err(DutyError::RecordNotFound(*id));
        }

        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::RecordDeleted { record_id: *id }));

        info!(record_id = %id, "Duty record deleted");
        Ok(())
    }

    /// All logged records, oldest first
    pub fn list_records(&self) -> Result<Vec<DutyRecord>, DutyError> {
        Ok(self.store.list_duty_records()?)
    }

    /// Minimum rest following the most recent logged duty
    pub fn rest_after_last_duty(
        &self,
        timezones_crossed: u32,
    ) -> Result<Option<(DutyRecord, RestResult)>, DutyError> {
        let Some(last) = self.store.list_duty_records()?.into_iter().last() else {
            return Ok(None);
        };

        let rest = compute_min_rest_at(
            last.release_time(),
            last.duty_minutes() as f64 / 60.0,
            timezones_crossed,
        )?;
        Ok(Some((last, rest)))
    }

    /// Consecutive duty days up to `today`, against the time-off limit
    pub fn consecutive_status(&self, today: NaiveDate) -> Result<ConsecutiveDaysStatus, DutyError> {
        let records = self.store.list_duty_records()?;
        Ok(consecutive_days_status(consecutive_duty_days(&records, today)))
    }
}

/// Checks applied on every path that writes a record
fn check_record(record: &DutyRecord) -> Result<(), DutyError> {
    if record.flight_exceeds_duty() {
        warn!(
            record_id = %record.id,
            flight_minutes = record.flight_minutes,
            duty_minutes = record.duty_minutes(),
            "Rejected record with flight time longer than duty"
        );
        return Err(DutyError::invalid(format!(
            "Flight time ({}m) cannot exceed duty time ({}m)",
            record.flight_minutes,
            record.duty_minutes()
        )));
    }
    if !(MIN_SECTORS..=MAX_SECTORS).contains(&(record.sectors as u32)) {
        return Err(DutyError::invalid(format!(
            "Sector count must be between {} and {}, got {}",
            MIN_SECTORS, MAX_SECTORS, record.sectors
        )));
    }
    Ok(())
}
