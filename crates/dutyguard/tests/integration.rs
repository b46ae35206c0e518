//! Integration tests for dutyguard
//!
//! These tests drive the engine the way the command line does: settings from
//! TOML, a real store, and fixed clock instants.

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone};
use dutyguard_api::{DutyRecord, WarningSeverity};
use dutyguard_config::{ConfigError, ValidationError, parse_config};
use dutyguard_core::{CoreEvent, DutyEngine, EndDuty, EngineSettings, StartDuty};
use dutyguard_rules::{CheckKind, ComplianceStatus};
use dutyguard_store::{SqliteStore, Store};
use dutyguard_util::{DutyError, TimeOfDay};
use std::sync::Arc;

const CONFIG: &str = r#"
config_version = 1

[crew]
acclimatized = true

[countdown]
poll_interval_seconds = 30

[[countdown.warnings]]
minutes_before = 45
severity = "warn"
message = "45 minutes of FDP left"

[[countdown.warnings]]
minutes_before = 15
severity = "critical"
"#;

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, day, hour, minute, 0).unwrap()
}

fn make_engine() -> DutyEngine {
    let settings = parse_config(CONFIG).unwrap();
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    DutyEngine::new(EngineSettings::from(&settings), store)
}

#[test]
fn test_config_warnings_drive_countdown() {
    let engine = make_engine();

    // 14:00, three sectors: 12h, so the FDP runs out at 02:00 next day
    let event = engine
        .start_duty(
            StartDuty {
                report_time: Some(TimeOfDay::hm(14, 0)),
                sectors: 3,
                ..Default::default()
            },
            at(10, 14, 0),
        )
        .unwrap();
    assert!(matches!(
        event,
        CoreEvent::DutyStarted { ref session, .. } if session.max_fdp_minutes == 720
    ));

    assert!(engine.tick(at(10, 23, 0)).unwrap().is_empty());

    let events = engine.tick(at(11, 1, 20)).unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CoreEvent::Warning {
            minutes_before: 45,
            remaining_minutes: 40,
            severity: WarningSeverity::Warn,
            message: Some(m),
            ..
        } if m == "45 minutes of FDP left"
    ));

    let events = engine.tick(at(11, 1, 50)).unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CoreEvent::Warning {
            minutes_before: 15,
            severity: WarningSeverity::Critical,
            message: None,
            ..
        }
    ));

    let events = engine.tick(at(11, 2, 0)).unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], CoreEvent::FdpExceeded { .. }));

    // Nothing repeats
    assert!(engine.tick(at(11, 2, 30)).unwrap().is_empty());

    let countdown = engine.countdown(at(11, 2, 30)).unwrap().unwrap();
    assert!(countdown.is_exceeded());
    assert_eq!(countdown.status, ComplianceStatus::Exceeded);
}

#[test]
fn test_duty_day_lifecycle() {
    let engine = make_engine();

    engine
        .start_duty(
            StartDuty {
                report_time: Some(TimeOfDay::hm(6, 30)),
                sectors: 2,
                ..Default::default()
            },
            at(10, 6, 30),
        )
        .unwrap();

    // Adding sectors shortens the maximum FDP
    let event = engine.change_sectors(4).unwrap();
    assert!(matches!(
        event,
        CoreEvent::SectorsChanged { ref fdp, previous_max_fdp_minutes: 840, .. }
            if fdp.max_fdp_minutes == 780
    ));

    let event = engine
        .end_duty(
            EndDuty {
                release_time: Some(TimeOfDay::hm(19, 0)),
                flight_minutes: 420,
                note: "4 sectors".into(),
                record: true,
            },
            at(10, 19, 0),
        )
        .unwrap();
    assert!(matches!(event, CoreEvent::DutyEnded { duty_minutes: 750, .. }));

    // 12h30 of duty needs the extended 12h rest
    let (record, rest) = engine.rest_after_last_duty(0).unwrap().unwrap();
    assert_eq!(record.sectors, 4);
    assert_eq!(rest.min_rest_minutes, 720);
    assert_eq!(rest.next_report_display(), "07:00 (+1)");

    let report = engine.compliance_report(at(10, 20, 0), 0).unwrap();
    assert_eq!(report.checks.len(), 4);
    assert_eq!(
        report.check(CheckKind::SevenDayDuty).unwrap().current_minutes,
        750
    );
    assert_eq!(
        report.check(CheckKind::TwentyEightDayFlight).unwrap().current_minutes,
        420
    );
    assert!(report.is_compliant());
}

#[test]
fn test_busy_week_exceeds_seven_day_limit() {
    let engine = make_engine();
    let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

    for back in 0..6 {
        let date = today.checked_sub_days(Days::new(back)).unwrap();
        engine
            .log_record(
                DutyRecord::new(date, TimeOfDay::hm(7, 0), TimeOfDay::hm(18, 0))
                    .with_flight_minutes(300),
            )
            .unwrap();
    }

    let report = engine.compliance_report(at(10, 20, 0), 0).unwrap();
    assert_eq!(report.overall, ComplianceStatus::Exceeded);
    assert!(!report.is_compliant());
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, CheckKind::SevenDayDuty);
    assert_eq!(report.violations[0].current_minutes, 3960);

    let status = engine.consecutive_status(today).unwrap();
    assert_eq!(status.consecutive_days, 6);
    assert_eq!(status.days_remaining, 1);
    assert!(!status.time_off_required);
}

#[test]
fn test_only_one_active_duty() {
    let engine = make_engine();
    let start = StartDuty {
        sectors: 1,
        ..Default::default()
    };

    engine.start_duty(start.clone(), at(10, 8, 0)).unwrap();
    let second = engine.start_duty(start, at(10, 9, 0));
    assert!(matches!(second, Err(DutyError::SessionAlreadyActive)));

    engine.cancel_duty().unwrap();
    assert!(matches!(
        engine.end_duty(EndDuty::default(), at(10, 10, 0)),
        Err(DutyError::NoActiveSession)
    ));
}

#[test]
fn test_invalid_config_reports_every_error() {
    let toml = r#"
        config_version = 1

        [[countdown.warnings]]
        minutes_before = 600
        severity = "critical"

        [[countdown.warnings]]
        minutes_before = 30

        [[countdown.warnings]]
        minutes_before = 30
        severity = "loud"
    "#;

    match parse_config(toml) {
        Err(ConfigError::ValidationFailed { errors }) => assert_eq!(
            errors,
            vec![
                ValidationError::WarningOutOfRange { minutes: 600 },
                ValidationError::DuplicateWarning(30),
                ValidationError::UnknownSeverity("loud".into()),
            ]
        ),
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_state_persists_in_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        "config_version = 1\n[service]\ndata_dir = '{}'\n",
        dir.path().join("data").display()
    );
    let settings = parse_config(&toml).unwrap();
    let db_path = settings.service.database_path();

    {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
        let engine = DutyEngine::new(EngineSettings::from(&settings), store);
        engine
            .start_duty(
                StartDuty {
                    report_time: Some(TimeOfDay::hm(5, 0)),
                    sectors: 6,
                    ..Default::default()
                },
                at(12, 5, 0),
            )
            .unwrap();
    }

    assert!(db_path.exists());

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
    let engine = DutyEngine::new(EngineSettings::from(&settings), store);
    let session = engine.active_session().unwrap().unwrap();
    assert_eq!(session.sectors, 6);
    // 05:00 falls in the night band: 5+ sectors gives the 9h floor
    assert_eq!(session.max_fdp_minutes, 540);

    engine
        .end_duty(
            EndDuty {
                release_time: Some(TimeOfDay::hm(13, 0)),
                ..Default::default()
            },
            at(12, 13, 0),
        )
        .unwrap();
    assert_eq!(engine.list_records().unwrap().len(), 1);
    assert!(engine.active_session().unwrap().is_none());
}
