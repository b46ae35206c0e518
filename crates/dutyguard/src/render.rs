//! Plain-text rendering of engine results

use dutyguard_api::DutyRecord;
use dutyguard_core::{CoreEvent, DutyCountdown};
use dutyguard_rules::{
    CheckScope, ComplianceReport, ConsecutiveDaysStatus, FdpResult, RestCompliance, RestMargin,
    RestResult, SectorBand, availability, fdp_table,
};
use chrono::{DateTime, Local};
use dutyguard_util::{format_datetime_full, format_duration};
use std::fmt::Write;

pub fn fdp_result(fdp: &FdpResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Maximum FDP: {} ({} minutes)",
        fdp.max_fdp_display(),
        fdp.max_fdp_minutes
    );
    let _ = writeln!(
        out,
        "Report {} ({}), {} sector(s) ({}), {}",
        fdp.report_time,
        fdp.report_band.label(),
        fdp.sectors,
        fdp.sector_band.label(),
        if fdp.acclimatization.is_acclimatized() {
            "acclimatized"
        } else {
            "not acclimatized"
        }
    );
    let _ = writeln!(out, "  Table value: {}", format_duration(fdp.base_fdp_minutes));
    for deduction in &fdp.deductions {
        let _ = writeln!(
            out,
            "  {}: -{}",
            deduction.reason,
            format_duration(deduction.minutes)
        );
    }
    if fdp.clamped {
        let _ = writeln!(out, "  Limited to the 9h-14h range");
    }
    let _ = writeln!(out, "End of duty: {}", fdp.end_of_duty_display());
    let _ = write!(out, "{}", fdp.wocl_note);
    out
}

pub fn fdp_table_text() -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<13}", "Report");
    for band in SectorBand::ALL {
        let _ = write!(out, "{:>8}", band.label());
    }
    for (band, row) in fdp_table() {
        let _ = write!(out, "\n{:<13}", band.label());
        for minutes in row {
            let _ = write!(out, "{:>8}", format_duration(minutes));
        }
    }
    out
}

pub fn rest_result(rest: &RestResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Minimum rest: {} ({} minutes)",
        format_duration(rest.min_rest_minutes),
        rest.min_rest_minutes
    );
    for component in &rest.components {
        let _ = writeln!(out, "  {}", component.description);
    }
    let _ = writeln!(
        out,
        "Recommended: {}",
        format_duration(rest.recommended_rest_minutes)
    );
    let _ = write!(
        out,
        "Duty end {}, earliest next report {}",
        rest.duty_end,
        rest.next_report_display()
    );
    out
}

pub fn rest_compliance(check: &RestCompliance) -> String {
    let verdict = match check.margin {
        RestMargin::Surplus(minutes) => format!("COMPLIANT, {} to spare", format_duration(minutes)),
        RestMargin::Deficit(minutes) => format!("NOT COMPLIANT, {} short", format_duration(minutes)),
    };
    format!(
        "Proposed rest {} against a minimum of {}: {}",
        format_duration(check.proposed_rest_minutes),
        format_duration(check.required_rest_minutes),
        verdict
    )
}

/// Shown when the clock is overridden for testing.
pub fn mock_clock(now: &DateTime<Local>) -> String {
    format!("Mock time: {}", format_datetime_full(now))
}

pub fn countdown(countdown: &DutyCountdown) -> String {
    format!(
        "Duty reported {} ({} sector(s)), FDP ends {}\n{}",
        countdown.report_time,
        countdown.sectors,
        countdown.fdp_end.format("%Y-%m-%d %H:%M"),
        countdown.summary()
    )
}

pub fn compliance_report(report: &ComplianceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Compliance as of {}: {}", report.as_of, report.overall);
    for check in &report.checks {
        let scope = match check.scope {
            CheckScope::Window { days } => format!("{} record(s) in {} days", check.record_count, days),
            CheckScope::Instant { crew } => format!("{} crew", crew),
        };
        let _ = writeln!(
            out,
            "  {:<20} {:>9} / {:<9} {:>5.1}%  {:<8} {}",
            check.kind.label(),
            format_duration(check.current_minutes),
            format_duration(check.limit_minutes),
            check.percentage,
            check.status,
            scope
        );
    }
    for violation in &report.violations {
        let _ = writeln!(
            out,
            "VIOLATION: {} over by {}",
            violation.kind,
            format_duration(violation.current_minutes - violation.limit_minutes)
        );
    }
    match availability(report) {
        Some(available) => {
            let _ = write!(
                out,
                "Available duty: {} (limited by {})",
                format_duration(available.remaining_minutes),
                available.limiting_factor
            );
        }
        None => {
            let _ = write!(out, "Available duty: unknown");
        }
    }
    out
}

pub fn record_line(record: &DutyRecord) -> String {
    let mut line = format!(
        "{}  {}  {}-{}  duty {:>7}  flight {:>7}  {} sector(s)",
        record.id,
        record.date,
        record.report_time(),
        record.release_time(),
        format_duration(record.duty_minutes()),
        format_duration(record.flight_minutes),
        record.sectors
    );
    if !record.note.is_empty() {
        let _ = write!(line, "  {}", record.note);
    }
    line
}

pub fn records(records: &[DutyRecord]) -> String {
    if records.is_empty() {
        return "No duty records".into();
    }
    records.iter().map(record_line).collect::<Vec<_>>().join("\n")
}

pub fn consecutive(status: &ConsecutiveDaysStatus) -> String {
    if status.time_off_required {
        format!(
            "{} consecutive duty days: time off of at least {} required",
            status.consecutive_days,
            format_duration(status.minimum_time_off_minutes)
        )
    } else {
        format!(
            "{} consecutive duty days, {} of {} remaining before time off",
            status.consecutive_days, status.days_remaining, status.max_consecutive_days
        )
    }
}

pub fn core_event(event: &CoreEvent) -> String {
    match event {
        CoreEvent::DutyStarted { session, fdp } => format!(
            "Duty started {} {}, session {}\n{}",
            session.report_date,
            session.report_time,
            session.session_id,
            fdp_result(fdp)
        ),
        CoreEvent::SectorsChanged {
            previous_sectors,
            sectors,
            previous_max_fdp_minutes,
            fdp,
            ..
        } => format!(
            "Sectors {} -> {}, maximum FDP {} -> {}, end of duty {}",
            previous_sectors,
            sectors,
            format_duration(*previous_max_fdp_minutes),
            fdp.max_fdp_display(),
            fdp.end_of_duty_display()
        ),
        CoreEvent::Warning {
            remaining_minutes,
            severity,
            message,
            ..
        } => match message {
            Some(message) => format!("[{:?}] {}", severity, message),
            None => format!(
                "[{:?}] {} of FDP remaining",
                severity,
                format_duration(*remaining_minutes)
            ),
        },
        CoreEvent::FdpExceeded {
            max_fdp_minutes,
            fdp_end,
            ..
        } => format!(
            "Maximum FDP of {} reached at {}",
            format_duration(*max_fdp_minutes),
            fdp_end.format("%H:%M")
        ),
        CoreEvent::DutyEnded {
            record,
            duty_minutes,
            ..
        } => match record {
            Some(record) => format!(
                "Duty ended after {}, logged as\n{}",
                format_duration(*duty_minutes),
                record_line(record)
            ),
            None => format!(
                "Duty ended after {}, not logged",
                format_duration(*duty_minutes)
            ),
        },
        CoreEvent::DutyCancelled { session_id } => format!("Duty {} cancelled", session_id),
    }
}
