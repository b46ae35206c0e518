//! Maximum Flight Duty Period
//!
//! The maximum FDP is a table lookup on the local report time and the number
//! of sectors planned, reduced for unacclimatized crew and clamped into the
//! absolute range. The resulting duty span is checked against the Window of
//! Circadian Low (WOCL).

use dutyguard_api::Acclimatization;
use dutyguard_util::{ClockWindow, DutyError, TimeOfDay, format_duration};
use serde::Serialize;
use tracing::debug;

/// Absolute lower bound of any maximum FDP (9h)
pub const MIN_ABSOLUTE_FDP: u32 = 540;

/// Absolute upper bound of any maximum FDP (14h)
pub const MAX_ABSOLUTE_FDP: u32 = 840;

/// Reduction applied when the crew is not acclimatized
pub const UNACCLIMATIZED_DEDUCTION: u32 = 60;

pub const MIN_SECTORS: u32 = 1;
pub const MAX_SECTORS: u32 = 10;

/// Window of Circadian Low, 02:00-05:59
pub const WOCL: ClockWindow = ClockWindow::new(TimeOfDay::hm(2, 0), TimeOfDay::hm(6, 0));

/// Maximum FDP in minutes, indexed by [`ReportBand`] then [`SectorBand`].
const FDP_TABLE: [[u32; 3]; 6] = [
    // 1-2  3-4  5+
    [840, 780, 720], // 06:00-09:59
    [810, 750, 690], // 10:00-13:59
    [780, 720, 660], // 14:00-16:59
    [720, 660, 600], // 17:00-19:59
    [660, 600, 570], // 20:00-21:59
    [600, 570, 540], // 22:00-05:59
];

/// Local report-time bucket of the FDP table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportBand {
    Early,
    Midday,
    Afternoon,
    Evening,
    Late,
    /// 22:00-05:59, the only band that crosses midnight
    Night,
}

impl ReportBand {
    pub const ALL: [ReportBand; 6] = [
        ReportBand::Early,
        ReportBand::Midday,
        ReportBand::Afternoon,
        ReportBand::Evening,
        ReportBand::Late,
        ReportBand::Night,
    ];

    pub fn window(&self) -> ClockWindow {
        let (start, end) = match self {
            Self::Early => (TimeOfDay::hm(6, 0), TimeOfDay::hm(10, 0)),
            Self::Midday => (TimeOfDay::hm(10, 0), TimeOfDay::hm(14, 0)),
            Self::Afternoon => (TimeOfDay::hm(14, 0), TimeOfDay::hm(17, 0)),
            Self::Evening => (TimeOfDay::hm(17, 0), TimeOfDay::hm(20, 0)),
            Self::Late => (TimeOfDay::hm(20, 0), TimeOfDay::hm(22, 0)),
            Self::Night => (TimeOfDay::hm(22, 0), TimeOfDay::hm(6, 0)),
        };
        ClockWindow::new(start, end)
    }

    pub fn for_time(time: TimeOfDay) -> Self {
        Self::ALL
            .into_iter()
            .find(|band| band.window().contains(time))
            .unwrap_or(Self::Night)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Early => "06:00-09:59",
            Self::Midday => "10:00-13:59",
            Self::Afternoon => "14:00-16:59",
            Self::Evening => "17:00-19:59",
            Self::Late => "20:00-21:59",
            Self::Night => "22:00-05:59",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Early => 0,
            Self::Midday => 1,
            Self::Afternoon => 2,
            Self::Evening => 3,
            Self::Late => 4,
            Self::Night => 5,
        }
    }
}

/// Sector-count bucket of the FDP table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorBand {
    OneToTwo,
    ThreeToFour,
    FiveOrMore,
}

impl SectorBand {
    pub const ALL: [SectorBand; 3] = [
        SectorBand::OneToTwo,
        SectorBand::ThreeToFour,
        SectorBand::FiveOrMore,
    ];

    pub fn for_sectors(sectors: u32) -> Self {
        match sectors {
            0..=2 => Self::OneToTwo,
            3..=4 => Self::ThreeToFour,
            _ => Self::FiveOrMore,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OneToTwo => "1-2",
            Self::ThreeToFour => "3-4",
            Self::FiveOrMore => "5+",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::OneToTwo => 0,
            Self::ThreeToFour => 1,
            Self::FiveOrMore => 2,
        }
    }
}

/// Table value before any deduction or clamping
pub fn base_fdp(report: ReportBand, sectors: SectorBand) -> u32 {
    FDP_TABLE[report.index()][sectors.index()]
}

/// Every row of the table with its band, for display
pub fn fdp_table() -> impl Iterator<Item = (ReportBand, [u32; 3])> {
    ReportBand::ALL
        .into_iter()
        .map(|band| (band, FDP_TABLE[band.index()]))
}

/// A reduction applied to the table value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub reason: String,
    pub minutes: u32,
}

/// Outcome of one maximum-FDP evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FdpResult {
    pub report_time: TimeOfDay,
    pub sectors: u32,
    pub acclimatization: Acclimatization,
    pub report_band: ReportBand,
    pub sector_band: SectorBand,
    pub base_fdp_minutes: u32,
    pub deductions: Vec<Deduction>,
    pub max_fdp_minutes: u32,
    /// Whether the absolute range altered the result
    pub clamped: bool,
    pub end_of_duty: TimeOfDay,
    /// End of duty falls on the day after the report
    pub end_next_day: bool,
    pub wocl_encroachment: bool,
    pub wocl_note: String,
}

impl FdpResult {
    /// End of duty with a `(+1)` marker when it crosses midnight
    pub fn end_of_duty_display(&self) -> String {
        if self.end_next_day {
            format!("{} (+1)", self.end_of_duty)
        } else {
            self.end_of_duty.to_string()
        }
    }

    pub fn max_fdp_display(&self) -> String {
        format_duration(self.max_fdp_minutes)
    }
}

/// Compute the maximum FDP for a report time given as `HH:MM`.
///
/// # Errors
///
/// Returns [`DutyError::InvalidInput`] when the report time does not parse
/// or the sector count is outside `[1, 10]`.
pub fn compute_max_fdp(
    report_time: &str,
    sectors: u32,
    acclimatization: Acclimatization,
) -> Result<FdpResult, DutyError> {
    let report = TimeOfDay::parse(report_time).ok_or_else(|| {
        DutyError::invalid(format!(
            "Invalid report time '{}': expected HH:MM (00:00-23:59)",
            report_time
        ))
    })?;

    compute_max_fdp_at(report, sectors, acclimatization)
}

/// Compute the maximum FDP for an already-parsed report time.
pub fn compute_max_fdp_at(
    report: TimeOfDay,
    sectors: u32,
    acclimatization: Acclimatization,
) -> Result<FdpResult, DutyError> {
    if !(MIN_SECTORS..=MAX_SECTORS).contains(&sectors) {
        return Err(DutyError::invalid(format!(
            "Sector count must be between {} and {}, got {}",
            MIN_SECTORS, MAX_SECTORS, sectors
        )));
    }

    let report_band = ReportBand::for_time(report);
    let sector_band = SectorBand::for_sectors(sectors);
    let base = base_fdp(report_band, sector_band);

    let mut deductions = Vec::new();
    if !acclimatization.is_acclimatized() {
        deductions.push(Deduction {
            reason: "Crew not acclimatized".into(),
            minutes: UNACCLIMATIZED_DEDUCTION,
        });
    }

    let deducted = deductions
        .iter()
        .fold(base, |fdp, d| fdp.saturating_sub(d.minutes));
    let max_fdp = deducted.clamp(MIN_ABSOLUTE_FDP, MAX_ABSOLUTE_FDP);

    let end_minutes = report.as_minutes() + max_fdp;
    let end_of_duty = TimeOfDay::from_minutes_wrapping(end_minutes as i64);
    let end_next_day = dutyguard_util::day_offset(end_minutes as i64) > 0;

    let wocl_encroachment = wocl_encroachment(report, max_fdp);
    let wocl_note = wocl_note(report, end_of_duty, wocl_encroachment);

    debug!(
        report = %report,
        sectors,
        band = report_band.label(),
        base,
        max_fdp,
        wocl = wocl_encroachment,
        "Max FDP computed"
    );

    Ok(FdpResult {
        report_time: report,
        sectors,
        acclimatization,
        report_band,
        sector_band,
        base_fdp_minutes: base,
        deductions,
        max_fdp_minutes: max_fdp,
        clamped: max_fdp != deducted,
        end_of_duty,
        end_next_day,
        wocl_encroachment,
        wocl_note,
    })
}

/// Whether the duty `[report, report + duration)` intersects the WOCL on a
/// 24-hour clock.
pub fn wocl_encroachment(report: TimeOfDay, duration_minutes: u32) -> bool {
    WOCL.overlaps(report.as_minutes(), duration_minutes)
}

/// Whether the report time itself falls inside the WOCL
pub fn report_in_wocl(report: TimeOfDay) -> bool {
    WOCL.contains(report)
}

fn wocl_note(report: TimeOfDay, end: TimeOfDay, encroaches: bool) -> String {
    let wocl = "WOCL (02:00-05:59)";
    if report_in_wocl(report) {
        format!("Report time {} falls within the {}", report, wocl)
    } else if encroaches {
        format!("Duty {}-{} encroaches on the {}", report, end, wocl)
    } else {
        "No WOCL encroachment".to_string()
    }
}
