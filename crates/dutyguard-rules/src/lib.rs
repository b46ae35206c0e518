//! Rule engines for dutyguard
//!
//! Three stateless engines sharing the time primitives of `dutyguard-util`
//! and one status classification:
//! - [`fdp`]: maximum Flight Duty Period from report time and sector count,
//!   with Window of Circadian Low encroachment
//! - [`rest`]: minimum and recommended rest after a duty
//! - [`compliance`]: rolling 7/28/365-day totals against cumulative limits
//!
//! All regulatory values are compile-time constants.

pub mod compliance;
pub mod fdp;
pub mod rest;
mod status;

pub use compliance::{
    ActiveDutyMetrics, Availability, CheckKind, CheckScope, ComplianceCheck, ComplianceReport,
    availability, evaluate_compliance,
};
pub use fdp::{
    FdpResult, ReportBand, SectorBand, compute_max_fdp, compute_max_fdp_at, fdp_table,
};
pub use rest::{
    ConsecutiveDaysStatus, RestCompliance, RestMargin, RestResult, check_rest_compliance,
    compute_min_rest, compute_min_rest_at, consecutive_days_status, consecutive_duty_days,
};
pub use status::*;
