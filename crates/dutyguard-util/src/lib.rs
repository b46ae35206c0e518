//! Shared utilities for dutyguard
//!
//! This crate provides:
//! - ID types (RecordId, SessionId)
//! - Time-of-day arithmetic (minute-of-day conversion, overnight wrap, duration formatting)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
