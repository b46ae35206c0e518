//! Shared data model for dutyguard
//!
//! This crate defines the values exchanged between the rule engines, the
//! record store and the CLI:
//! - Duty records (completed duties)
//! - The active duty session
//! - Crew settings (acclimatization, augmentation, warnings)

mod record;
mod session;
mod types;

pub use record::*;
pub use session::*;
pub use types::*;
