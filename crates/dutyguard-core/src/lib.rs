//! Duty engine for dutyguard
//!
//! This crate ties the rule engines to persisted state:
//! - Active duty lifecycle (start -> change sectors -> end or cancel)
//! - Live FDP countdown and one-shot warnings
//! - Record keeping and the compliance report over stored history

mod countdown;
mod engine;
mod events;

pub use countdown::*;
pub use engine::*;
pub use events::*;
