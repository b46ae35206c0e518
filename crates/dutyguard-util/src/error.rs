//! Error types for dutyguard

use thiserror::Error;

use crate::RecordId;

/// Core error type for dutyguard operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DutyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A duty is already active")]
    SessionAlreadyActive,

    #[error("No active duty")]
    NoActiveSession,

    #[error("Duty record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("Store error: {0}")]
    StoreError(String),
}

/// Broad classification of a [`DutyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed time string, out-of-range sector/timezone/duty-length value
    InputValidation,
    /// Starting a duty while one is active, ending one when none is
    StateConflict,
    NotFound,
    Infrastructure,
}

impl DutyError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InputValidation,
            Self::SessionAlreadyActive | Self::NoActiveSession => ErrorKind::StateConflict,
            Self::RecordNotFound(_) => ErrorKind::NotFound,
            Self::StoreError(_) => ErrorKind::Infrastructure,
        }
    }
}
