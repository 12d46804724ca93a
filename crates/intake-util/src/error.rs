//! Error types for intake

use thiserror::Error;

use crate::{ApplicationId, SlotId};

/// Why a slot could not be claimed at the requested precedence level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Permanently booked by another application
    Booked,
    /// Held by another application pending confirmation
    Held,
    /// Temporarily reserved by another session and not yet expired
    Reserved,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Booked => write!(f, "booked by another applicant"),
            Self::Held => write!(f, "held by another applicant"),
            Self::Reserved => write!(f, "reserved by another session"),
        }
    }
}

/// Core error type for slot and application operations
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),

    #[error("Application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    #[error("Slot {slot_id} is unavailable: {reason}")]
    Conflict {
        slot_id: SlotId,
        reason: ConflictReason,
    },

    #[error("Application {0} has no confirmed slot")]
    NothingConfirmed(ApplicationId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl IntakeError {
    pub fn conflict(slot_id: SlotId, reason: ConflictReason) -> Self {
        Self::Conflict { slot_id, reason }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
