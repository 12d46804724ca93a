//! Persistence layer for intake
//!
//! Provides:
//! - Slot records with their reservation fields
//! - Application records referencing slots by id
//! - Atomic per-slot read-modify-write (`mutate_slot`)
//! - Guarded bulk updates for expiry and cascade cleanup

mod records;
mod sqlite;
mod traits;

pub use records::*;
pub use sqlite::*;
pub use traits::*;

use intake_util::IntakeError;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for IntakeError {
    fn from(e: StoreError) -> Self {
        IntakeError::store(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
