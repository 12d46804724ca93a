//! Shared utilities for intake
//!
//! This crate provides:
//! - ID types (SlotId, ApplicationId, SessionId) and the Modality enum
//! - The error taxonomy for slot and application operations
//! - Time helpers, including the single reservation-expiry predicate

mod error;
mod ids;
mod modality;
mod time;

pub use error::*;
pub use ids::*;
pub use modality::*;
pub use time::*;
