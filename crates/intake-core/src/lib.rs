//! Core reservation engine and application coordination for intake
//!
//! This crate is the heart of intaked, containing:
//! - The per-slot state machine (Free -> SoftReserved -> Held -> Booked)
//!   with hold-dominates-reservation precedence
//! - Time-based soft-reservation expiry (lazy on access, eager via sweep)
//! - Multi-slot application semantics (best-effort holds, confirm-one,
//!   release-the-rest, deletion cascade)

mod coordinator;
mod engine;

pub use coordinator::*;
pub use engine::*;
