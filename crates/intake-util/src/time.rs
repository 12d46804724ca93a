//! Time helpers for intake
//!
//! Reservation expiry is evaluated in two places: lazily on the request
//! path (reserve/list) and eagerly by the periodic sweep. Both must agree,
//! so the predicate and the cutoff derivation live here and nowhere else.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get the current wall-clock time.
///
/// Reservation TTLs are wall-clock based so that a restart only needs a
/// re-sweep, never timer recovery.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whether a soft reservation placed at `reserved_at` has expired.
pub fn reservation_expired(reserved_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    reserved_at <= expiry_cutoff(now, ttl)
}

/// The instant before which a reservation counts as expired.
///
/// `reserved_at <= cutoff` is equivalent to `now - reserved_at >= ttl`;
/// the sweep uses the cutoff directly in its WHERE clause.
pub fn expiry_cutoff(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now - chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero())
}
