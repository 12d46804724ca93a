//! Store trait definitions

use chrono::{DateTime, Utc};
use intake_util::{ApplicationId, IntakeError, SessionId, SlotId};

use crate::{ApplicationRecord, ApplicationStatus, SlotRecord, SlotSnapshot, StoreResult};

/// A slot state transition evaluated inside `mutate_slot`.
///
/// The closure sees the current record, checks its preconditions, and
/// either mutates the record in place or returns the error surfaced to
/// the caller. The store writes the record back only on `Ok`.
pub type SlotTransition<'a> = &'a mut dyn FnMut(&mut SlotRecord) -> Result<(), IntakeError>;

/// Main store trait
pub trait Store: Send + Sync {
    // Slots

    /// Insert a new slot
    fn create_slot(&self, record: &SlotRecord) -> StoreResult<()>;

    /// Fetch one slot
    fn get_slot(&self, id: &SlotId) -> StoreResult<Option<SlotRecord>>;

    /// All slots ordered by (date, time)
    fn list_slots(&self) -> StoreResult<Vec<SlotRecord>>;

    /// Delete a slot; returns whether it existed
    fn delete_slot(&self, id: &SlotId) -> StoreResult<bool>;

    /// Number of slots in the store
    fn slot_count(&self) -> StoreResult<usize>;

    /// Atomic read-modify-write of one slot's reservation fields.
    ///
    /// The read, the transition, and the write happen under a single
    /// connection guard, so no two mutations of the same slot interleave.
    /// Returns the record as written.
    fn mutate_slot(
        &self,
        id: &SlotId,
        transition: SlotTransition<'_>,
    ) -> Result<SlotRecord, IntakeError>;

    // Bulk slot updates (single guarded statements)

    /// Clear every unbooked reservation stamped at or before `cutoff`.
    /// Returns the number of reservations cleared.
    fn clear_expired_reservations(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;

    /// Clear every reservation owned by `session`
    fn release_session_reservations(&self, session: &SessionId) -> StoreResult<usize>;

    /// Clear every hold owned by `applicant`, except `keep` if given
    fn release_holds(&self, applicant: &ApplicationId, keep: Option<&SlotId>)
        -> StoreResult<usize>;

    /// Cascade for application deletion: clear holds and bookings that
    /// reference `applicant`, returning those slots to free
    fn release_application_claims(&self, applicant: &ApplicationId) -> StoreResult<()>;

    // Applications

    /// Insert a new application
    fn create_application(&self, record: &ApplicationRecord) -> StoreResult<()>;

    /// Fetch one application
    fn get_application(&self, id: &ApplicationId) -> StoreResult<Option<ApplicationRecord>>;

    /// All applications, newest first
    fn list_applications(&self) -> StoreResult<Vec<ApplicationRecord>>;

    /// Update status; returns whether the application existed
    fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Record the confirmed slot snapshot alongside a status change
    fn set_confirmed_slot(
        &self,
        id: &ApplicationId,
        snapshot: &SlotSnapshot,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Clear the confirmed slot alongside a status change
    fn clear_confirmed_slot(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Delete an application row; returns whether it existed
    fn delete_application(&self, id: &ApplicationId) -> StoreResult<bool>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
