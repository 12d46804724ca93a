//! Slot reservation state machine

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use intake_store::{SlotRecord, Store};
use intake_util::{
    expiry_cutoff, reservation_expired, ApplicationId, ConflictReason, IntakeError, Modality,
    Result, SessionId, SlotId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The slot reservation engine.
///
/// Each operation is one state transition per slot, evaluated inside the
/// store's atomic read-modify-write so concurrent requests and the expiry
/// sweep never interleave on the same slot.
///
/// Claim precedence, weakest to strongest: soft reservation (expiring,
/// session-scoped), hold (non-expiring, application-scoped), booking
/// (permanent). A stronger claim always wins over a weaker one; placing a
/// hold clears any soft reservation on the slot.
#[derive(Clone)]
pub struct SlotReservationEngine {
    store: Arc<dyn Store>,
    reservation_ttl: Duration,
}

impl SlotReservationEngine {
    pub fn new(store: Arc<dyn Store>, reservation_ttl: Duration) -> Self {
        Self {
            store,
            reservation_ttl,
        }
    }

    /// The soft-reservation time-to-live
    pub fn reservation_ttl(&self) -> Duration {
        self.reservation_ttl
    }

    /// Create a new free slot (privileged)
    pub fn create_slot(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        modality: Modality,
    ) -> Result<SlotRecord> {
        let record = SlotRecord::new(SlotId::generate(), date, time, modality);
        self.store.create_slot(&record)?;

        info!(slot_id = %record.id, date = %date, time = %time, "Slot created");
        Ok(record)
    }

    /// Delete a slot (privileged)
    pub fn delete_slot(&self, slot_id: &SlotId) -> Result<()> {
        if !self.store.delete_slot(slot_id)? {
            return Err(IntakeError::SlotNotFound(slot_id.clone()));
        }

        info!(slot_id = %slot_id, "Slot deleted");
        Ok(())
    }

    /// Fetch one slot as currently stored
    pub fn get_slot(&self, slot_id: &SlotId) -> Result<SlotRecord> {
        self.store
            .get_slot(slot_id)?
            .ok_or_else(|| IntakeError::SlotNotFound(slot_id.clone()))
    }

    /// All slots ordered by (date, time), with expired reservations swept
    /// first so clients never see stale claims.
    pub fn list_slots(&self, now: DateTime<Utc>) -> Result<Vec<SlotRecord>> {
        self.sweep_expired(now)?;
        Ok(self.store.list_slots()?)
    }

    /// Clear every expired, unbooked soft reservation.
    ///
    /// Called eagerly by the periodic sweep task and lazily by `reserve`
    /// and `list_slots`; both paths share the same cutoff derivation.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = expiry_cutoff(now, self.reservation_ttl);
        let cleared = self.store.clear_expired_reservations(cutoff)?;

        if cleared > 0 {
            debug!(cleared, "Expired reservations swept");
        }
        Ok(cleared)
    }

    /// Place or refresh a soft reservation for a browsing session.
    ///
    /// Fails with a conflict if the slot is booked, held by anyone (holds
    /// strictly dominate reservations), or reserved by a different session
    /// that has not yet expired. Re-reserving by the owning session
    /// refreshes the stamp. Returns the full TTL remaining.
    pub fn reserve(
        &self,
        slot_id: &SlotId,
        session: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Duration> {
        self.sweep_expired(now)?;

        let ttl = self.reservation_ttl;
        self.store.mutate_slot(slot_id, &mut |slot| {
            if slot.booked {
                return Err(IntakeError::conflict(slot.id.clone(), ConflictReason::Booked));
            }
            if slot.held_by.is_some() {
                return Err(IntakeError::conflict(slot.id.clone(), ConflictReason::Held));
            }
            if let (Some(owner), Some(at)) = (&slot.reserved_by, slot.reserved_at) {
                if owner != session && !reservation_expired(at, now, ttl) {
                    return Err(IntakeError::conflict(
                        slot.id.clone(),
                        ConflictReason::Reserved,
                    ));
                }
            }

            slot.reserved_by = Some(session.clone());
            slot.reserved_at = Some(now);
            Ok(())
        })?;

        debug!(slot_id = %slot_id, session = %session, ttl_secs = ttl.as_secs(), "Slot reserved");
        Ok(ttl)
    }

    /// Release a session's soft reservation.
    ///
    /// A mismatched session is a silent no-op, not an error: clients retry
    /// and navigate away freely, and must never clear someone else's claim.
    pub fn release(&self, slot_id: &SlotId, session: &SessionId) -> Result<()> {
        self.store.mutate_slot(slot_id, &mut |slot| {
            if slot.reserved_by.as_ref() == Some(session) {
                slot.clear_reservation();
            }
            Ok(())
        })?;

        debug!(slot_id = %slot_id, session = %session, "Slot released");
        Ok(())
    }

    /// Release every reservation owned by a session (client navigated away)
    pub fn release_all(&self, session: &SessionId) -> Result<usize> {
        let released = self.store.release_session_reservations(session)?;

        if released > 0 {
            debug!(session = %session, released, "Session reservations released");
        }
        Ok(released)
    }

    /// Place an application hold on a slot.
    ///
    /// Used by the application pipeline, not exposed as a public endpoint.
    /// Succeeds only when the slot is not booked and not held by a
    /// different application; supersedes any soft reservation.
    pub(crate) fn hold(&self, slot_id: &SlotId, applicant: &ApplicationId) -> Result<()> {
        self.store.mutate_slot(slot_id, &mut |slot| {
            if slot.booked {
                return Err(IntakeError::conflict(slot.id.clone(), ConflictReason::Booked));
            }
            if let Some(holder) = &slot.held_by {
                if holder != applicant {
                    return Err(IntakeError::conflict(slot.id.clone(), ConflictReason::Held));
                }
            }

            slot.held_by = Some(applicant.clone());
            slot.clear_reservation();
            Ok(())
        })?;

        debug!(slot_id = %slot_id, application_id = %applicant, "Slot held");
        Ok(())
    }

    /// Book a slot for an application (privileged).
    ///
    /// Rebooking by the same application is idempotent success. Booking
    /// clears both soft layers, so `booked` implies no hold and no
    /// reservation remain.
    pub fn book(&self, slot_id: &SlotId, applicant: &ApplicationId) -> Result<SlotRecord> {
        let record = self.store.mutate_slot(slot_id, &mut |slot| {
            if slot.booked && slot.booked_by.as_ref() != Some(applicant) {
                return Err(IntakeError::conflict(slot.id.clone(), ConflictReason::Booked));
            }
            if let Some(holder) = &slot.held_by {
                if holder != applicant {
                    return Err(IntakeError::conflict(slot.id.clone(), ConflictReason::Held));
                }
            }

            slot.booked = true;
            slot.booked_by = Some(applicant.clone());
            slot.clear_hold();
            slot.clear_reservation();
            Ok(())
        })?;

        info!(slot_id = %slot_id, application_id = %applicant, "Slot booked");
        Ok(record)
    }

    /// Remove a booking (privileged). Hold and reservation fields are left
    /// alone; booking already cleared them, so the slot returns to free.
    pub fn unbook(&self, slot_id: &SlotId) -> Result<()> {
        self.store.mutate_slot(slot_id, &mut |slot| {
            slot.clear_booking();
            Ok(())
        })?;

        info!(slot_id = %slot_id, "Slot unbooked");
        Ok(())
    }

    /// Clear both soft layers unconditionally (privileged). An existing
    /// booking is left untouched; unbook is the explicit path for that.
    pub fn force_release(&self, slot_id: &SlotId) -> Result<()> {
        self.store.mutate_slot(slot_id, &mut |slot| {
            slot.clear_reservation();
            slot.clear_hold();
            Ok(())
        })?;

        info!(slot_id = %slot_id, "Slot force-released");
        Ok(())
    }
}
