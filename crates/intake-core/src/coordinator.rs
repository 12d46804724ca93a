//! Multi-slot application semantics
//!
//! An application nominates up to a small number of candidate slots at
//! submission, later commits to exactly one of them, and may be unwound by
//! HR. Holds across multiple slots are placed one slot at a time, best
//! effort; there is deliberately no transaction spanning slots, so a
//! failure on one candidate never rolls back holds already placed.

use chrono::{DateTime, Utc};
use intake_store::{ApplicantProfile, ApplicationRecord, ApplicationStatus, Store};
use intake_util::{ApplicationId, IntakeError, Result, SlotId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::SlotReservationEngine;

/// How long a submitted application is retained
const APPLICATION_RETENTION_DAYS: i64 = 30;

/// Outcome of an application submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub application_id: ApplicationId,
    /// Candidate slots that passed validation and were stored; candidates
    /// that were booked, held elsewhere, or missing are silently dropped.
    pub accepted_slots: Vec<SlotId>,
}

/// Coordinates application lifecycle against the slot pool
#[derive(Clone)]
pub struct ApplicationCoordinator {
    store: Arc<dyn Store>,
    engine: SlotReservationEngine,
    max_candidate_slots: usize,
}

impl ApplicationCoordinator {
    pub fn new(
        store: Arc<dyn Store>,
        engine: SlotReservationEngine,
        max_candidate_slots: usize,
    ) -> Self {
        Self {
            store,
            engine,
            max_candidate_slots,
        }
    }

    /// Submit a new application nominating candidate slots.
    ///
    /// Each candidate is re-validated at submission time; unavailable ones
    /// are dropped rather than failing the submission. Holds on the
    /// surviving candidates are placed slot-by-slot after the application
    /// row exists.
    pub fn submit(
        &self,
        application_id: ApplicationId,
        profile: ApplicantProfile,
        candidates: Vec<SlotId>,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        if candidates.len() > self.max_candidate_slots {
            return Err(IntakeError::validation(format!(
                "at most {} candidate slots may be nominated, got {}",
                self.max_candidate_slots,
                candidates.len()
            )));
        }

        // Keep only candidates that are actually available right now:
        // the slot exists, is not booked, and is held by no one.
        let mut accepted = Vec::new();
        for candidate in &candidates {
            match self.store.get_slot(candidate)? {
                Some(slot) if !slot.booked && slot.held_by.is_none() => {
                    accepted.push(candidate.clone());
                }
                Some(_) | None => {
                    debug!(slot_id = %candidate, "Candidate slot unavailable, dropped");
                }
            }
        }

        let record = ApplicationRecord {
            id: application_id.clone(),
            profile,
            status: ApplicationStatus::Pending,
            selected_slots: accepted.clone(),
            confirmed_slot: None,
            created_at: now,
            updated_at: now,
            expires_at: now + chrono::Duration::days(APPLICATION_RETENTION_DAYS),
        };
        self.store.create_application(&record)?;

        // Best-effort multi-hold: a conflict that raced in since
        // validation drops that slot without unwinding earlier holds.
        for slot_id in &accepted {
            if let Err(e) = self.engine.hold(slot_id, &application_id) {
                warn!(slot_id = %slot_id, application_id = %application_id, error = %e,
                      "Hold failed after validation, slot skipped");
            }
        }

        info!(
            application_id = %application_id,
            nominated = candidates.len(),
            accepted = accepted.len(),
            "Application submitted"
        );

        Ok(Submission {
            application_id,
            accepted_slots: accepted,
        })
    }

    /// Applicant commits to one of their nominated slots.
    ///
    /// Books the slot, releases every other hold this application has, and
    /// stores a snapshot of the slot on the application. The nominated
    /// list is kept untouched as a historical record.
    pub fn confirm_slot(
        &self,
        application_id: &ApplicationId,
        slot_id: &SlotId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.store.get_application(application_id)?.is_none() {
            return Err(IntakeError::ApplicationNotFound(application_id.clone()));
        }

        // Confirmation targets a live choice, so any existing booking is a
        // conflict here, unlike the idempotent HR book operation.
        let slot = self.engine.get_slot(slot_id)?;
        if slot.booked {
            return Err(IntakeError::conflict(
                slot_id.clone(),
                intake_util::ConflictReason::Booked,
            ));
        }

        let booked = self.engine.book(slot_id, application_id)?;

        // The applicant commits to exactly one time; the rest go back to
        // the pool.
        let released = self.store.release_holds(application_id, Some(slot_id))?;

        self.store.set_confirmed_slot(
            application_id,
            &booked.snapshot(),
            ApplicationStatus::InterviewScheduled,
            now,
        )?;

        info!(
            application_id = %application_id,
            slot_id = %slot_id,
            other_holds_released = released,
            "Interview slot confirmed"
        );
        Ok(())
    }

    /// HR reverses a confirmation: the booked slot is freed, every slot
    /// still nominated is re-held when possible, and the application goes
    /// back to pending.
    pub fn release_confirmed_slot(
        &self,
        application_id: &ApplicationId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let application = self
            .store
            .get_application(application_id)?
            .ok_or_else(|| IntakeError::ApplicationNotFound(application_id.clone()))?;

        let confirmed = application
            .confirmed_slot
            .ok_or_else(|| IntakeError::NothingConfirmed(application_id.clone()))?;

        match self.engine.unbook(&confirmed.id) {
            Ok(()) => {}
            Err(IntakeError::SlotNotFound(_)) => {
                // The slot was deleted after confirmation; nothing to free.
                warn!(slot_id = %confirmed.id, "Confirmed slot no longer exists");
            }
            Err(e) => return Err(e),
        }

        // Best-effort re-hold of the original nominations. A slot that was
        // booked or claimed by someone else in the meantime stays theirs.
        for slot_id in &application.selected_slots {
            match self.engine.hold(slot_id, application_id) {
                Ok(()) => {}
                Err(IntakeError::SlotNotFound(_)) | Err(IntakeError::Conflict { .. }) => {
                    debug!(slot_id = %slot_id, "Slot not re-held, no longer available");
                }
                Err(e) => return Err(e),
            }
        }

        self.store
            .clear_confirmed_slot(application_id, ApplicationStatus::Pending, now)?;

        info!(application_id = %application_id, slot_id = %confirmed.id, "Confirmed slot released");
        Ok(())
    }

    /// Delete an application, cascading to the slot pool: holds and
    /// bookings referencing it are cleared so no slot points at a deleted
    /// application.
    pub fn delete(&self, application_id: &ApplicationId) -> Result<()> {
        if self.store.get_application(application_id)?.is_none() {
            return Err(IntakeError::ApplicationNotFound(application_id.clone()));
        }

        self.store.release_application_claims(application_id)?;
        self.store.delete_application(application_id)?;

        info!(application_id = %application_id, "Application deleted");
        Ok(())
    }

    /// Update application status (HR)
    pub fn set_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.store.set_application_status(application_id, status, now)? {
            return Err(IntakeError::ApplicationNotFound(application_id.clone()));
        }

        info!(application_id = %application_id, status = %status, "Application status updated");
        Ok(())
    }

    /// Fetch one application (HR)
    pub fn get(&self, application_id: &ApplicationId) -> Result<ApplicationRecord> {
        self.store
            .get_application(application_id)?
            .ok_or_else(|| IntakeError::ApplicationNotFound(application_id.clone()))
    }

    /// All applications, newest first (HR)
    pub fn list(&self) -> Result<Vec<ApplicationRecord>> {
        Ok(self.store.list_applications()?)
    }
}
