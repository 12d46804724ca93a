//! Slot and application records

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use intake_util::{ApplicationId, Modality, SessionId, SlotId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An interview slot with its reservation state.
///
/// Three layers of claims with strictly increasing precedence:
/// a soft session reservation (expiring), an application hold
/// (non-expiring), and a booking (permanent until unbooked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub id: SlotId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Modality,

    /// Permanently committed
    pub booked: bool,
    /// Set iff `booked`
    pub booked_by: Option<ApplicationId>,
    /// Non-expiring claim placed when an application nominated this slot
    pub held_by: Option<ApplicationId>,
    /// Expiring claim placed while a session is choosing
    pub reserved_by: Option<SessionId>,
    pub reserved_at: Option<DateTime<Utc>>,
}

impl SlotRecord {
    /// A brand-new free slot
    pub fn new(id: SlotId, date: NaiveDate, time: NaiveTime, modality: Modality) -> Self {
        Self {
            id,
            date,
            time,
            modality,
            booked: false,
            booked_by: None,
            held_by: None,
            reserved_by: None,
            reserved_at: None,
        }
    }

    /// Available for a new hold: not booked, not held by anyone
    pub fn available_for_hold(&self, applicant: &ApplicationId) -> bool {
        !self.booked && self.held_by.as_ref().map_or(true, |h| h == applicant)
    }

    pub fn clear_reservation(&mut self) {
        self.reserved_by = None;
        self.reserved_at = None;
    }

    pub fn clear_hold(&mut self) {
        self.held_by = None;
    }

    pub fn clear_booking(&mut self) {
        self.booked = false;
        self.booked_by = None;
    }

    /// Denormalized copy stored on the application at confirmation time
    pub fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            id: self.id.clone(),
            date: self.date,
            time: self.time,
            modality: self.modality,
        }
    }
}

/// A point-in-time copy of a slot, kept on the application that confirmed
/// it so the record survives later slot changes or deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub id: SlotId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Modality,
}

/// Application lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Pending,
    InterviewScheduled,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InterviewScheduled => "interview-scheduled",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "interview-scheduled" => Ok(Self::InterviewScheduled),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

/// Applicant-provided profile fields, carried as data only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub age: String,
    pub job_position: String,
}

/// A submitted application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub profile: ApplicantProfile,
    pub status: ApplicationStatus,

    /// Slot ids the applicant nominated at submission time. Kept as a
    /// historical record even after confirmation.
    pub selected_slots: Vec<SlotId>,

    /// Snapshot of the slot the applicant committed to, if any
    pub confirmed_slot: Option<SlotSnapshot>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
