//! Configuration validation

use crate::schema::{RawConfig, RawSeedSlot};
use chrono::{NaiveDate, NaiveTime};
use intake_util::Modality;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Seed slot {index}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { index: usize, value: String },

    #[error("Seed slot {index}: invalid time '{value}' (expected HH:MM)")]
    InvalidTime { index: usize, value: String },

    #[error("Seed slot {index}: {message}")]
    InvalidModality { index: usize, message: String },

    #[error("Duplicate seed slot at {date} {time}")]
    DuplicateSeedSlot { date: String, time: String },

    #[error("Service config error: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.service.reservation_ttl_seconds == Some(0) {
        errors.push(ValidationError::ServiceError(
            "reservation_ttl_seconds must be greater than zero".into(),
        ));
    }

    if config.service.sweep_period_seconds == Some(0) {
        errors.push(ValidationError::ServiceError(
            "sweep_period_seconds must be greater than zero".into(),
        ));
    }

    if config.service.max_candidate_slots == Some(0) {
        errors.push(ValidationError::ServiceError(
            "max_candidate_slots must be at least 1".into(),
        ));
    }

    let mut seen = HashSet::new();
    for (index, slot) in config.seed_slots.iter().enumerate() {
        errors.extend(validate_seed_slot(slot, index));

        if !seen.insert((slot.date.as_str(), slot.time.as_str())) {
            errors.push(ValidationError::DuplicateSeedSlot {
                date: slot.date.clone(),
                time: slot.time.clone(),
            });
        }
    }

    errors
}

fn validate_seed_slot(slot: &RawSeedSlot, index: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if parse_date(&slot.date).is_none() {
        errors.push(ValidationError::InvalidDate {
            index,
            value: slot.date.clone(),
        });
    }

    if parse_time(&slot.time).is_none() {
        errors.push(ValidationError::InvalidTime {
            index,
            value: slot.time.clone(),
        });
    }

    if let Err(message) = slot.modality.parse::<Modality>() {
        errors.push(ValidationError::InvalidModality { index, message });
    }

    errors
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parse an HH:MM time of day
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}
