//! Validated settings structures

use crate::schema::RawConfig;
use crate::validation::{parse_date, parse_time};
use chrono::{NaiveDate, NaiveTime};
use intake_util::Modality;
use std::path::PathBuf;
use std::time::Duration;

/// Validated settings ready for use by the service
#[derive(Debug, Clone)]
pub struct Settings {
    /// Data directory for the store
    pub data_dir: PathBuf,

    /// How long an unrefreshed soft reservation lives
    pub reservation_ttl: Duration,

    /// How often the expiry sweep runs
    pub sweep_period: Duration,

    /// Maximum candidate slots an application may nominate
    pub max_candidate_slots: usize,

    /// Slots installed when the slot table is empty
    pub seed_slots: Vec<SeedSlot>,
}

/// A slot definition from the config file
#[derive(Debug, Clone)]
pub struct SeedSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Modality,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let seed_slots = raw
            .seed_slots
            .iter()
            .filter_map(|s| {
                Some(SeedSlot {
                    date: parse_date(&s.date)?,
                    time: parse_time(&s.time)?,
                    modality: s.modality.parse().ok()?,
                })
            })
            .collect();

        Self {
            data_dir: raw
                .service
                .data_dir
                .unwrap_or_else(|| PathBuf::from("/var/lib/intaked")),
            reservation_ttl: Duration::from_secs(
                raw.service.reservation_ttl_seconds.unwrap_or(300),
            ),
            sweep_period: Duration::from_secs(raw.service.sweep_period_seconds.unwrap_or(60)),
            max_candidate_slots: raw.service.max_candidate_slots.unwrap_or(2),
            seed_slots,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_raw(RawConfig {
            config_version: crate::CURRENT_CONFIG_VERSION,
            service: Default::default(),
            seed_slots: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let settings = Settings::default();
        assert_eq!(settings.reservation_ttl, Duration::from_secs(300));
        assert_eq!(settings.sweep_period, Duration::from_secs(60));
        assert_eq!(settings.max_candidate_slots, 2);
    }
}
