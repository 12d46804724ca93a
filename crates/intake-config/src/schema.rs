//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Slots installed when the slot table is empty
    #[serde(default)]
    pub seed_slots: Vec<RawSeedSlot>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store (default: /var/lib/intaked)
    pub data_dir: Option<PathBuf>,

    /// Soft-reservation time-to-live in seconds (default: 300)
    pub reservation_ttl_seconds: Option<u64>,

    /// Expiry sweep period in seconds (default: 60)
    pub sweep_period_seconds: Option<u64>,

    /// Maximum candidate slots an application may nominate (default: 2)
    pub max_candidate_slots: Option<usize>,
}

/// Raw seed slot definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSeedSlot {
    /// Calendar day (YYYY-MM-DD)
    pub date: String,

    /// Time of day (HH:MM)
    pub time: String,

    /// "in_person" or "virtual"
    pub modality: String,
}
