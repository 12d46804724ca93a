//! intaked - The interview slot booking service
//!
//! This is the main entry point for the intaked service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization and first-start slot seeding
//! - Reservation engine and application coordinator
//! - Periodic reservation-expiry sweep
//!
//! The transport boundary (HTTP handlers, auth) lives outside this crate
//! and consumes the engine/coordinator API.

use anyhow::{Context, Result};
use clap::Parser;
use intake_config::{load_config, Settings};
use intake_core::{ApplicationCoordinator, SlotReservationEngine};
use intake_store::{SqliteStore, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// intaked - Interview slot booking service
#[derive(Parser, Debug)]
#[command(name = "intaked")]
#[command(about = "Interview slot booking service", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/intaked/config.toml")]
    config: PathBuf,

    /// Data directory override (or set INTAKE_DATA_DIR env var)
    #[arg(short, long, env = "INTAKE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: SlotReservationEngine,
    coordinator: ApplicationCoordinator,
    store: Arc<dyn Store>,
    settings: Settings,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            ttl_secs = settings.reservation_ttl.as_secs(),
            sweep_period_secs = settings.sweep_period.as_secs(),
            "Configuration loaded"
        );

        let data_dir = args.data_dir.clone().unwrap_or_else(|| settings.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("intaked.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let engine = SlotReservationEngine::new(store.clone(), settings.reservation_ttl);
        let coordinator = ApplicationCoordinator::new(
            store.clone(),
            engine.clone(),
            settings.max_candidate_slots,
        );

        let service = Self {
            engine,
            coordinator,
            store,
            settings,
        };
        service.seed_slots()?;

        Ok(service)
    }

    /// Install configured seed slots on first start (empty slot table only)
    fn seed_slots(&self) -> Result<()> {
        if self.settings.seed_slots.is_empty() || self.store.slot_count()? > 0 {
            return Ok(());
        }

        for seed in &self.settings.seed_slots {
            self.engine
                .create_slot(seed.date, seed.time, seed.modality)
                .context("Failed to seed slot")?;
        }

        info!(count = self.settings.seed_slots.len(), "Seed slots installed");
        Ok(())
    }

    async fn run(self) -> Result<()> {
        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        // Catch up on reservations that expired while we were down
        let swept = self.engine.sweep_expired(intake_util::now())?;
        let applications = self.coordinator.list()?.len();
        info!(
            swept_on_start = swept,
            applications,
            slots = self.store.slot_count()?,
            "Service running"
        );

        let mut sweep_timer = tokio::time::interval(self.settings.sweep_period);
        // The startup sweep covered the first tick
        sweep_timer.tick().await;

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                // Periodic expiry sweep - the eager half of reservation
                // expiry; reserve/list sweep lazily on top of this
                _ = sweep_timer.tick() => {
                    match self.engine.sweep_expired(intake_util::now()) {
                        Ok(0) => {}
                        Ok(cleared) => info!(cleared, "Expired reservations swept"),
                        Err(e) => warn!(error = %e, "Expiry sweep failed"),
                    }
                }
            }
        }

        info!("Shutdown complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting intaked");

    let service = Service::new(&args)?;
    service.run().await
}
