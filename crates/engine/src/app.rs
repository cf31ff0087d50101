//! Application state and composition.

use std::sync::Arc;

use crate::entities::CharacterSheets;
use crate::infrastructure::{
    clock::{SeededRandom, SystemClock, SystemRandom},
    config::EngineConfig,
    file_store::FileDocumentStore,
    ports::{ClockPort, DocumentStore, RandomPort},
    rate_limit::RateLimiter,
};
use crate::stores::SheetLocks;
use crate::use_cases;

/// Main application state.
///
/// Built once at startup and handed to the command layer.
pub struct App {
    pub config: EngineConfig,
    pub use_cases: UseCases,
    pub rate_limits: RateLimits,
    pub sheet_locks: Arc<SheetLocks>,
}

/// Container for all use cases.
pub struct UseCases {
    pub ledger: use_cases::LedgerUseCases,
    pub vitality: use_cases::VitalityUseCases,
    pub attributes: use_cases::AttributeUseCases,
    pub dice: use_cases::DiceUseCases,
    pub transfer: use_cases::SheetTransferUseCases,
}

/// Per-user limiters for the two inbound message kinds.
pub struct RateLimits {
    pub commands: RateLimiter,
    pub mentions: RateLimiter,
}

impl App {
    /// Create a new App backed by files under `config.characters_dir`.
    pub fn new(config: EngineConfig) -> Self {
        let store: Arc<dyn DocumentStore> =
            Arc::new(FileDocumentStore::new(config.characters_dir.clone()));
        let random: Arc<dyn RandomPort> = match config.dice_seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(SystemRandom::new()),
        };
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        Self::with_ports(config, store, random, clock)
    }

    /// Create an App from explicit port implementations.
    pub fn with_ports(
        config: EngineConfig,
        store: Arc<dyn DocumentStore>,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let sheet_locks = Arc::new(SheetLocks::new());
        let sheets = Arc::new(CharacterSheets::new(store, sheet_locks.clone()));

        let use_cases = UseCases {
            ledger: use_cases::LedgerUseCases::new(sheets.clone()),
            vitality: use_cases::VitalityUseCases::new(sheets.clone(), random.clone()),
            attributes: use_cases::AttributeUseCases::new(sheets.clone()),
            dice: use_cases::DiceUseCases::new(random),
            transfer: use_cases::SheetTransferUseCases::new(sheets),
        };

        let rate_limits = RateLimits {
            commands: RateLimiter::new(config.command_rate_limit, clock.clone()),
            mentions: RateLimiter::new(config.mention_rate_limit, clock),
        };

        tracing::info!(
            characters_dir = %config.characters_dir.display(),
            command_limit = config.command_rate_limit.max_requests,
            mention_limit = config.mention_rate_limit.max_requests,
            "Engine composed"
        );

        Self {
            config,
            use_cases,
            rate_limits,
            sheet_locks,
        }
    }
}
