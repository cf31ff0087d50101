//! Tavern Engine library.
//!
//! Storage, locking and orchestration around the pure rules in `tavern-domain`.
//!
//! ## Structure
//!
//! - `entities/` - Character sheet access with per-user locking
//! - `use_cases/` - Ledger, vitality, attribute, dice and import/export operations
//! - `stores/` - In-memory runtime state (lock table)
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Line command entry point
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
