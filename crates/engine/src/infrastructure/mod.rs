//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod config;
pub mod file_store;
pub mod ports;
pub mod rate_limit;
