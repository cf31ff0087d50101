//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Document storage (could swap files -> a database)
//! - Clock/Random (for testing)

mod error;
mod repos;
mod testing;

pub use error::RepoError;
pub use repos::DocumentStore;
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use repos::MockDocumentStore;
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
