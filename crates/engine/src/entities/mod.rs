//! Entity modules wrapping domain operations.
//!
//! Each entity module provides a concrete type that encapsulates
//! operations on a domain object, using port traits for storage.

mod error;
mod sheet;

pub use error::{SheetError, SheetErrorKind};
pub use sheet::CharacterSheets;
