//! # Tavern Domain Types
//!
//! Shared vocabulary types that form the innermost layer of the engine.
//!
//! ## Design Principles
//!
//! 1. **Pure data types** - No I/O, no async, no side effects
//! 2. **Serializable** - All types derive Serialize/Deserialize

mod character_sheet;
pub use character_sheet::SheetValue;
