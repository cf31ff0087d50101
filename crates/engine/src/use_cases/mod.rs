//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area. Sheet-touching
//! use cases run one locked load, mutate, save cycle per call.

pub mod attributes;
pub mod dice;
pub mod ledger;
pub mod sheet_transfer;
pub mod vitality;

pub use attributes::{AttributeChange, AttributeUseCases};
pub use dice::DiceUseCases;
pub use ledger::LedgerUseCases;
pub use sheet_transfer::{ImportOutcome, SheetTransferUseCases};
pub use vitality::VitalityUseCases;
