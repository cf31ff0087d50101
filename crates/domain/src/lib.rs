//! Tavern domain
//!
//! Pure rules for character sheets: the attribute tree, the coin ledger,
//! hit points and hit dice, and dice notation. Nothing here performs I/O;
//! randomness comes in as a `(min, max) -> value` closure.

pub mod character_sheet;
pub mod error;
pub mod ids;
pub mod types;
pub mod value_objects;

pub use character_sheet::{AttributePath, CharacterDocument};
pub use error::DomainError;
pub use ids::UserKey;
pub use types::SheetValue;

// Re-export value objects (explicit list in value_objects/mod.rs)
pub use value_objects::{
    apply_hp_delta, apply_transaction, get_balance, long_rest, set_temporary_hp,
    short_rest_available, spend_hit_dice, Denomination, DiceFormula, DiceParseError, DiceRoll,
    HitDice, HitDiceAvailability, HitDiceSpend, HitPoints, HpChange, LedgerSummary,
    LongRestOutcome, Purse, TemporaryHpUpdate, MAX_DICE,
};
