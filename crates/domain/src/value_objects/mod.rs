//! Value objects - Immutable objects defined by their attributes

mod currency;
mod dice;
mod vitality;

pub use currency::{apply_transaction, get_balance, Denomination, LedgerSummary, Purse};
pub use dice::{DiceFormula, DiceParseError, DiceRoll, MAX_DICE};
pub use vitality::{
    apply_hp_delta, long_rest, set_temporary_hp, short_rest_available, spend_hit_dice, HitDice,
    HitDiceAvailability, HitDiceSpend, HitPoints, HpChange, LongRestOutcome, TemporaryHpUpdate,
};
