//! Hit points, temporary hit points and the hit-dice pool
//!
//! Rules enforced here:
//! - Healing never raises `current` above `max`.
//! - Damage is absorbed by `temporary` first; `current` has no floor.
//! - Temporary HP does not stack: a new value applies only when it is
//!   strictly greater than the old one.
//! - A hit-dice spend larger than the remaining pool is rejected before
//!   any field changes.
//! - A long rest restores HP to max, clears temporary HP and returns
//!   half the pool (at least one die).

use serde::{Deserialize, Serialize};

use crate::value_objects::DiceFormula;
use crate::{CharacterDocument, DomainError};

const HP_CURRENT: &str = "hit_points.current";
const HP_MAX: &str = "hit_points.max";
const HP_TEMPORARY: &str = "hit_points.temporary";
const HD_SECTION: &str = "hit_dice";
const HD_TOTAL: &str = "hit_dice.total";
const HD_SPENT: &str = "hit_dice.spent";
const HD_DIE_TYPE: &str = "hit_dice.die_type";
const CON_MOD: &str = "ability_modifiers.constitution_mod";

/// Current, maximum and temporary hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i64,
    pub max: i64,
    pub temporary: i64,
}

impl HitPoints {
    /// Read from a document. `temporary` defaults to zero.
    pub fn read(doc: &CharacterDocument) -> Result<Self, DomainError> {
        Ok(Self {
            current: doc.required_int(HP_CURRENT)?,
            max: doc.required_int(HP_MAX)?,
            temporary: doc.optional_int(HP_TEMPORARY)?.unwrap_or(0),
        })
    }

    pub fn write(&self, doc: &mut CharacterDocument) -> Result<(), DomainError> {
        doc.put_int(HP_CURRENT, self.current)?;
        doc.put_int(HP_TEMPORARY, self.temporary)?;
        Ok(())
    }

    /// Heal by `amount`, clamped to `max`. Returns HP actually gained.
    ///
    /// A character already above max (via direct edit) keeps their HP.
    pub fn heal(&mut self, amount: i64) -> i64 {
        if amount <= 0 || self.current >= self.max {
            return 0;
        }
        let healed = self.current.saturating_add(amount).min(self.max);
        let gained = healed - self.current;
        self.current = healed;
        gained
    }

    /// Take `amount` damage. Returns `(absorbed_by_temporary, taken_by_current)`.
    pub fn damage(&mut self, amount: i64) -> (i64, i64) {
        let absorbed = amount.min(self.temporary.max(0));
        self.temporary -= absorbed;
        let remaining = amount - absorbed;
        self.current = self.current.saturating_sub(remaining);
        (absorbed, remaining)
    }
}

/// The hit-dice pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDice {
    pub total: i64,
    pub spent: i64,
    pub die_type: String,
}

impl HitDice {
    /// Read from a document. `spent` defaults to zero.
    pub fn read(doc: &CharacterDocument) -> Result<Self, DomainError> {
        Ok(Self {
            total: doc.required_int(HD_TOTAL)?,
            spent: doc.optional_int(HD_SPENT)?.unwrap_or(0),
            die_type: doc.required_str(HD_DIE_TYPE)?.to_string(),
        })
    }

    /// Read the pool if the sheet tracks one.
    pub fn read_optional(doc: &CharacterDocument) -> Result<Option<Self>, DomainError> {
        if doc.has_section(HD_SECTION) {
            Self::read(doc).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn write(&self, doc: &mut CharacterDocument) -> Result<(), DomainError> {
        doc.put_int(HD_SPENT, self.spent)
    }

    /// Dice left in the pool. Saturates for out-of-range hand-edited values.
    pub fn available(&self) -> i64 {
        self.total.saturating_sub(self.spent)
    }

    /// Faces on one die, from text like "d8".
    pub fn die_size(&self) -> Result<u32, DomainError> {
        let trimmed = self.die_type.trim();
        trimmed
            .strip_prefix('d')
            .or_else(|| trimmed.strip_prefix('D'))
            .and_then(|size| size.parse::<u32>().ok())
            .filter(|size| *size >= 1)
            .ok_or_else(|| DomainError::malformed(HD_DIE_TYPE, "die like 'd8'"))
    }

    /// Dice returned by a long rest: half the pool, at least one.
    pub fn long_rest_allowance(&self) -> i64 {
        (self.total.div_euclid(2)).max(1)
    }
}

/// Outcome of a heal or damage delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpChange {
    pub delta: i64,
    pub previous: HitPoints,
    pub current: i64,
    pub temporary: i64,
    /// HP gained by healing
    pub healed: i64,
    /// Damage soaked by temporary HP
    pub absorbed: i64,
    /// Damage that reached current HP
    pub damage_taken: i64,
}

/// Outcome of a temporary HP grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryHpUpdate {
    pub applied: bool,
    pub attempted: i64,
    pub temporary: i64,
}

/// Outcome of spending hit dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDiceSpend {
    pub rolls: Vec<i32>,
    pub constitution_bonus: i64,
    /// Sum of rolls plus the constitution bonus per die
    pub healed_total: i64,
    /// HP actually gained after clamping to max
    pub hp_gained: i64,
    pub spent: i64,
    pub current: i64,
}

/// Hit dice left for a short rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDiceAvailability {
    pub available: i64,
    pub total: i64,
    pub die_type: String,
}

/// Outcome of a long rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongRestOutcome {
    pub current: i64,
    pub temporary: i64,
    /// Dice actually returned to the pool
    pub dice_recovered: i64,
    /// Spent dice after the rest, `None` when the sheet has no pool
    pub spent: Option<i64>,
}

/// Heal (`delta > 0`) or damage (`delta <= 0`) a character.
pub fn apply_hp_delta(doc: &mut CharacterDocument, delta: i64) -> Result<HpChange, DomainError> {
    let previous = HitPoints::read(doc)?;
    let mut hp = previous;
    let (healed, absorbed, damage_taken) = if delta > 0 {
        (hp.heal(delta), 0, 0)
    } else {
        let (absorbed, taken) = hp.damage(delta.saturating_neg());
        (0, absorbed, taken)
    };
    hp.write(doc)?;
    Ok(HpChange {
        delta,
        previous,
        current: hp.current,
        temporary: hp.temporary,
        healed,
        absorbed,
        damage_taken,
    })
}

/// Grant temporary HP. Only a strictly larger value replaces the old one.
pub fn set_temporary_hp(
    doc: &mut CharacterDocument,
    amount: i64,
) -> Result<TemporaryHpUpdate, DomainError> {
    if amount < 0 {
        return Err(DomainError::InvalidAmount(amount));
    }
    let mut hp = HitPoints::read(doc)?;
    let applied = amount > hp.temporary;
    if applied {
        hp.temporary = amount;
        hp.write(doc)?;
    }
    Ok(TemporaryHpUpdate {
        applied,
        attempted: amount,
        temporary: hp.temporary,
    })
}

/// Spend `count` hit dice, healing by the rolls plus constitution per die.
pub fn spend_hit_dice<R>(
    doc: &mut CharacterDocument,
    count: i64,
    rng: R,
) -> Result<HitDiceSpend, DomainError>
where
    R: FnMut(i32, i32) -> i32,
{
    if count < 1 {
        return Err(DomainError::InvalidAmount(count));
    }
    let mut hp = HitPoints::read(doc)?;
    let mut dice = HitDice::read(doc)?;
    let constitution_mod = doc.optional_int(CON_MOD)?.unwrap_or(0);

    let available = dice.available();
    if count > available {
        return Err(DomainError::InsufficientResource {
            requested: count,
            available,
        });
    }

    let die_size = dice.die_size()?;
    let dice_count = u32::try_from(count).map_err(|_| DomainError::InvalidAmount(count))?;
    let rolls = DiceFormula::roll_dice(dice_count, die_size, rng)?;
    let constitution_bonus = count.saturating_mul(constitution_mod);
    let healed_total = rolls
        .iter()
        .map(|roll| i64::from(*roll))
        .sum::<i64>()
        .saturating_add(constitution_bonus);

    let hp_gained = hp.heal(healed_total);
    dice.spent = dice.spent.saturating_add(count);
    hp.write(doc)?;
    dice.write(doc)?;

    Ok(HitDiceSpend {
        rolls,
        constitution_bonus,
        healed_total,
        hp_gained,
        spent: dice.spent,
        current: hp.current,
    })
}

/// Hit dice left to spend. Pure read.
pub fn short_rest_available(doc: &CharacterDocument) -> Result<HitDiceAvailability, DomainError> {
    let dice = HitDice::read(doc)?;
    Ok(HitDiceAvailability {
        available: dice.available(),
        total: dice.total,
        die_type: dice.die_type,
    })
}

/// Full HP, no temporary HP, and half the hit-dice pool back.
pub fn long_rest(doc: &mut CharacterDocument) -> Result<LongRestOutcome, DomainError> {
    let mut hp = HitPoints::read(doc)?;
    let mut dice = HitDice::read_optional(doc)?;

    hp.current = hp.max;
    hp.temporary = 0;

    let mut dice_recovered = 0;
    if let Some(dice) = dice.as_mut() {
        let new_spent = dice.spent.saturating_sub(dice.long_rest_allowance()).max(0);
        dice_recovered = dice.spent.saturating_sub(new_spent).max(0);
        dice.spent = new_spent;
    }

    hp.write(doc)?;
    if let Some(dice) = dice.as_ref() {
        dice.write(doc)?;
    }

    Ok(LongRestOutcome {
        current: hp.current,
        temporary: hp.temporary,
        dice_recovered,
        spent: dice.map(|dice| dice.spent),
    })
}
