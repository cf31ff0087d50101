//! Dice notation parsing and rolling
//!
//! Supports formulas like "1d20", "2d6+3", "d8-1". Randomness is injected as
//! a closure `(min, max) -> value` with an inclusive range, so the arithmetic
//! here is deterministic under test.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upper bound on dice rolled by one expression.
pub const MAX_DICE: u32 = 1000;

/// Error when parsing or rolling a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// No 'd' between count and die size
    #[error("Missing 'd' separator in '{0}'")]
    MissingSeparator(String),
    /// Dice count is not a non-negative integer
    #[error("Invalid dice count: '{0}'")]
    InvalidCount(String),
    /// Die size is not a non-negative integer
    #[error("Invalid die size: '{0}'")]
    InvalidDieSize(String),
    /// Modifier is not a non-negative integer after its sign
    #[error("Invalid modifier: '{0}'")]
    InvalidModifier(String),
    /// More dice than a single roll allows
    #[error("Too many dice: {0} (max {max})", max = MAX_DICE)]
    TooManyDice(u32),
    /// Asked to roll zero dice
    #[error("Dice count must be at least 1")]
    NoDice,
    /// Asked to roll a die with no faces
    #[error("Die size must be at least 1")]
    NoSides,
}

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u32,
    /// Size of each die (Y in XdY)
    pub die_size: u32,
    /// Modifier to add/subtract after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Parse a dice formula string.
    ///
    /// Grammar: `[count] "d" size [("+" | "-") offset]`, all numbers
    /// non-negative. Whitespace is ignored and `D` is accepted. Only syntax
    /// is checked here; zero counts and sizes are rejected by [`Self::roll`].
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let (count_str, after_d) = input
            .split_once('d')
            .ok_or_else(|| DiceParseError::MissingSeparator(input.clone()))?;

        let dice_count: u32 = if count_str.is_empty() {
            1 // "d20" means "1d20"
        } else {
            count_str
                .parse()
                .map_err(|_| DiceParseError::InvalidCount(count_str.to_string()))?
        };
        if dice_count > MAX_DICE {
            return Err(DiceParseError::TooManyDice(dice_count));
        }

        let (die_str, modifier) = if let Some((die_str, mod_str)) = after_d.split_once('+') {
            (die_str, parse_offset(mod_str)?)
        } else if let Some((die_str, mod_str)) = after_d.split_once('-') {
            (die_str, -parse_offset(mod_str)?)
        } else {
            (after_d, 0)
        };

        let die_size: u32 = die_str
            .parse()
            .ok()
            .filter(|size| i32::try_from(*size).is_ok())
            .ok_or_else(|| DiceParseError::InvalidDieSize(die_str.to_string()))?;

        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Roll `count` dice of `die_size` faces.
    pub fn roll_dice<R>(count: u32, die_size: u32, mut rng: R) -> Result<Vec<i32>, DiceParseError>
    where
        R: FnMut(i32, i32) -> i32,
    {
        if count < 1 {
            return Err(DiceParseError::NoDice);
        }
        if count > MAX_DICE {
            return Err(DiceParseError::TooManyDice(count));
        }
        if die_size < 1 {
            return Err(DiceParseError::NoSides);
        }
        let max = i32::try_from(die_size)
            .map_err(|_| DiceParseError::InvalidDieSize(die_size.to_string()))?;
        Ok((0..count).map(|_| rng(1, max).clamp(1, max)).collect())
    }

    /// Roll this formula.
    pub fn roll<R>(&self, rng: R) -> Result<DiceRoll, DiceParseError>
    where
        R: FnMut(i32, i32) -> i32,
    {
        let rolls = Self::roll_dice(self.dice_count, self.die_size, rng)?;
        let dice_total: i64 = rolls.iter().map(|r| i64::from(*r)).sum();
        Ok(DiceRoll {
            formula: *self,
            total: dice_total + i64::from(self.modifier),
            modifier: self.modifier,
            rolls,
        })
    }

    /// Parse and roll in one step.
    pub fn evaluate<R>(expression: &str, rng: R) -> Result<DiceRoll, DiceParseError>
    where
        R: FnMut(i32, i32) -> i32,
    {
        Self::parse(expression)?.roll(rng)
    }
}

fn parse_offset(raw: &str) -> Result<i32, DiceParseError> {
    raw.parse::<u32>()
        .ok()
        .and_then(|value| i32::try_from(value).ok())
        .ok_or_else(|| DiceParseError::InvalidModifier(raw.to_string()))
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{}+{}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{}{}", self.dice_count, self.die_size, m),
        }
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die results
    pub rolls: Vec<i32>,
    /// Modifier that was applied
    pub modifier: i32,
    /// Final total (sum of rolls + modifier)
    pub total: i64,
}
