//! Coin purse and ledger arithmetic
//!
//! Balances are held canonically in copper. After every transaction the
//! purse is renormalized positionally: `sp` and `cp` stay in `0..=9` and
//! `gp` absorbs the rest, regardless of which coin the transaction used.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CharacterDocument, DomainError};

const CURRENCY: &str = "currency";

/// A coin unit with a fixed exchange rate to copper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Denomination {
    #[serde(rename = "gp")]
    Gold,
    #[serde(rename = "sp")]
    Silver,
    #[serde(rename = "cp")]
    Copper,
}

impl Denomination {
    /// Value of one coin in copper.
    pub fn copper_value(self) -> i64 {
        match self {
            Self::Gold => 100,
            Self::Silver => 10,
            Self::Copper => 1,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Gold => "gp",
            Self::Silver => "sp",
            Self::Copper => "cp",
        }
    }

    /// Convert a signed coin count to a copper delta.
    pub fn to_copper(self, amount: i64) -> Result<i64, DomainError> {
        amount
            .checked_mul(self.copper_value())
            .ok_or(DomainError::InvalidAmount(amount))
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Denomination {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gp" => Ok(Self::Gold),
            "sp" => Ok(Self::Silver),
            "cp" => Ok(Self::Copper),
            _ => Err(DomainError::UnknownDenomination(s.to_string())),
        }
    }
}

/// Gold, silver and copper held by a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purse {
    pub gp: i64,
    pub sp: i64,
    pub cp: i64,
}

impl Purse {
    pub fn new(gp: i64, sp: i64, cp: i64) -> Self {
        Self { gp, sp, cp }
    }

    /// Positional renormalization of a copper total.
    pub fn from_copper(total: i64) -> Self {
        let remainder = total.rem_euclid(100);
        Self {
            gp: total.div_euclid(100),
            sp: remainder / 10,
            cp: remainder % 10,
        }
    }

    pub fn total_copper(&self) -> Option<i64> {
        self.gp
            .checked_mul(100)?
            .checked_add(self.sp.checked_mul(10)?)?
            .checked_add(self.cp)
    }

    /// Read the purse from a document. Missing coins count as zero.
    pub fn read(doc: &CharacterDocument) -> Result<Self, DomainError> {
        if let Some(section) = doc.lookup_known(CURRENCY) {
            if !section.is_object() {
                return Err(DomainError::malformed(CURRENCY, "mapping"));
            }
        }
        Ok(Self {
            gp: doc.optional_int("currency.gp")?.unwrap_or(0),
            sp: doc.optional_int("currency.sp")?.unwrap_or(0),
            cp: doc.optional_int("currency.cp")?.unwrap_or(0),
        })
    }

    /// Write all three coins back into the document.
    pub fn write(&self, doc: &mut CharacterDocument) -> Result<(), DomainError> {
        doc.put_int("currency.gp", self.gp)?;
        doc.put_int("currency.sp", self.sp)?;
        doc.put_int("currency.cp", self.cp)?;
        Ok(())
    }
}

impl CharacterDocument {
    /// A fresh document with a zeroed purse, used when a user's first coin
    /// operation creates their sheet.
    pub fn with_empty_purse() -> Self {
        let mut doc = Self::new();
        // A fresh document has no conflicting sections.
        let _ = Purse::default().write(&mut doc);
        doc
    }
}

/// Structured record of one ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Signed coin count as requested
    pub amount: i64,
    /// Coin the amount was given in
    pub denomination: Denomination,
    /// Signed change in copper
    pub delta_cp: i64,
    /// Purse before the transaction
    pub previous: Purse,
    /// Purse after renormalization
    pub balance: Purse,
}

/// Apply a signed transaction to the document's purse.
///
/// Withdrawals larger than the total balance are rejected before anything
/// is written. Zero-amount transactions succeed and still renormalize.
pub fn apply_transaction(
    doc: &mut CharacterDocument,
    amount: i64,
    denomination: Denomination,
) -> Result<LedgerSummary, DomainError> {
    let delta_cp = denomination.to_copper(amount)?;
    let previous = Purse::read(doc)?;
    let total = previous
        .total_copper()
        .ok_or_else(|| DomainError::malformed(CURRENCY, "balance within range"))?;

    if delta_cp < 0 && delta_cp.unsigned_abs() > total.max(0).unsigned_abs() {
        return Err(DomainError::InsufficientFunds {
            requested_cp: delta_cp.saturating_neg(),
            available_cp: total,
        });
    }

    let new_total = total
        .checked_add(delta_cp)
        .ok_or(DomainError::InvalidAmount(amount))?;
    let balance = Purse::from_copper(new_total);
    balance.write(doc)?;

    Ok(LedgerSummary {
        amount,
        denomination,
        delta_cp,
        previous,
        balance,
    })
}

/// Current purse; zero when the sheet has no currency yet.
pub fn get_balance(doc: &CharacterDocument) -> Result<Purse, DomainError> {
    Purse::read(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributePath, SheetValue};

    fn doc_with(gp: i64, sp: i64, cp: i64) -> CharacterDocument {
        let mut doc = CharacterDocument::new();
        Purse::new(gp, sp, cp).write(&mut doc).unwrap();
        doc
    }

    #[test]
    fn test_parse_denomination() {
        assert_eq!("GP".parse::<Denomination>(), Ok(Denomination::Gold));
        assert_eq!("sp".parse::<Denomination>(), Ok(Denomination::Silver));
        assert!(matches!(
            "pp".parse::<Denomination>(),
            Err(DomainError::UnknownDenomination(_))
        ));
    }

    #[test]
    fn test_deposit_gold_equals_deposit_copper() {
        let mut a = doc_with(2, 3, 4);
        let mut b = doc_with(2, 3, 4);
        let by_gold = apply_transaction(&mut a, 1, Denomination::Gold).unwrap();
        let by_copper = apply_transaction(&mut b, 100, Denomination::Copper).unwrap();
        assert_eq!(by_gold.balance, by_copper.balance);
        assert_eq!(by_gold.balance, Purse::new(3, 3, 4));
    }

    #[test]
    fn test_renormalizes_overflow_into_gold() {
        let mut doc = doc_with(0, 9, 9);
        let summary = apply_transaction(&mut doc, 1, Denomination::Copper).unwrap();
        assert_eq!(summary.balance, Purse::new(1, 0, 0));
        assert_eq!(Purse::read(&doc).unwrap(), Purse::new(1, 0, 0));
    }

    #[test]
    fn test_withdraw_breaks_larger_coins() {
        let mut doc = doc_with(1, 0, 0);
        let summary = apply_transaction(&mut doc, -3, Denomination::Copper).unwrap();
        assert_eq!(summary.balance, Purse::new(0, 9, 7));
        assert_eq!(summary.delta_cp, -3);
    }

    #[test]
    fn test_round_trip_returns_to_previous_balance() {
        for (amount, denomination) in [
            (7, Denomination::Gold),
            (13, Denomination::Silver),
            (129, Denomination::Copper),
        ] {
            let mut doc = doc_with(4, 5, 6);
            apply_transaction(&mut doc, amount, denomination).unwrap();
            let copper = denomination.to_copper(amount).unwrap();
            apply_transaction(&mut doc, -copper, Denomination::Copper).unwrap();
            assert_eq!(Purse::read(&doc).unwrap(), Purse::new(4, 5, 6));
        }
    }

    #[test]
    fn test_overdraw_rejected_without_mutation() {
        let mut doc = doc_with(0, 5, 0);
        let before = doc.clone();
        let err = apply_transaction(&mut doc, -1, Denomination::Gold).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientFunds {
                requested_cp: 100,
                available_cp: 50
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_exact_withdrawal_empties_purse() {
        let mut doc = doc_with(0, 5, 0);
        let summary = apply_transaction(&mut doc, -5, Denomination::Silver).unwrap();
        assert_eq!(summary.balance, Purse::default());
    }

    #[test]
    fn test_zero_amount_is_noop_with_summary() {
        let mut doc = doc_with(1, 2, 3);
        let summary = apply_transaction(&mut doc, 0, Denomination::Silver).unwrap();
        assert_eq!(summary.delta_cp, 0);
        assert_eq!(summary.previous, summary.balance);
    }

    #[test]
    fn test_unnormalized_stored_purse_is_renormalized() {
        let mut doc = doc_with(0, 25, 31);
        let summary = apply_transaction(&mut doc, 0, Denomination::Copper).unwrap();
        assert_eq!(summary.balance, Purse::new(2, 8, 1));
    }

    #[test]
    fn test_balance_defaults_to_zero() {
        let doc = CharacterDocument::new();
        assert_eq!(get_balance(&doc).unwrap(), Purse::default());
    }

    #[test]
    fn test_first_transaction_creates_currency_section() {
        let mut doc = CharacterDocument::new();
        apply_transaction(&mut doc, 2, Denomination::Silver).unwrap();
        let path = AttributePath::parse("currency.sp").unwrap();
        assert_eq!(doc.get(&path), Ok(&SheetValue::Integer(2)));
    }

    #[test]
    fn test_scalar_currency_is_malformed() {
        let mut doc = CharacterDocument::new();
        doc.set(&AttributePath::parse("currency").unwrap(), SheetValue::Integer(5))
            .unwrap();
        assert!(matches!(
            apply_transaction(&mut doc, 1, Denomination::Gold),
            Err(DomainError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_with_empty_purse() {
        let doc = CharacterDocument::with_empty_purse();
        assert_eq!(Purse::read(&doc).unwrap(), Purse::default());
        assert!(doc.root().contains_key("currency"));
    }
}
