//! Coin ledger use cases.

use std::sync::Arc;

use tavern_domain::{self as domain, CharacterDocument, Denomination, LedgerSummary, Purse, UserKey};

use crate::entities::{CharacterSheets, SheetError};

/// Container for ledger use cases.
pub struct LedgerUseCases {
    sheets: Arc<CharacterSheets>,
}

impl LedgerUseCases {
    pub fn new(sheets: Arc<CharacterSheets>) -> Self {
        Self { sheets }
    }

    /// Deposit (positive) or withdraw (negative) coins.
    ///
    /// The first coin operation creates the user's sheet. A rejected
    /// withdrawal leaves storage untouched, including for a new user.
    pub async fn apply_transaction(
        &self,
        key: &UserKey,
        amount: i64,
        denomination_code: &str,
    ) -> Result<LedgerSummary, SheetError> {
        let denomination: Denomination = denomination_code.parse()?;
        let summary = self
            .sheets
            .update_or_create(key, CharacterDocument::with_empty_purse(), |doc| {
                domain::apply_transaction(doc, amount, denomination)
            })
            .await?;

        tracing::debug!(
            user_key = %key,
            amount = amount,
            denomination = %denomination,
            delta_cp = summary.delta_cp,
            "Applied coin transaction"
        );
        Ok(summary)
    }

    /// Current purse; creates a zeroed sheet for a new user.
    pub async fn get_balance(&self, key: &UserKey) -> Result<Purse, SheetError> {
        let document = self
            .sheets
            .load_or_create(key, CharacterDocument::with_empty_purse())
            .await?;
        Ok(domain::get_balance(&document)?)
    }
}
