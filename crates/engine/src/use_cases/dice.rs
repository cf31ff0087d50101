//! Dice rolling use case.

use std::sync::Arc;

use tavern_domain::{DiceFormula, DiceRoll};

use crate::entities::SheetError;
use crate::infrastructure::ports::RandomPort;

/// Container for dice use cases. Touches no sheet.
pub struct DiceUseCases {
    random: Arc<dyn RandomPort>,
}

impl DiceUseCases {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    /// Parse and roll an expression like "2d6+3".
    pub fn evaluate(&self, expression: &str) -> Result<DiceRoll, SheetError> {
        let roll = DiceFormula::evaluate(expression, |min, max| self.random.gen_range(min, max))
            .map_err(|e| {
                tracing::debug!(expression = %expression, error = %e, "Rejected dice expression");
                SheetError::from(e)
            })?;

        tracing::debug!(formula = %roll.formula, total = roll.total, "Rolled dice");
        Ok(roll)
    }
}
