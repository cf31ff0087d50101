//! Hit point and rest use cases.

use std::sync::Arc;

use tavern_domain::{
    self as domain, HitDiceAvailability, HitDiceSpend, HpChange, LongRestOutcome,
    TemporaryHpUpdate, UserKey,
};

use crate::entities::{CharacterSheets, SheetError};
use crate::infrastructure::ports::RandomPort;

/// Container for vitality use cases.
///
/// All operations need an existing sheet with a `hit_points` block.
pub struct VitalityUseCases {
    sheets: Arc<CharacterSheets>,
    random: Arc<dyn RandomPort>,
}

impl VitalityUseCases {
    pub fn new(sheets: Arc<CharacterSheets>, random: Arc<dyn RandomPort>) -> Self {
        Self { sheets, random }
    }

    /// Heal (`delta > 0`) or damage (`delta <= 0`).
    pub async fn apply_hp_delta(&self, key: &UserKey, delta: i64) -> Result<HpChange, SheetError> {
        let change = self
            .sheets
            .update(key, |doc| domain::apply_hp_delta(doc, delta))
            .await?;

        tracing::debug!(
            user_key = %key,
            delta = delta,
            current = change.current,
            temporary = change.temporary,
            "Applied hit point change"
        );
        Ok(change)
    }

    pub async fn set_temporary_hp(
        &self,
        key: &UserKey,
        amount: i64,
    ) -> Result<TemporaryHpUpdate, SheetError> {
        let update = self
            .sheets
            .update(key, |doc| domain::set_temporary_hp(doc, amount))
            .await?;

        tracing::debug!(
            user_key = %key,
            attempted = amount,
            applied = update.applied,
            "Set temporary hit points"
        );
        Ok(update)
    }

    /// Spend hit dice during a short rest.
    pub async fn spend_hit_dice(
        &self,
        key: &UserKey,
        count: i64,
    ) -> Result<HitDiceSpend, SheetError> {
        let random = self.random.clone();
        let spend = self
            .sheets
            .update(key, move |doc| {
                domain::spend_hit_dice(doc, count, |min, max| random.gen_range(min, max))
            })
            .await?;

        tracing::debug!(
            user_key = %key,
            count = count,
            healed = spend.healed_total,
            spent = spend.spent,
            "Spent hit dice"
        );
        Ok(spend)
    }

    /// Hit dice left to spend. Read only.
    pub async fn short_rest_available(
        &self,
        key: &UserKey,
    ) -> Result<HitDiceAvailability, SheetError> {
        let document = self.sheets.load(key).await?;
        Ok(domain::short_rest_available(&document)?)
    }

    pub async fn long_rest(&self, key: &UserKey) -> Result<LongRestOutcome, SheetError> {
        let outcome = self.sheets.update(key, domain::long_rest).await?;

        tracing::debug!(
            user_key = %key,
            current = outcome.current,
            dice_recovered = outcome.dice_recovered,
            "Completed long rest"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::ports::{MockDocumentStore, MockRandomPort, RepoError};
    use crate::stores::SheetLocks;
    use tavern_domain::{CharacterDocument, HitDice, HitPoints};

    fn sheet(json: &str) -> CharacterDocument {
        serde_json::from_str(json).unwrap()
    }

    fn wounded() -> CharacterDocument {
        sheet(
            r#"{
                "hit_points": {"current": 4, "max": 20, "temporary": 0},
                "hit_dice": {"total": 3, "spent": 0, "die_type": "d8"},
                "ability_modifiers": {"constitution_mod": 1}
            }"#,
        )
    }

    fn vitality(store: MockDocumentStore, random: Arc<dyn RandomPort>) -> VitalityUseCases {
        VitalityUseCases::new(
            Arc::new(CharacterSheets::new(
                Arc::new(store),
                Arc::new(SheetLocks::new()),
            )),
            random,
        )
    }

    #[tokio::test]
    async fn spend_hit_dice_rolls_through_random_port() {
        let mut store = MockDocumentStore::new();
        store.expect_load().returning(|_| Ok(wounded()));
        store
            .expect_save()
            .withf(|_, doc| {
                HitDice::read(doc).map(|d| d.spent).ok() == Some(2)
                    && HitPoints::read(doc).map(|hp| hp.current).ok() == Some(14)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut random = MockRandomPort::new();
        random
            .expect_gen_range()
            .withf(|min, max| *min == 1 && *max == 8)
            .times(2)
            .returning(|_, _| 4);

        let spend = vitality(store, Arc::new(random))
            .spend_hit_dice(&UserKey::from(1_u64), 2)
            .await
            .unwrap();
        assert_eq!(spend.rolls, vec![4, 4]);
        assert_eq!(spend.healed_total, 10);
        assert_eq!(spend.constitution_bonus, 2);
        assert_eq!(spend.current, 14);
    }

    #[tokio::test]
    async fn overspending_saves_nothing() {
        let mut store = MockDocumentStore::new();
        store.expect_load().returning(|_| Ok(wounded()));
        store.expect_save().never();

        let mut random = MockRandomPort::new();
        random.expect_gen_range().never();

        let err = vitality(store, Arc::new(random))
            .spend_hit_dice(&UserKey::from(1_u64), 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SheetError::InsufficientResource {
                requested: 4,
                available: 3
            }
        ));
    }

    #[tokio::test]
    async fn damage_without_sheet_is_not_found() {
        let mut store = MockDocumentStore::new();
        store
            .expect_load()
            .returning(|key| Err(RepoError::not_found("CharacterDocument", key)));
        store.expect_save().never();

        let err = vitality(store, Arc::new(FixedRandom(1)))
            .apply_hp_delta(&UserKey::from(1_u64), -5)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::CharacterNotFound(_)));
    }

    #[tokio::test]
    async fn negative_temporary_hp_is_invalid_amount() {
        let mut store = MockDocumentStore::new();
        store.expect_load().returning(|_| Ok(wounded()));
        store.expect_save().never();

        let err = vitality(store, Arc::new(FixedRandom(1)))
            .set_temporary_hp(&UserKey::from(1_u64), -2)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::InvalidAmount(-2)));
    }

    #[tokio::test]
    async fn short_rest_available_is_read_only() {
        let mut store = MockDocumentStore::new();
        store.expect_load().times(1).returning(|_| Ok(wounded()));
        store.expect_save().never();

        let availability = vitality(store, Arc::new(FixedRandom(1)))
            .short_rest_available(&UserKey::from(1_u64))
            .await
            .unwrap();
        assert_eq!(availability.available, 3);
        assert_eq!(availability.die_type, "d8");
    }

    #[tokio::test]
    async fn long_rest_restores_and_saves() {
        let mut store = MockDocumentStore::new();
        store.expect_load().returning(|_| Ok(wounded()));
        store
            .expect_save()
            .withf(|_, doc| HitPoints::read(doc).map(|hp| hp.current).ok() == Some(20))
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = vitality(store, Arc::new(FixedRandom(1)))
            .long_rest(&UserKey::from(1_u64))
            .await
            .unwrap();
        assert_eq!(outcome.current, 20);
        assert_eq!(outcome.dice_recovered, 0);
        assert_eq!(outcome.spent, Some(0));
    }
}
