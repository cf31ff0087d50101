//! Character sheet entity operations.

use std::sync::Arc;

use tavern_domain::{CharacterDocument, DomainError, UserKey};

use crate::entities::SheetError;
use crate::infrastructure::ports::DocumentStore;
use crate::stores::SheetLocks;

/// Character sheet entity operations.
///
/// Wraps the document store with per-user locking. Every mutation is one
/// locked load, mutate, save cycle; a mutation that fails saves nothing.
pub struct CharacterSheets {
    store: Arc<dyn DocumentStore>,
    locks: Arc<SheetLocks>,
}

impl CharacterSheets {
    pub fn new(store: Arc<dyn DocumentStore>, locks: Arc<SheetLocks>) -> Self {
        Self { store, locks }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Load without locking. Saves are atomic, so this never sees a partial write.
    pub async fn load(&self, key: &UserKey) -> Result<CharacterDocument, SheetError> {
        self.store
            .load(key)
            .await
            .map_err(|e| SheetError::from_repo(key, e))
    }

    /// Load, persisting `default` first when the user has no sheet.
    pub async fn load_or_create(
        &self,
        key: &UserKey,
        default: CharacterDocument,
    ) -> Result<CharacterDocument, SheetError> {
        let _guard = self.locks.acquire(key).await;
        self.store
            .load_or_create(key, default)
            .await
            .map_err(|e| SheetError::from_repo(key, e))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Apply `mutate` to an existing sheet and save it.
    pub async fn update<T, F>(&self, key: &UserKey, mutate: F) -> Result<T, SheetError>
    where
        F: FnOnce(&mut CharacterDocument) -> Result<T, DomainError> + Send,
        T: Send,
    {
        let _guard = self.locks.acquire(key).await;
        let document = self.load(key).await?;
        self.apply_and_save(key, document, mutate).await
    }

    /// Apply `mutate` to the user's sheet, starting from `default` when none
    /// exists. The new sheet is only written if `mutate` succeeds.
    pub async fn update_or_create<T, F>(
        &self,
        key: &UserKey,
        default: CharacterDocument,
        mutate: F,
    ) -> Result<T, SheetError>
    where
        F: FnOnce(&mut CharacterDocument) -> Result<T, DomainError> + Send,
        T: Send,
    {
        let _guard = self.locks.acquire(key).await;
        let document = match self.store.load(key).await {
            Ok(document) => document,
            Err(e) if e.is_not_found() => default,
            Err(e) => return Err(SheetError::from_repo(key, e)),
        };
        self.apply_and_save(key, document, mutate).await
    }

    /// Overwrite the user's sheet wholesale. Returns whether one existed.
    pub async fn replace(
        &self,
        key: &UserKey,
        document: &CharacterDocument,
    ) -> Result<bool, SheetError> {
        let _guard = self.locks.acquire(key).await;
        let existed = self
            .store
            .exists(key)
            .await
            .map_err(|e| SheetError::from_repo(key, e))?;
        self.store
            .save(key, document)
            .await
            .map_err(|e| SheetError::from_repo(key, e))?;
        Ok(existed)
    }

    async fn apply_and_save<T, F>(
        &self,
        key: &UserKey,
        mut document: CharacterDocument,
        mutate: F,
    ) -> Result<T, SheetError>
    where
        F: FnOnce(&mut CharacterDocument) -> Result<T, DomainError> + Send,
        T: Send,
    {
        let outcome = mutate(&mut document).map_err(|e| {
            tracing::warn!(user_key = %key, error = %e, "Rejected character sheet update");
            SheetError::from(e)
        })?;
        self.store
            .save(key, &document)
            .await
            .map_err(|e| SheetError::from_repo(key, e))?;
        Ok(outcome)
    }
}
