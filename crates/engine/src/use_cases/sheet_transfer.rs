//! Whole-sheet import and export.

use std::sync::Arc;

use serde::Serialize;
use tavern_domain::UserKey;

use crate::entities::{CharacterSheets, SheetError};
use crate::infrastructure::file_store::{decode_document, encode_document};

/// Result of importing a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    /// Whether an existing sheet was overwritten
    pub replaced: bool,
    /// Number of top-level sections in the imported sheet
    pub sections: usize,
}

/// Container for import/export use cases.
pub struct SheetTransferUseCases {
    sheets: Arc<CharacterSheets>,
}

impl SheetTransferUseCases {
    pub fn new(sheets: Arc<CharacterSheets>) -> Self {
        Self { sheets }
    }

    /// Replace the user's sheet with `raw` JSON.
    ///
    /// The payload is validated before anything is locked or written, so
    /// malformed input never disturbs the existing sheet.
    pub async fn import_raw(&self, key: &UserKey, raw: &str) -> Result<ImportOutcome, SheetError> {
        let document = decode_document(raw).map_err(|e| {
            tracing::warn!(user_key = %key, error = %e, "Rejected sheet import");
            SheetError::InvalidFormat(e.to_string())
        })?;

        let replaced = self.sheets.replace(key, &document).await?;

        let outcome = ImportOutcome {
            replaced,
            sections: document.root().len(),
        };
        tracing::info!(
            user_key = %key,
            replaced = outcome.replaced,
            sections = outcome.sections,
            "Imported character sheet"
        );
        Ok(outcome)
    }

    /// The stored sheet as pretty-printed JSON.
    pub async fn export_raw(&self, key: &UserKey) -> Result<String, SheetError> {
        let document = self.sheets.load(key).await?;
        encode_document(&document).map_err(|e| SheetError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::file_store::FileDocumentStore;
    use crate::infrastructure::ports::{DocumentStore, MockDocumentStore};
    use crate::stores::SheetLocks;
    use tavern_domain::{AttributePath, CharacterDocument, SheetValue};
    use tempfile::TempDir;

    fn transfer_with(store: Arc<dyn DocumentStore>) -> SheetTransferUseCases {
        transfer_sharing(store, Arc::new(SheetLocks::new()))
    }

    fn transfer_sharing(
        store: Arc<dyn DocumentStore>,
        locks: Arc<SheetLocks>,
    ) -> SheetTransferUseCases {
        SheetTransferUseCases::new(Arc::new(CharacterSheets::new(store, locks)))
    }

    #[tokio::test]
    async fn import_then_export_preserves_content() {
        let dir = TempDir::new().unwrap();
        let transfer = transfer_with(Arc::new(FileDocumentStore::new(dir.path())));
        let key = UserKey::from(11_u64);

        let raw = r#"{"name": "Brom", "hit_points": {"current": 9, "max": 12}, "tags": ["dwarf", true, null], "speed": 7.5}"#;
        let outcome = transfer.import_raw(&key, raw).await.unwrap();
        assert_eq!(
            outcome,
            ImportOutcome {
                replaced: false,
                sections: 4
            }
        );

        let exported = transfer.export_raw(&key).await.unwrap();
        let imported: serde_json::Value = serde_json::from_str(raw).unwrap();
        let round_tripped: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(imported, round_tripped);
        assert!(exported.contains("\n    \"hit_points\""));
    }

    #[tokio::test]
    async fn invalid_import_leaves_existing_sheet() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileDocumentStore::new(dir.path()));
        let key = UserKey::from(11_u64);
        let mut existing = CharacterDocument::new();
        existing
            .set(&AttributePath::parse("level").unwrap(), SheetValue::Integer(4))
            .unwrap();
        store.save(&key, &existing).await.unwrap();

        let transfer = transfer_with(store.clone());
        for raw in ["{ broken", "[1, 2]", "\"just text\""] {
            let err = transfer.import_raw(&key, raw).await.unwrap_err();
            assert!(matches!(err, SheetError::InvalidFormat(_)), "{raw}");
        }
        assert_eq!(store.load(&key).await.unwrap(), existing);
    }

    #[tokio::test]
    async fn valid_import_replaces_existing_sheet() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileDocumentStore::new(dir.path()));
        let key = UserKey::from(11_u64);
        store
            .save(&key, &CharacterDocument::with_empty_purse())
            .await
            .unwrap();

        let outcome = transfer_with(store.clone())
            .import_raw(&key, r#"{"level": 2}"#)
            .await
            .unwrap();
        assert!(outcome.replaced);

        let stored = store.load(&key).await.unwrap();
        assert!(!stored.root().contains_key("currency"));
    }

    #[tokio::test]
    async fn invalid_import_never_touches_storage() {
        let mut store = MockDocumentStore::new();
        store.expect_exists().never();
        store.expect_save().never();

        let err = transfer_with(Arc::new(store))
            .import_raw(&UserKey::from(1_u64), "not json")
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn export_without_sheet_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = transfer_with(Arc::new(FileDocumentStore::new(dir.path())))
            .export_raw(&UserKey::from(5_u64))
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::CharacterNotFound(_)));
    }

    #[tokio::test]
    async fn replaced_flag_sees_sheet_written_while_waiting_for_lock() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileDocumentStore::new(dir.path()));
        let locks = Arc::new(SheetLocks::new());
        let key = UserKey::from(12_u64);

        let guard = locks.acquire(&key).await;
        let import = {
            let transfer = transfer_sharing(store.clone(), locks.clone());
            let key = key.clone();
            tokio::spawn(async move { transfer.import_raw(&key, r#"{"level": 1}"#).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!import.is_finished());
        store
            .save(&key, &CharacterDocument::with_empty_purse())
            .await
            .unwrap();
        drop(guard);

        let outcome = import.await.unwrap().unwrap();
        assert!(outcome.replaced);
        assert!(!store.load(&key).await.unwrap().root().contains_key("currency"));
    }
}
