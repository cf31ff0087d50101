//! File-backed DocumentStore implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tavern_domain::{CharacterDocument, UserKey};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::infrastructure::ports::{DocumentStore, RepoError};

/// Extension of every stored sheet.
pub const DOCUMENT_EXTENSION: &str = "json";

const ENTITY: &str = "CharacterDocument";

/// Render a document as JSON with four-space indentation.
pub fn encode_document(document: &CharacterDocument) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse document text. The top level must be a JSON object.
pub fn decode_document(text: &str) -> Result<CharacterDocument, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parse stored document bytes. Invalid UTF-8 is a decode error like any other.
pub fn decode_document_bytes(bytes: &[u8]) -> Result<CharacterDocument, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Stores each user's sheet as `<base_dir>/<user_key>.json`.
///
/// Writes go to a uniquely named temp file in the same directory, are
/// flushed to disk, and then renamed over the target, so readers never see
/// a partial document and a failed write leaves the old one in place.
pub struct FileDocumentStore {
    base_dir: PathBuf,
}

impl FileDocumentStore {
    /// The directory is created lazily on first save.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the path to a user's document.
    pub fn document_path(&self, key: &UserKey) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", key.as_str(), DOCUMENT_EXTENSION))
    }

    fn temp_path(&self, key: &UserKey) -> PathBuf {
        self.base_dir
            .join(format!(".{}.{}.tmp", key.as_str(), Uuid::new_v4()))
    }

    async fn read_existing(&self, key: &UserKey) -> Result<Option<CharacterDocument>, RepoError> {
        let path = self.document_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::io("read_document", e)),
        };

        let document = decode_document_bytes(&bytes).map_err(|e| {
            tracing::warn!(
                user_key = %key,
                path = %path.display(),
                error = %e,
                "Stored character document is corrupt"
            );
            RepoError::corrupt(key, e)
        })?;

        tracing::debug!(user_key = %key, path = %path.display(), "Loaded character document");
        Ok(Some(document))
    }

    async fn write_atomic(&self, key: &UserKey, text: &str) -> Result<(), RepoError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| RepoError::io("create_dir", e))?;

        let path = self.document_path(key);
        let temp_path = self.temp_path(key);

        if let Err(e) = write_and_sync(&temp_path, text).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(RepoError::io("write_temp", e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(RepoError::io("rename", e));
        }

        tracing::debug!(user_key = %key, path = %path.display(), "Saved character document");
        Ok(())
    }
}

async fn write_and_sync(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, key: &UserKey) -> Result<CharacterDocument, RepoError> {
        self.read_existing(key)
            .await?
            .ok_or_else(|| RepoError::not_found(ENTITY, key))
    }

    async fn load_or_create(
        &self,
        key: &UserKey,
        default: CharacterDocument,
    ) -> Result<CharacterDocument, RepoError> {
        if let Some(document) = self.read_existing(key).await? {
            return Ok(document);
        }
        self.save(key, &default).await?;
        tracing::info!(user_key = %key, "Created character document");
        Ok(default)
    }

    async fn save(&self, key: &UserKey, document: &CharacterDocument) -> Result<(), RepoError> {
        let text = encode_document(document).map_err(RepoError::serialization)?;
        self.write_atomic(key, &text).await
    }

    async fn exists(&self, key: &UserKey) -> Result<bool, RepoError> {
        tokio::fs::try_exists(self.document_path(key))
            .await
            .map_err(|e| RepoError::io("exists", e))
    }
}
