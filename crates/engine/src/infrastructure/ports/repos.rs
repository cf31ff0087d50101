//! Storage port for character documents.

use async_trait::async_trait;
use tavern_domain::{CharacterDocument, UserKey};

use super::error::RepoError;

// =============================================================================
// Document Storage
// =============================================================================

/// Whole-document persistence keyed by user.
///
/// `save` fully replaces the previous content. A concurrent `load` for the
/// same key observes either the old or the new document, never a mix.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fails with `NotFound` when nothing is stored, `Corrupt` when the
    /// stored text does not parse.
    async fn load(&self, key: &UserKey) -> Result<CharacterDocument, RepoError>;

    /// Return the stored document, or persist and return `default`.
    async fn load_or_create(
        &self,
        key: &UserKey,
        default: CharacterDocument,
    ) -> Result<CharacterDocument, RepoError>;

    async fn save(&self, key: &UserKey, document: &CharacterDocument) -> Result<(), RepoError>;

    async fn exists(&self, key: &UserKey) -> Result<bool, RepoError>;
}
