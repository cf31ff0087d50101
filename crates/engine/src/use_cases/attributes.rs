//! Free-form attribute use cases.
//!
//! Paths are dot-separated and case-insensitive. Raw text is coerced once,
//! on write; there is no game-rule validation here.

use std::sync::Arc;

use serde::Serialize;
use tavern_domain::{AttributePath, SheetValue, UserKey};

use crate::entities::{CharacterSheets, SheetError};

/// Result of setting an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub path: String,
    /// Value stored after coercion
    pub value: SheetValue,
    /// Value replaced, if the path already held one
    pub previous: Option<SheetValue>,
}

/// Container for attribute use cases.
pub struct AttributeUseCases {
    sheets: Arc<CharacterSheets>,
}

impl AttributeUseCases {
    pub fn new(sheets: Arc<CharacterSheets>) -> Self {
        Self { sheets }
    }

    pub async fn get(&self, key: &UserKey, path: &str) -> Result<SheetValue, SheetError> {
        let path = AttributePath::parse(path)?;
        let document = self.sheets.load(key).await?;
        Ok(document.get(&path)?.clone())
    }

    pub async fn set(
        &self,
        key: &UserKey,
        path: &str,
        raw_value: &str,
    ) -> Result<AttributeChange, SheetError> {
        let path = AttributePath::parse(path)?;
        let value = SheetValue::coerce(raw_value);

        let stored = value.clone();
        let previous = self
            .sheets
            .update(key, |doc| doc.set(&path, stored))
            .await?;

        tracing::debug!(
            user_key = %key,
            path = %path,
            value_type = value.type_name(),
            "Set attribute"
        );
        Ok(AttributeChange {
            path: path.to_string(),
            value,
            previous,
        })
    }

    /// Remove the entry at `path`, returning what was there.
    pub async fn delete(&self, key: &UserKey, path: &str) -> Result<SheetValue, SheetError> {
        let path = AttributePath::parse(path)?;
        let removed = self.sheets.update(key, |doc| doc.delete(&path)).await?;

        tracing::debug!(user_key = %key, path = %path, "Deleted attribute");
        Ok(removed)
    }
}
