//! Character documents and dot-path addressing
//!
//! A [`CharacterDocument`] is the persisted sheet for one user: an untyped
//! tree of [`SheetValue`]s rooted at a mapping. Well-known substructures
//! (`currency`, `hit_points`, `hit_dice`) are read through typed views in
//! `value_objects`; everything else is reached with dot paths such as
//! `skills.athletics`.
//!
//! # Path rules
//!
//! - Segments are separated by `.` and matched case-insensitively.
//! - New keys are stored lower-cased.
//! - `set` creates missing intermediate mappings but refuses to walk
//!   through a scalar ([`DomainError::PathConflict`]).
//! - `get` reports [`DomainError::AttributeNotFound`] when the walk hits a
//!   missing key or a scalar before the path is exhausted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DomainError, SheetValue};

/// A dot-separated, case-insensitive attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    raw: String,
    segments: Vec<String>,
    last: String,
}

impl AttributePath {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidPath(raw.to_string()));
        }
        let segments: Vec<String> = trimmed
            .split('.')
            .map(|segment| segment.trim().to_lowercase())
            .collect();
        let last = match segments.last() {
            Some(last) if segments.iter().all(|segment| !segment.is_empty()) => last.clone(),
            _ => return Err(DomainError::InvalidPath(raw.to_string())),
        };
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
            last,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn split_last(&self) -> (&[String], &String) {
        (&self.segments[..self.segments.len() - 1], &self.last)
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Find the stored key matching `segment` case-insensitively.
fn find_key<'a>(map: &'a BTreeMap<String, SheetValue>, segment: &str) -> Option<&'a String> {
    if map.contains_key(segment) {
        return map.get_key_value(segment).map(|(key, _)| key);
    }
    map.keys().find(|key| key.to_lowercase() == segment)
}

fn lookup<'a>(map: &'a BTreeMap<String, SheetValue>, segment: &str) -> Option<&'a SheetValue> {
    find_key(map, segment).and_then(|key| map.get(key))
}

fn lookup_mut<'a>(
    map: &'a mut BTreeMap<String, SheetValue>,
    segment: &str,
) -> Option<&'a mut SheetValue> {
    let key = find_key(map, segment)?.clone();
    map.get_mut(&key)
}

/// The persisted sheet for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterDocument {
    root: BTreeMap<String, SheetValue>,
}

impl CharacterDocument {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn root(&self) -> &BTreeMap<String, SheetValue> {
        &self.root
    }

    // =========================================================================
    // Path addressing
    // =========================================================================

    /// Read the value at `path`. Mappings come back whole.
    pub fn get(&self, path: &AttributePath) -> Result<&SheetValue, DomainError> {
        let (parents, last) = path.split_last();
        let mut current = &self.root;
        for segment in parents {
            current = lookup(current, segment)
                .and_then(SheetValue::as_object)
                .ok_or_else(|| DomainError::attribute_not_found(path.as_str()))?;
        }
        lookup(current, last).ok_or_else(|| DomainError::attribute_not_found(path.as_str()))
    }

    /// Write `value` at `path`, creating missing intermediate mappings.
    ///
    /// Returns the previous value at the path, if any.
    pub fn set(
        &mut self,
        path: &AttributePath,
        value: SheetValue,
    ) -> Result<Option<SheetValue>, DomainError> {
        let (parents, last) = path.split_last();
        let mut current = &mut self.root;
        for segment in parents {
            let key = match find_key(current, segment) {
                Some(key) => key.clone(),
                None => {
                    current.insert(segment.clone(), SheetValue::empty_object());
                    segment.clone()
                }
            };
            current = match current.get_mut(&key) {
                Some(SheetValue::Object(child)) => child,
                _ => return Err(DomainError::path_conflict(path.as_str(), key)),
            };
        }
        let key = find_key(current, last)
            .cloned()
            .unwrap_or_else(|| last.clone());
        Ok(current.insert(key, value))
    }

    /// Remove the entry at `path` from its parent mapping.
    pub fn delete(&mut self, path: &AttributePath) -> Result<SheetValue, DomainError> {
        let (parents, last) = path.split_last();
        let mut current = &mut self.root;
        for segment in parents {
            current = lookup_mut(current, segment)
                .and_then(SheetValue::as_object_mut)
                .ok_or_else(|| DomainError::attribute_not_found(path.as_str()))?;
        }
        let key = find_key(current, last)
            .cloned()
            .ok_or_else(|| DomainError::attribute_not_found(path.as_str()))?;
        current
            .remove(&key)
            .ok_or_else(|| DomainError::attribute_not_found(path.as_str()))
    }

    // =========================================================================
    // Typed access for well-known fields
    // =========================================================================

    /// Look up a fixed path; `None` when any segment is absent.
    pub(crate) fn lookup_known(&self, path: &str) -> Option<&SheetValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = lookup(&self.root, first)?;
        for segment in segments {
            current = lookup(current.as_object()?, segment)?;
        }
        Some(current)
    }

    /// Integer at a fixed path, `None` if absent.
    pub(crate) fn optional_int(&self, path: &str) -> Result<Option<i64>, DomainError> {
        match self.lookup_known(path) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| DomainError::malformed(path, "integer")),
        }
    }

    /// Integer at a fixed path that must exist.
    pub(crate) fn required_int(&self, path: &str) -> Result<i64, DomainError> {
        self.optional_int(path)?
            .ok_or_else(|| DomainError::attribute_not_found(path))
    }

    /// String at a fixed path that must exist.
    pub(crate) fn required_str(&self, path: &str) -> Result<&str, DomainError> {
        let value = self
            .lookup_known(path)
            .ok_or_else(|| DomainError::attribute_not_found(path))?;
        value
            .as_str()
            .ok_or_else(|| DomainError::malformed(path, "string"))
    }

    /// Whether a top-level section exists.
    pub(crate) fn has_section(&self, name: &str) -> bool {
        lookup(&self.root, name).is_some()
    }

    /// Write an integer into a fixed `section.field` path, creating the
    /// section when needed. Callers validate the section shape first.
    pub(crate) fn put_int(&mut self, path: &str, value: i64) -> Result<(), DomainError> {
        let parsed = AttributePath::parse(path)?;
        self.set(&parsed, SheetValue::Integer(value))?;
        Ok(())
    }
}
