//! Inline edit merging.
//!
//! An [`Edit`] carries a row key and the fields that changed. Merging
//! overwrites only those fields on the first row with that key; edits for
//! unknown keys are dropped.

use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::error::{Result, TableError};
use crate::row::{Cell, Row, RowKey, SELECTED_FIELD};

/// Field-level changes for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    /// Key of the row to change.
    pub key: RowKey,
    /// New values, by field name.
    pub changes: BTreeMap<String, Cell>,
}

impl Edit {
    /// Creates an edit with no changes.
    pub fn new(key: impl Into<RowKey>) -> Self {
        Edit {
            key: key.into(),
            changes: BTreeMap::new(),
        }
    }

    /// Adds a changed field.
    pub fn set(mut self, field: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.changes.insert(field.into(), cell.into());
        self
    }

    /// Parses a draft value object, which carries the key field alongside the
    /// changed fields.
    pub fn from_json(json: &Json, key_field: &str) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| TableError::MissingEditKey(key_field.to_string()))?;
        let key = object
            .get(key_field)
            .and_then(|k| RowKey::from_value(Cell::from_json(k).as_value()))
            .ok_or_else(|| TableError::MissingEditKey(key_field.to_string()))?;
        let changes = object
            .iter()
            .filter(|(name, _)| name.as_str() != key_field && name.as_str() != SELECTED_FIELD)
            .map(|(name, value)| (name.clone(), Cell::from_json(value)))
            .collect();
        Ok(Edit { key, changes })
    }
}

/// Applies batched edits to rows by key.
#[derive(Debug, Clone)]
pub struct EditMerger {
    key_field: String,
}

impl EditMerger {
    /// Creates a merger matching rows on `key_field`.
    pub fn new(key_field: impl Into<String>) -> Self {
        EditMerger {
            key_field: key_field.into(),
        }
    }

    /// Applies edits in order and returns the fully updated rows, one per
    /// applied edit, in edit order.
    pub fn apply(&self, rows: &mut [Row], edits: &[Edit]) -> Vec<Row> {
        let mut updated = Vec::with_capacity(edits.len());
        for edit in edits {
            let target = rows
                .iter_mut()
                .find(|row| row.key(&self.key_field).as_ref() == Some(&edit.key));
            match target {
                Some(row) => {
                    for (field, cell) in &edit.changes {
                        row.set(field.clone(), cell.clone());
                    }
                    updated.push(row.clone());
                }
                None => tracing::debug!(key = %edit.key, "edit for unknown row dropped"),
            }
        }
        updated
    }
}
