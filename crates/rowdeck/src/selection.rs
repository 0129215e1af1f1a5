//! Cross-page selection state.
//!
//! Selection events from a table only describe the rows on the page that is
//! currently shown. The tracker reconciles those rows against the event and
//! leaves every other row's flag alone, so selections survive paging and
//! filtering.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, TableError};
use crate::row::{Row, RowKey};

/// Reconciles selection flags by row key.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    key_field: String,
    max_selection: usize,
}

impl SelectionTracker {
    /// Creates a tracker. A `max_selection` of zero disables selection.
    pub fn new(key_field: impl Into<String>, max_selection: usize) -> Self {
        SelectionTracker {
            key_field: key_field.into(),
            max_selection,
        }
    }

    /// Returns `false` when the selection column should be hidden.
    pub fn is_enabled(&self) -> bool {
        self.max_selection >= 1
    }

    /// Applies a selection event scoped to one page.
    ///
    /// `page` holds indices into `rows`. Each row on the page is selected iff
    /// its key is in `selected`; rows on other pages are untouched. An event
    /// that would grow the total selection past the maximum is rejected and
    /// nothing changes. Events that keep or shrink the total always apply,
    /// even when the rows already exceed the maximum. Returns the number of
    /// rows whose flag changed.
    pub fn apply_event(
        &self,
        rows: &mut [Row],
        page: &[usize],
        selected: &HashSet<RowKey>,
    ) -> Result<usize> {
        let on_page: HashSet<usize> = page.iter().copied().collect();
        let current = rows.iter().filter(|row| row.is_selected()).count();
        let off_page = rows
            .iter()
            .enumerate()
            .filter(|(i, row)| row.is_selected() && !on_page.contains(i))
            .count();
        let incoming: Vec<bool> = page
            .iter()
            .map(|&i| self.wants(&rows[i], selected))
            .collect();
        let requested = off_page + incoming.iter().filter(|s| **s).count();
        if requested > self.max_selection && requested > current {
            return Err(TableError::SelectionLimit {
                requested,
                max: self.max_selection,
            });
        }

        let mut changed = 0;
        for (&i, want) in page.iter().zip(incoming) {
            if rows[i].is_selected() != want {
                rows[i].set_selected(want);
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn wants(&self, row: &Row, selected: &HashSet<RowKey>) -> bool {
        row.key(&self.key_field)
            .is_some_and(|key| selected.contains(&key))
    }

    /// All selected rows across the whole row set, in row order.
    pub fn selected<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter().filter(|r| r.is_selected()).collect()
    }

    /// Rehydrates rows from a previously captured snapshot.
    ///
    /// Rows whose key matches a snapshot row take every field and the
    /// selection flag from it (first match wins). Rows without a match are
    /// deselected.
    ///
    /// The selection limit is not applied: a snapshot is restored as it was
    /// captured, even if it holds more selected rows than the maximum. Later
    /// events may then only keep or shrink the selection.
    pub fn restore(&self, rows: &mut [Row], prior: &[Row]) {
        let mut by_key: HashMap<RowKey, &Row> = HashMap::with_capacity(prior.len());
        for row in prior {
            if let Some(key) = row.key(&self.key_field) {
                by_key.entry(key).or_insert(row);
            }
        }

        for row in rows.iter_mut() {
            let matched = row.key(&self.key_field).and_then(|k| by_key.get(&k).copied());
            match matched {
                Some(snapshot) => {
                    for (field, cell) in snapshot.fields() {
                        row.set(field, cell.clone());
                    }
                    row.set_selected(snapshot.is_selected());
                }
                None => row.set_selected(false),
            }
        }
    }
}
