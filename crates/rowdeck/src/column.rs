//! Column definitions and the column registry.
//!
//! Columns are configuration: they are supplied once and reprocessed whenever
//! they change. The registry derives one [`FilterSpec`](crate::FilterSpec) per
//! filterable column, categorized by the column's kind.

use serde::{Deserialize, Serialize};

use crate::filter::{FilterCategory, FilterSet};

/// A table column as configured by the host.
///
/// # Example
///
/// ```
/// use rowdeck::Column;
///
/// let col: Column = serde_json::from_str(
///     r#"{"fieldName": "Price", "label": "Price", "type": "currency", "filterable": true}"#,
/// ).unwrap();
/// assert_eq!(col.display_label(), "Price");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Name of the field in each row.
    pub field_name: String,
    /// Display label; falls back to the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kind tag (`text`, `number`, `date`, ...). Absent means text.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub filterable: bool,
}

impl Column {
    /// Creates a text column with no flags set.
    pub fn new(field_name: impl Into<String>) -> Self {
        Column {
            field_name: field_name.into(),
            label: None,
            kind: None,
            sortable: false,
            editable: false,
            filterable: false,
        }
    }

    /// Sets the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the kind tag.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Marks the column sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Marks the column editable.
    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    /// Marks the column filterable.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Label, or the field name when no label is set.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field_name)
    }

    /// Filter category implied by the kind tag.
    ///
    /// Returns `None` for unrecognized kinds, which are never filterable.
    pub fn filter_category(&self) -> Option<FilterCategory> {
        match self.kind.as_deref() {
            None | Some("text" | "email" | "phone" | "url" | "location") => {
                Some(FilterCategory::Text)
            }
            Some("number" | "currency" | "percent") => Some(FilterCategory::Numeric),
            Some("boolean") => Some(FilterCategory::Boolean),
            Some("date" | "date-local") => Some(FilterCategory::Date),
            Some(_) => None,
        }
    }
}

/// Holds the column set and the filter specs derived from it.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
    filters: FilterSet,
}

impl ColumnRegistry {
    /// Creates a registry for the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        let mut registry = ColumnRegistry::default();
        registry.set_columns(columns);
        registry
    }

    /// Replaces the column set and regenerates the filter specs.
    ///
    /// Any previously active filter values are discarded.
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        for column in &columns {
            if column.filterable && column.filter_category().is_none() {
                tracing::warn!(
                    field = %column.field_name,
                    kind = column.kind.as_deref().unwrap_or_default(),
                    "unrecognized column kind, column will not be filterable"
                );
            }
        }
        self.filters = FilterSet::from_columns(&columns);
        self.columns = columns;
    }

    /// Columns in configuration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Derived filter specs.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Mutable filter specs, for user input.
    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    /// Returns `true` if any column is editable.
    pub fn any_editable(&self) -> bool {
        self.columns.iter().any(|c| c.editable)
    }
}
