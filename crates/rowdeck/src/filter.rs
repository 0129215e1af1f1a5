//! Filter specs and the row visibility predicate.
//!
//! A [`FilterSet`] is a single ordered collection of tagged [`FilterSpec`]s,
//! one per filterable column. [`is_visible`] combines the global search
//! string, the show-only-selected toggle and every active filter:
//!
//! ```text
//! visible = search matches any column (or search is empty)
//!         ∧ (row is selected, or show-only-selected is off)
//!         ∧ every boolean filter passes
//!         ∧ every text filter passes
//!         ∧ every numeric filter passes
//!         ∧ every date filter passes
//! ```
//!
//! Missing cells are coerced per kind: boolean filters read them as `false`,
//! numeric filters as `0`, and date filters exclude the row whenever a bound
//! is set.

use std::fmt;

use chrono::NaiveDate;

use crate::column::Column;
use crate::error::{Result, TableError};
use crate::row::Row;
use crate::value::{parse_date, Value};

/// The four filter categories a column kind maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    Text,
    Numeric,
    Boolean,
    Date,
}

impl FilterCategory {
    /// Evaluation order of the categories within [`is_visible`].
    pub const EVALUATION_ORDER: [FilterCategory; 4] = [
        FilterCategory::Boolean,
        FilterCategory::Text,
        FilterCategory::Numeric,
        FilterCategory::Date,
    ];

    /// Returns the display name of this category.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterCategory::Text => "text",
            FilterCategory::Numeric => "numeric",
            FilterCategory::Boolean => "boolean",
            FilterCategory::Date => "date",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filter state, tagged by category.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Exact match on the cell's display string.
    Text { value: Option<String> },
    /// Inclusive numeric range.
    Numeric { min: Option<f64>, max: Option<f64> },
    /// Requires a truthy cell when `value` is set.
    Boolean { value: bool },
    /// Inclusive date range.
    Date {
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
}

impl FilterKind {
    /// Unset state for a category.
    pub fn unset(category: FilterCategory) -> Self {
        match category {
            FilterCategory::Text => FilterKind::Text { value: None },
            FilterCategory::Numeric => FilterKind::Numeric {
                min: None,
                max: None,
            },
            FilterCategory::Boolean => FilterKind::Boolean { value: false },
            FilterCategory::Date => FilterKind::Date {
                min: None,
                max: None,
            },
        }
    }

    /// Category of this filter state.
    pub fn category(&self) -> FilterCategory {
        match self {
            FilterKind::Text { .. } => FilterCategory::Text,
            FilterKind::Numeric { .. } => FilterCategory::Numeric,
            FilterKind::Boolean { .. } => FilterCategory::Boolean,
            FilterKind::Date { .. } => FilterCategory::Date,
        }
    }
}

/// A filter bound to one column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Field the filter reads.
    pub field: String,
    /// Label of the source column.
    pub label: String,
    /// Current filter state.
    pub kind: FilterKind,
}

impl FilterSpec {
    /// Creates an unset filter.
    pub fn new(field: impl Into<String>, label: impl Into<String>, category: FilterCategory) -> Self {
        FilterSpec {
            field: field.into(),
            label: label.into(),
            kind: FilterKind::unset(category),
        }
    }

    /// Kind of value the filter compares against.
    pub fn category(&self) -> FilterCategory {
        self.kind.category()
    }

    /// Returns `true` if the filter can hide any row.
    pub fn is_active(&self) -> bool {
        match &self.kind {
            FilterKind::Text { value } => value.is_some(),
            FilterKind::Numeric { min, max } => min.is_some() || max.is_some(),
            FilterKind::Boolean { value } => *value,
            FilterKind::Date { min, max } => min.is_some() || max.is_some(),
        }
    }

    /// Resets the filter to its unset state.
    pub fn reset(&mut self) {
        self.kind = FilterKind::unset(self.category());
    }

    /// Evaluates the filter against a row.
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(&self.field);
        match &self.kind {
            FilterKind::Boolean { value } => !*value || coerce_bool(cell),
            FilterKind::Text { value } => match value {
                Some(expected) => cell.display().as_deref() == Some(expected.as_str()),
                None => true,
            },
            FilterKind::Numeric { min, max } => {
                let n = if cell.is_truthy() { cell.to_f64() } else { 0.0 };
                // NaN fails both comparisons, so unparseable text passes.
                !(min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max))
            }
            FilterKind::Date { min, max } => {
                if min.is_none() && max.is_none() {
                    return true;
                }
                let date = if cell.is_truthy() { cell.to_date() } else { None };
                match date {
                    None => false,
                    Some(d) => {
                        !(min.is_some_and(|min| d < min) || max.is_some_and(|max| d > max))
                    }
                }
            }
        }
    }

    fn mismatch(&self, input: &'static str) -> TableError {
        TableError::FilterKindMismatch {
            field: self.field.clone(),
            kind: self.category().as_str(),
            input,
        }
    }
}

/// Boolean coercion of a cell.
///
/// Missing and falsy cells are `false`; the strings `Yes`/`yes` and `No`/`no`
/// map to `true` and `false`. Other values compare loosely against `true`.
pub fn coerce_bool(cell: Value<'_>) -> bool {
    if !cell.is_truthy() {
        return false;
    }
    match cell {
        Value::Text("No" | "no") => false,
        Value::Text("Yes" | "yes") => true,
        Value::Bool(b) => b,
        Value::Date(_) => false,
        other => other.to_f64() == 1.0,
    }
}

/// User input for a filter, as received from an input control.
///
/// Bounds arrive as raw strings and are parsed according to the filter's
/// category; an empty string clears the bound.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    /// Text filter value.
    Text(Option<String>),
    /// Lower bound of a numeric or date filter.
    Min(Option<String>),
    /// Upper bound of a numeric or date filter.
    Max(Option<String>),
    /// Flips a boolean filter.
    Toggle,
}

#[derive(Clone, Copy)]
enum Bound {
    Min,
    Max,
}

/// Ordered collection of the filters derived from a column set.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    specs: Vec<FilterSpec>,
}

impl FilterSet {
    /// Derives one unset filter per filterable column, in column order.
    pub fn from_columns(columns: &[Column]) -> Self {
        let specs = columns
            .iter()
            .filter(|c| c.filterable)
            .filter_map(|c| {
                c.filter_category()
                    .map(|cat| FilterSpec::new(&c.field_name, c.display_label(), cat))
            })
            .collect();
        FilterSet { specs }
    }

    /// All filters in column order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter()
    }

    /// Filters of one category, in column order.
    pub fn of_category(&self, category: FilterCategory) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter().filter(move |s| s.category() == category)
    }

    /// Filter for a field.
    pub fn get(&self, field: &str) -> Option<&FilterSpec> {
        self.specs.iter().find(|s| s.field == field)
    }

    fn get_mut(&mut self, field: &str) -> Result<&mut FilterSpec> {
        self.specs
            .iter_mut()
            .find(|s| s.field == field)
            .ok_or_else(|| TableError::UnknownFilter(field.to_string()))
    }

    /// Number of filters, one per filterable column.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if no column is filterable.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Returns `true` if any filter is active.
    pub fn any_active(&self) -> bool {
        self.specs.iter().any(FilterSpec::is_active)
    }

    /// Resets every filter to its unset state.
    pub fn clear(&mut self) {
        for spec in &mut self.specs {
            spec.reset();
        }
    }

    /// Sets a text filter. `None` or an empty string clears it.
    pub fn set_text(&mut self, field: &str, value: Option<String>) -> Result<()> {
        let spec = self.get_mut(field)?;
        match &mut spec.kind {
            FilterKind::Text { value: slot } => {
                *slot = value.filter(|v| !v.is_empty());
                Ok(())
            }
            _ => Err(spec.mismatch("a text value")),
        }
    }

    /// Sets both bounds of a numeric filter.
    pub fn set_numeric_range(&mut self, field: &str, min: Option<f64>, max: Option<f64>) -> Result<()> {
        let spec = self.get_mut(field)?;
        match &mut spec.kind {
            FilterKind::Numeric { min: lo, max: hi } => {
                *lo = min;
                *hi = max;
                Ok(())
            }
            _ => Err(spec.mismatch("a numeric range")),
        }
    }

    /// Sets both bounds of a date filter.
    pub fn set_date_range(
        &mut self,
        field: &str,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    ) -> Result<()> {
        let spec = self.get_mut(field)?;
        match &mut spec.kind {
            FilterKind::Date { min: lo, max: hi } => {
                *lo = min;
                *hi = max;
                Ok(())
            }
            _ => Err(spec.mismatch("a date range")),
        }
    }

    /// Sets a boolean filter.
    pub fn set_boolean(&mut self, field: &str, value: bool) -> Result<()> {
        let spec = self.get_mut(field)?;
        match &mut spec.kind {
            FilterKind::Boolean { value: slot } => {
                *slot = value;
                Ok(())
            }
            _ => Err(spec.mismatch("a boolean value")),
        }
    }

    /// Applies raw input from a filter control.
    pub fn apply_input(&mut self, field: &str, input: FilterInput) -> Result<()> {
        match input {
            FilterInput::Text(value) => self.set_text(field, value),
            FilterInput::Min(raw) => self.set_bound(field, Bound::Min, raw),
            FilterInput::Max(raw) => self.set_bound(field, Bound::Max, raw),
            FilterInput::Toggle => {
                let spec = self.get_mut(field)?;
                match &mut spec.kind {
                    FilterKind::Boolean { value } => {
                        *value = !*value;
                        Ok(())
                    }
                    _ => Err(spec.mismatch("a toggle")),
                }
            }
        }
    }

    fn set_bound(&mut self, field: &str, bound: Bound, raw: Option<String>) -> Result<()> {
        let spec = self.get_mut(field)?;
        let raw = raw.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        match &mut spec.kind {
            FilterKind::Numeric { min, max } => {
                let parsed = match raw.as_deref() {
                    Some(r) => Some(
                        r.parse::<f64>()
                            .ok()
                            .filter(|n| !n.is_nan())
                            .ok_or_else(|| invalid_input(field, FilterCategory::Numeric, r))?,
                    ),
                    None => None,
                };
                match bound {
                    Bound::Min => *min = parsed,
                    Bound::Max => *max = parsed,
                }
                Ok(())
            }
            FilterKind::Date { min, max } => {
                let parsed = match raw.as_deref() {
                    Some(r) => Some(
                        parse_date(r).ok_or_else(|| invalid_input(field, FilterCategory::Date, r))?,
                    ),
                    None => None,
                };
                match bound {
                    Bound::Min => *min = parsed,
                    Bound::Max => *max = parsed,
                }
                Ok(())
            }
            _ => Err(spec.mismatch("a range bound")),
        }
    }

    /// Evaluates every filter against a row, category by category.
    pub fn matches(&self, row: &Row) -> bool {
        FilterCategory::EVALUATION_ORDER
            .iter()
            .all(|cat| self.of_category(*cat).all(|spec| spec.matches(row)))
    }

    /// Choices for a text filter: an empty option used to clear the filter,
    /// followed by the distinct values of the field across all rows.
    pub fn text_options(&self, field: &str, rows: &[Row]) -> Result<Vec<String>> {
        let spec = self
            .get(field)
            .ok_or_else(|| TableError::UnknownFilter(field.to_string()))?;
        if spec.category() != FilterCategory::Text {
            return Err(spec.mismatch("option listing"));
        }
        let mut options = vec![String::new()];
        for row in rows {
            if let Some(value) = row.get(field).display() {
                if !options.contains(&value) {
                    options.push(value);
                }
            }
        }
        Ok(options)
    }
}

fn invalid_input(field: &str, category: FilterCategory, value: &str) -> TableError {
    TableError::InvalidFilterInput {
        field: field.to_string(),
        kind: category.as_str(),
        value: value.to_string(),
    }
}

/// Everything [`is_visible`] needs besides the row.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Global search string; empty disables search.
    pub search_text: &'a str,
    /// Columns searched by the global search.
    pub columns: &'a [Column],
    /// Advanced filters.
    pub filters: &'a FilterSet,
    /// Hide rows that are not selected.
    pub show_only_selected: bool,
}

/// Decides whether a row is visible under the given context.
pub fn is_visible(row: &Row, ctx: &FilterContext<'_>) -> bool {
    if !ctx.search_text.is_empty() {
        let needle = ctx.search_text.to_lowercase();
        let found = ctx.columns.iter().any(|column| {
            let cell = row.get(&column.field_name);
            cell.is_truthy() && cell.to_string().to_lowercase().contains(&needle)
        });
        if !found {
            return false;
        }
    }

    if ctx.show_only_selected && !row.is_selected() {
        return false;
    }

    ctx.filters.matches(row)
}
