//! Rows, cells and row keys.
//!
//! A [`Row`] maps field names to owned [`Cell`]s and carries the reserved
//! selection flag. Rows convert to and from the host's JSON shape, where the
//! flag travels as the `isSelected` field.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::{Result, TableError};
use crate::value::{Number, Value};

/// Name of the reserved selection field in the host JSON.
pub const SELECTED_FIELD: &str = "isSelected";

/// Owned cell value stored in a row.
///
/// Unlike [`Value`], which borrows from the row, `Cell` owns its data.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(Number),
    /// Calendar date.
    Date(NaiveDate),
    /// Boolean value.
    Bool(bool),
    /// Explicit null.
    Null,
    /// Nested JSON kept verbatim; never compared.
    Json(Json),
}

impl Cell {
    /// Borrowed view used by the filter and sort engines.
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Cell::Text(s) => Value::Text(s),
            Cell::Number(n) => Value::Number(*n),
            Cell::Date(d) => Value::Date(*d),
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Null | Cell::Json(_) => Value::None,
        }
    }

    /// Converts a JSON value into a cell.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Cell::Null,
            Json::Bool(b) => Cell::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Number(Number::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Cell::Number(Number::U64(u))
                } else {
                    Cell::Number(Number::F64(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Json::String(s) => Cell::Text(s.clone()),
            other => Cell::Json(other.clone()),
        }
    }

    /// Converts the cell back into JSON. Dates become `YYYY-MM-DD` strings.
    pub fn to_json(&self) -> Json {
        match self {
            Cell::Text(s) => Json::String(s.clone()),
            Cell::Number(Number::I64(n)) => Json::from(*n),
            Cell::Number(Number::U64(n)) => Json::from(*n),
            Cell::Number(Number::F64(n)) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Cell::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Cell::Bool(b) => Json::Bool(*b),
            Cell::Null => Json::Null,
            Cell::Json(v) => v.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Cell::Date(d)
    }
}

impl From<Number> for Cell {
    fn from(n: Number) -> Self {
        Cell::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(Number::from(n))
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(Number::from(n))
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Number(Number::from(n))
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(Number::from(n))
    }
}

/// Identity of a row: the display string of its key field.
///
/// Keys compare loosely across types, so a numeric key `1` matches the text
/// key `"1"` coming back from a selection event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
    /// Creates a key from any displayable value.
    pub fn new(key: impl fmt::Display) -> Self {
        RowKey(key.to_string())
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of a cell value, if the value is present.
    pub fn from_value(value: Value<'_>) -> Option<Self> {
        value.display().map(RowKey)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey(s.to_string())
    }
}

impl From<String> for RowKey {
    fn from(s: String) -> Self {
        RowKey(s)
    }
}

impl From<i32> for RowKey {
    fn from(n: i32) -> Self {
        RowKey(n.to_string())
    }
}

impl From<i64> for RowKey {
    fn from(n: i64) -> Self {
        RowKey(n.to_string())
    }
}

/// A single data row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: BTreeMap<String, Cell>,
    selected: bool,
}

impl Row {
    /// Creates an empty, unselected row.
    pub fn new() -> Self {
        Row::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.set(field, cell);
        self
    }

    /// Builder-style selection setter.
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Parses a row from a JSON object.
    ///
    /// A truthy `isSelected` field sets the selection flag; it is not kept
    /// as a regular field.
    pub fn from_json(json: &Json) -> Option<Self> {
        let object = json.as_object()?;
        let mut row = Row::new();
        for (name, value) in object {
            if name == SELECTED_FIELD {
                row.selected = Cell::from_json(value).as_value().is_truthy();
            } else {
                row.fields.insert(name.clone(), Cell::from_json(value));
            }
        }
        Some(row)
    }

    /// Parses a row source: a list of objects, or a single object treated as
    /// a one-row list.
    pub fn list_from_json(json: &Json) -> Result<Vec<Row>> {
        match json {
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    Row::from_json(item).ok_or(TableError::MalformedRow { index })
                })
                .collect(),
            Json::Object(_) => Ok(Row::from_json(json).into_iter().collect()),
            Json::Null => Ok(Vec::new()),
            Json::Bool(_) => Err(TableError::MalformedRowSource("a boolean")),
            Json::Number(_) => Err(TableError::MalformedRowSource("a number")),
            Json::String(_) => Err(TableError::MalformedRowSource("a string")),
        }
    }

    /// Converts the row to a JSON object, including `isSelected`.
    pub fn to_json(&self) -> Json {
        let mut object = Map::new();
        for (name, cell) in &self.fields {
            object.insert(name.clone(), cell.to_json());
        }
        object.insert(SELECTED_FIELD.to_string(), Json::Bool(self.selected));
        Json::Object(object)
    }

    /// Value of a field, [`Value::None`] when absent.
    pub fn get(&self, field: &str) -> Value<'_> {
        self.fields
            .get(field)
            .map(Cell::as_value)
            .unwrap_or(Value::None)
    }

    /// Owned cell of a field, if present.
    pub fn cell(&self, field: &str) -> Option<&Cell> {
        self.fields.get(field)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, cell: impl Into<Cell>) {
        self.fields.insert(field.into(), cell.into());
    }

    /// Iterates over the row's fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Key of this row under the given key field.
    pub fn key(&self, key_field: &str) -> Option<RowKey> {
        RowKey::from_value(self.get(key_field))
    }

    /// Whether the row is selected.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sets the selection flag.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, cell) in &self.fields {
            map.serialize_entry(name, &cell.to_json())?;
        }
        map.serialize_entry(SELECTED_FIELD, &self.selected)?;
        map.end()
    }
}

/// The authoritative row set, versioned on every replacement or mutation.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    rows: Vec<Row>,
    version: u64,
}

impl RowSet {
    /// Creates a row set, rejecting duplicate keys.
    ///
    /// Rows without a key are accepted but cannot be selected by event or
    /// targeted by edits.
    pub fn new(rows: Vec<Row>, key_field: &str) -> Result<Self> {
        let mut set = RowSet::default();
        set.replace(rows, key_field)?;
        Ok(set)
    }

    /// Replaces the rows, bumping the version. On error nothing changes.
    pub fn replace(&mut self, rows: Vec<Row>, key_field: &str) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(rows.len());
        let mut unkeyed = 0usize;
        for row in &rows {
            match row.key(key_field) {
                Some(key) => {
                    if !seen.insert(key.clone()) {
                        return Err(TableError::DuplicateKey(key));
                    }
                }
                None => unkeyed += 1,
            }
        }
        if unkeyed > 0 {
            tracing::warn!(key_field, unkeyed, "rows without a key value");
        }
        self.rows = rows;
        self.version += 1;
        Ok(())
    }

    /// Current version; increases on every change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Rows in their current order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access for in-place sorting and selection. Does not bump the
    /// version; use [`RowSet::touch`] after field mutations.
    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// Marks the row set as changed.
    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_from_json_extracts_selection() {
        let row = Row::from_json(&json!({"Id": 1, "Name": "A", "isSelected": true})).unwrap();
        assert!(row.is_selected());
        assert_eq!(row.get("Name"), Value::Text("A"));
        assert!(row.cell(SELECTED_FIELD).is_none());
    }

    #[test]
    fn row_json_roundtrip_keeps_nested_values() {
        let source = json!({"Id": "a", "Attrs": {"x": 1}, "Price": 9.5, "isSelected": false});
        let row = Row::from_json(&source).unwrap();
        assert_eq!(row.get("Attrs"), Value::None);
        assert_eq!(row.to_json(), source);
    }

    #[test]
    fn single_object_is_a_one_row_list() {
        let rows = Row::list_from_json(&json!({"Id": 1})).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn non_object_rows_are_rejected() {
        let err = Row::list_from_json(&json!([{"Id": 1}, 2])).unwrap_err();
        assert!(matches!(err, TableError::MalformedRow { index: 1 }));
        assert!(Row::list_from_json(&json!("rows")).is_err());
    }

    #[test]
    fn keys_compare_loosely() {
        let numeric = Row::new().with("Id", 1);
        let text = Row::new().with("Id", "1");
        assert_eq!(numeric.key("Id"), text.key("Id"));
        assert_eq!(numeric.key("Missing"), None);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let rows = vec![Row::new().with("Id", 1), Row::new().with("Id", "1")];
        let err = RowSet::new(rows, "Id").unwrap_err();
        assert!(matches!(err, TableError::DuplicateKey(k) if k.as_str() == "1"));
    }

    #[test]
    fn replace_bumps_version() {
        let mut set = RowSet::new(vec![Row::new().with("Id", 1)], "Id").unwrap();
        let before = set.version();
        set.replace(vec![], "Id").unwrap();
        assert!(set.version() > before);
        assert!(set.is_empty());
    }

    #[test]
    fn failed_replace_keeps_rows() {
        let mut set = RowSet::new(vec![Row::new().with("Id", 1)], "Id").unwrap();
        let version = set.version();
        let dupes = vec![Row::new().with("Id", 2), Row::new().with("Id", 2)];
        assert!(set.replace(dupes, "Id").is_err());
        assert_eq!(set.len(), 1);
        assert_eq!(set.version(), version);
    }
}
