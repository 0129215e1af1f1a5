//! Table configuration as set by the host.
//!
//! Hosts pass component properties as JSON with camelCase keys. Boolean
//! toggles frequently arrive as the strings `"true"`/`"false"`, so flags
//! accept either form.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::column::Column;
use crate::error::{Result, TableError};
use crate::host::JsonPath;
use crate::ordering::{Dir, SortSpec};
use crate::paginate::PageSize;

/// Maximum number of selected rows when none is configured.
pub const DEFAULT_MAX_ROW_SELECTION: usize = 1000;

/// Delay applied to selection publications when none is configured.
pub const DEFAULT_PUBLISH_DELAY_MS: u64 = 250;

/// Configuration surface of a table.
///
/// # Example
///
/// ```
/// use rowdeck::TableConfig;
///
/// let config = TableConfig::from_json_str(r#"{
///     "keyField": "Id",
///     "pageSize": 25,
///     "sortedBy": "Name",
///     "sortedDirection": "asc",
///     "sendEvents": "true"
/// }"#).unwrap();
/// assert_eq!(config.page_size.get(), 25);
/// assert!(config.send_events);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Field whose value uniquely identifies a row.
    pub key_field: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Upper bound on selected rows; below one disables selection.
    #[serde(default = "default_max_row_selection")]
    pub max_row_selection: usize,
    #[serde(default)]
    pub page_size: PageSize,
    /// Initial sort field.
    #[serde(default)]
    pub sorted_by: Option<String>,
    #[serde(default)]
    pub sorted_direction: Dir,
    #[serde(default, deserialize_with = "flag")]
    pub hide_search: bool,
    #[serde(default, deserialize_with = "flag")]
    pub show_row_number_column: bool,
    /// Remote bundle edited rows are sent to. No persistence when unset.
    #[serde(default)]
    pub update_bundle: Option<String>,
    /// Publish selection events on the step channel.
    #[serde(default, deserialize_with = "flag")]
    pub send_events: bool,
    /// Narrate pipeline activity at debug level.
    #[serde(default, deserialize_with = "flag")]
    pub debug: bool,
    /// Location of the table's data in the host document.
    #[serde(default)]
    pub json_path: Option<String>,
    /// Name used as the payload key of publications.
    #[serde(default)]
    pub element_name: Option<String>,
    #[serde(default = "default_publish_delay_ms")]
    pub publish_delay_ms: u64,
}

fn default_max_row_selection() -> usize {
    DEFAULT_MAX_ROW_SELECTION
}

fn default_publish_delay_ms() -> u64 {
    DEFAULT_PUBLISH_DELAY_MS
}

/// Accepts `true`, `false`, `"true"` and `"false"`; any other string is false.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s == "true",
    })
}

impl TableConfig {
    /// Creates a configuration with defaults for everything but the key.
    pub fn new(key_field: impl Into<String>) -> Self {
        TableConfig {
            key_field: key_field.into(),
            columns: Vec::new(),
            max_row_selection: DEFAULT_MAX_ROW_SELECTION,
            page_size: PageSize::DEFAULT,
            sorted_by: None,
            sorted_direction: Dir::default(),
            hide_search: false,
            show_row_number_column: false,
            update_bundle: None,
            send_events: false,
            debug: false,
            json_path: None,
            element_name: None,
            publish_delay_ms: DEFAULT_PUBLISH_DELAY_MS,
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.key_field.trim().is_empty() {
            return Err(TableError::InvalidConfig("keyField must not be empty".into()));
        }
        if let Some(path) = &self.json_path {
            JsonPath::parse(path)?;
        }
        Ok(())
    }

    /// Initial sort, if a sort field is configured.
    pub fn initial_sort(&self) -> Option<SortSpec> {
        self.sorted_by
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|field| SortSpec::new(field, self.sorted_direction))
    }

    /// Parsed host path, if configured and valid.
    pub fn path(&self) -> Option<JsonPath> {
        self.json_path.as_deref().and_then(|p| JsonPath::parse(p).ok())
    }

    pub fn publish_delay(&self) -> Duration {
        Duration::from_millis(self.publish_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TableConfig::from_json_str(r#"{"keyField": "Id"}"#).unwrap();
        assert_eq!(config, TableConfig::new("Id"));
        assert_eq!(config.page_size.get(), 10);
        assert_eq!(config.max_row_selection, 1000);
        assert_eq!(config.sorted_direction, Dir::Desc);
        assert_eq!(config.publish_delay(), Duration::from_millis(250));
        assert!(config.initial_sort().is_none());
    }

    #[test]
    fn string_flags() {
        let config = TableConfig::from_json_str(
            r#"{"keyField": "Id", "debug": "true", "hideSearch": "false", "sendEvents": true}"#,
        )
        .unwrap();
        assert!(config.debug);
        assert!(!config.hide_search);
        assert!(config.send_events);
    }

    #[test]
    fn zero_page_size_rejected() {
        let err = TableConfig::from_json_str(r#"{"keyField": "Id", "pageSize": 0}"#).unwrap_err();
        assert!(matches!(err, TableError::Json(_)));
    }

    #[test]
    fn empty_key_rejected() {
        assert!(matches!(
            TableConfig::from_json_str(r#"{"keyField": " "}"#),
            Err(TableError::InvalidConfig(_))
        ));
    }

    #[test]
    fn bad_path_rejected() {
        assert!(matches!(
            TableConfig::from_json_str(r#"{"keyField": "Id", "jsonPath": "A|0"}"#),
            Err(TableError::InvalidPath { .. })
        ));
    }

    #[test]
    fn initial_sort() {
        let config = TableConfig::from_json_str(
            r#"{"keyField": "Id", "sortedBy": "Name", "sortedDirection": "asc"}"#,
        )
        .unwrap();
        assert_eq!(config.initial_sort(), Some(SortSpec::asc("Name")));
    }
}
