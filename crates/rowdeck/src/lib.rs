//! Rowdeck - Row-set pipeline for interactive data tables.
//!
//! Rowdeck owns the rows behind a paged, searchable, selectable data table
//! and recomputes the visible page whenever something changes. It supports:
//!
//! - Global search across the configured columns
//! - Advanced filters per column kind: text, numeric range, boolean, date range
//! - Single-field sorting with stable placement of missing values
//! - Fixed-size pagination with page index clamping
//! - Page-scoped selection that survives paging, filtering and sorting
//! - Inline edit merging with per-row forwarding to a persistence sink
//! - Syncing selected rows into a host JSON document and publishing them
//!
//! # Quick Start
//!
//! ```rust
//! use std::collections::HashSet;
//! use rowdeck::{Column, Dir, Row, RowKey, TableConfig, TabularDataProcessor};
//!
//! let mut config = TableConfig::new("Id");
//! config.columns = vec![
//!     Column::new("Name").filterable(),
//!     Column::new("Qty").kind("number").sortable(),
//! ];
//!
//! let mut table = TabularDataProcessor::new(config).unwrap();
//! table.set_rows(vec![
//!     Row::new().with("Id", 1).with("Name", "Bolt").with("Qty", 40),
//!     Row::new().with("Id", 2).with("Name", "Nut").with("Qty", 15),
//!     Row::new().with("Id", 3).with("Name", "Washer"),
//! ]).unwrap();
//!
//! table.sort_by("Qty", Dir::Asc);
//! let names: Vec<String> = table.current_page().iter().map(|r| r.get("Name").to_string()).collect();
//! assert_eq!(names, ["Washer", "Nut", "Bolt"]);
//!
//! let keys: HashSet<RowKey> = [RowKey::from(2)].into_iter().collect();
//! table.apply_selection_event(&keys).unwrap();
//! assert_eq!(table.status().selection_message, "1 Selected");
//! ```
//!
//! # Pipeline
//!
//! Every trigger recomputes from scratch:
//!
//! ```text
//! rows → sort (in place) → visible = search ∧ only-selected ∧ filters
//!      → pages of pageSize → clamp current page
//! ```
//!
//! Filters are evaluated in a fixed order, boolean then text then numeric
//! then date, and a row must pass all of them:
//!
//! | Kind | Matches when |
//! |------|--------------|
//! | Text | the cell equals the selected value |
//! | Numeric | min ≤ cell ≤ max; a missing cell counts as 0 |
//! | Boolean | the coerced cell equals the toggle; `"Yes"`/`"No"` are recognized |
//! | Date | min ≤ cell ≤ max; a missing date fails any set bound |
//!
//! # Host integration
//!
//! A table can be wired to three host services, all optional:
//!
//! - a [`DataStore`] holding the JSON document selected rows are written to,
//!   at the location named by `jsonPath`
//! - a [`PersistenceSink`] receiving one [`UpdateRequest`] per edited row
//! - an [`EventBus`] receiving a [`Publication`] after each selection change
//!
//! Failures of these services are logged with `tracing` and never undo the
//! local change.

mod column;
mod config;
mod edit;
mod error;
mod filter;
mod host;
mod ordering;
mod paginate;
mod processor;
mod row;
mod selection;
mod value;

// Re-export public API
pub use column::{Column, ColumnRegistry};
pub use config::{TableConfig, DEFAULT_MAX_ROW_SELECTION, DEFAULT_PUBLISH_DELAY_MS};
pub use edit::{Edit, EditMerger};
pub use error::{Result, TableError};
pub use filter::{
    coerce_bool, is_visible, FilterCategory, FilterContext, FilterInput, FilterKind, FilterSet,
    FilterSpec,
};
pub use host::{
    channel_name, DataStore, EventBus, JsonDocument, JsonPath, PathSegment, PersistenceSink,
    Publication, SinkResponse, UpdateRequest, CHANNEL_PREFIX, RESULT_EVENT,
};
pub use ordering::{compare_directed, compare_values, sort_rows, Dir, SortSpec};
pub use paginate::{clamp_page_index, paginate, PageSize};
pub use processor::{PageView, TableStatus, TabularDataProcessor};
pub use row::{Cell, Row, RowKey, RowSet, SELECTED_FIELD};
pub use selection::SelectionTracker;
pub use value::{parse_date, Number, Value};
