//! The table processor: owns the row set and runs the pipeline.
//!
//! Every trigger (columns, rows, search, filters, sort, page, selection,
//! edits) recomputes the pipeline from scratch:
//!
//! ```text
//! sort whole row set → filter → paginate → clamp page index
//! ```
//!
//! Pages are index views into the row set, so selection and edits always act
//! on the authoritative rows.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::column::{Column, ColumnRegistry};
use crate::config::TableConfig;
use crate::edit::{Edit, EditMerger};
use crate::error::{Result, TableError};
use crate::filter::{is_visible, FilterContext, FilterInput, FilterSet};
use crate::host::{
    channel_name, DataStore, EventBus, JsonPath, PersistenceSink, Publication, UpdateRequest,
    CHANNEL_PREFIX, RESULT_EVENT,
};
use crate::ordering::{sort_rows, Dir, SortSpec};
use crate::paginate::{clamp_page_index, paginate};
use crate::row::{Row, RowKey, RowSet};
use crate::selection::SelectionTracker;

/// A data table's row-set pipeline and its host wiring.
///
/// # Example
///
/// ```
/// use rowdeck::{Column, Row, TableConfig, TabularDataProcessor};
///
/// let mut config = TableConfig::new("Id");
/// config.columns = vec![Column::new("Name").filterable()];
///
/// let mut table = TabularDataProcessor::new(config).unwrap();
/// table
///     .set_rows((1..=25).map(|i| Row::new().with("Id", i).with("Name", format!("row {}", i))).collect())
///     .unwrap();
///
/// assert_eq!(table.page_count(), 3);
/// table.set_search("row 2");
/// assert_eq!(table.visible_count(), 7); // "row 2" and "row 20".."row 25"
/// ```
pub struct TabularDataProcessor {
    config: TableConfig,
    registry: ColumnRegistry,
    rows: RowSet,
    selection: SelectionTracker,
    edits: EditMerger,
    search_text: String,
    show_only_selected: bool,
    show_advanced_filters: bool,
    sort: Option<SortSpec>,
    pages: Vec<Vec<usize>>,
    visible_count: usize,
    current_page: usize,
    path: Option<JsonPath>,
    store: Option<Box<dyn DataStore>>,
    sink: Option<Box<dyn PersistenceSink>>,
    bus: Option<Box<dyn EventBus>>,
}

impl fmt::Debug for TabularDataProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularDataProcessor")
            .field("config", &self.config)
            .field("rows", &self.rows.len())
            .field("version", &self.rows.version())
            .field("search_text", &self.search_text)
            .field("sort", &self.sort)
            .field("current_page", &self.current_page)
            .field("page_count", &self.pages.len())
            .finish_non_exhaustive()
    }
}

impl TabularDataProcessor {
    /// Creates an empty table from a configuration.
    pub fn new(config: TableConfig) -> Result<Self> {
        config.validate()?;
        let mut table = TabularDataProcessor {
            registry: ColumnRegistry::new(config.columns.clone()),
            rows: RowSet::default(),
            selection: SelectionTracker::new(&config.key_field, config.max_row_selection),
            edits: EditMerger::new(&config.key_field),
            search_text: String::new(),
            show_only_selected: false,
            show_advanced_filters: false,
            sort: config.initial_sort(),
            pages: Vec::new(),
            visible_count: 0,
            current_page: 0,
            path: config.path(),
            store: None,
            sink: None,
            bus: None,
            config,
        };
        table.recompute();
        Ok(table)
    }

    /// Attaches the host document selected rows are synced to.
    pub fn with_store(mut self, store: impl DataStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Attaches the sink edited rows are forwarded to.
    pub fn with_sink(mut self, sink: impl PersistenceSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Attaches the bus selection events are published to.
    pub fn with_bus(mut self, bus: impl EventBus + 'static) -> Self {
        self.bus = Some(Box::new(bus));
        self
    }

    // ========================================================================
    // Configuration triggers
    // ========================================================================

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn columns(&self) -> &[Column] {
        self.registry.columns()
    }

    /// Replaces the columns. Filter values are reset.
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.registry.set_columns(columns.clone());
        self.config.columns = columns;
        self.recompute();
    }

    /// Replaces the row set. Rejects duplicate keys and keeps the previous
    /// rows in that case.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> Result<()> {
        if let Err(err) = self.rows.replace(rows, &self.config.key_field) {
            tracing::warn!(%err, "row set rejected");
            return Err(err);
        }
        self.recompute();
        Ok(())
    }

    /// Replaces the row set from the host's JSON shape.
    pub fn set_rows_json(&mut self, json: &Json) -> Result<()> {
        let rows = Row::list_from_json(json)?;
        self.set_rows(rows)
    }

    /// All rows in current (sorted) order.
    pub fn rows(&self) -> &[Row] {
        self.rows.rows()
    }

    /// Version of the row set; changes on replacement, restore and edits.
    pub fn version(&self) -> u64 {
        self.rows.version()
    }

    // ========================================================================
    // Search, filters and sort
    // ========================================================================

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Sets the global search string.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.recompute();
    }

    pub fn filters(&self) -> &FilterSet {
        self.registry.filters()
    }

    /// Applies input from an advanced filter control.
    pub fn set_filter(&mut self, field: &str, input: FilterInput) -> Result<()> {
        if let Err(err) = self.registry.filters_mut().apply_input(field, input) {
            tracing::warn!(%err, field, "filter input rejected");
            return Err(err);
        }
        self.recompute();
        Ok(())
    }

    pub fn show_only_selected(&self) -> bool {
        self.show_only_selected
    }

    /// Hides rows that are not selected.
    pub fn set_show_only_selected(&mut self, only_selected: bool) {
        self.show_only_selected = only_selected;
        self.recompute();
    }

    /// Resets every advanced filter and the show-only-selected toggle.
    pub fn clear_filters(&mut self) {
        self.registry.filters_mut().clear();
        self.show_only_selected = false;
        self.recompute();
    }

    pub fn show_advanced_filters(&self) -> bool {
        self.show_advanced_filters
    }

    /// Shows or hides the advanced filter panel. Hiding it clears the
    /// filters. Returns the new visibility.
    pub fn toggle_advanced_filters(&mut self) -> bool {
        self.show_advanced_filters = !self.show_advanced_filters;
        if !self.show_advanced_filters {
            self.clear_filters();
        }
        self.show_advanced_filters
    }

    /// Choices for a text filter control.
    pub fn text_filter_options(&self, field: &str) -> Result<Vec<String>> {
        self.registry.filters().text_options(field, self.rows.rows())
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Sorts by a field. The row set stays in that order until the sort
    /// changes.
    pub fn sort_by(&mut self, field: impl Into<String>, dir: Dir) {
        self.set_sort(Some(SortSpec::new(field, dir)));
    }

    /// Sets or clears the sort. Clearing keeps the current row order.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
        self.recompute();
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Zero-based index of the current page.
    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    /// Number of pages; at least one.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of rows passing search and filters.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Rows on the current page.
    pub fn current_page(&self) -> Vec<&Row> {
        self.page(self.current_page)
    }

    fn page(&self, index: usize) -> Vec<&Row> {
        let rows = self.rows.rows();
        self.pages
            .get(index)
            .map(|page| page.iter().map(|&i| &rows[i]).collect())
            .unwrap_or_default()
    }

    /// Moves to the next page. Returns `false` on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.current_page + 1 >= self.pages.len() {
            return false;
        }
        self.current_page += 1;
        self.recompute();
        true
    }

    /// Moves to the previous page. Returns `false` on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.current_page == 0 {
            return false;
        }
        self.current_page -= 1;
        self.recompute();
        true
    }

    /// Jumps to a zero-based page.
    pub fn go_to_page(&mut self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            let err = TableError::PageOutOfRange {
                index,
                count: self.pages.len(),
            };
            tracing::warn!(%err, "page change rejected");
            return Err(err);
        }
        self.current_page = index;
        self.recompute();
        Ok(())
    }

    /// Snapshot of the current page.
    pub fn page_view(&self) -> PageView<'_> {
        PageView {
            version: self.rows.version(),
            page_index: self.current_page,
            page_count: self.pages.len(),
            visible_rows: self.visible_count,
            total_rows: self.rows.len(),
            rows: self.current_page(),
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Applies a selection event for the rows on the current page.
    ///
    /// On success the selected rows are synced to the host document and, when
    /// configured, published.
    pub fn apply_selection_event(&mut self, selected: &HashSet<RowKey>) -> Result<()> {
        let page = self.pages.get(self.current_page).cloned().unwrap_or_default();
        match self
            .selection
            .apply_event(self.rows.rows_mut(), &page, selected)
        {
            Ok(changed) => {
                if self.config.debug {
                    tracing::debug!(changed, selected = selected.len(), "selection event applied");
                }
            }
            Err(err) => {
                tracing::warn!(%err, "selection event rejected");
                return Err(err);
            }
        }
        self.sync_host();
        self.publish_selection();
        self.recompute();
        Ok(())
    }

    /// Selected rows across all pages, in row order.
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selection.selected(self.rows.rows())
    }

    /// Rehydrates rows from a previously captured snapshot; unmatched rows
    /// are deselected.
    pub fn restore(&mut self, prior: &[Row]) {
        self.selection.restore(self.rows.rows_mut(), prior);
        self.rows.touch();
        self.recompute();
    }

    /// Restores from the rows previously written to the host document.
    ///
    /// Returns `false` when there is nothing to restore from.
    pub fn restore_from_host(&mut self) -> Result<bool> {
        let (Some(store), Some(path)) = (&self.store, &self.path) else {
            return Ok(false);
        };
        let Some(saved) = store.read(path) else {
            return Ok(false);
        };
        let prior = Row::list_from_json(&saved)?;
        if self.config.debug {
            tracing::debug!(path = %path, rows = prior.len(), "restoring table state");
        }
        self.restore(&prior);
        self.sync_host();
        Ok(true)
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Merges edits into the rows and forwards each updated row to the
    /// persistence sink, one request per row.
    ///
    /// Sink failures are logged; the local change is kept.
    pub fn apply_edits(&mut self, edits: &[Edit]) -> Vec<Row> {
        let updated = self.edits.apply(self.rows.rows_mut(), edits);
        if !updated.is_empty() {
            self.rows.touch();
        }
        if self.config.debug {
            tracing::debug!(edits = edits.len(), updated = updated.len(), "edits merged");
        }
        self.forward_updates(&updated);
        self.sync_host();
        self.recompute();
        updated
    }

    /// Merges draft values in the host's JSON shape: a list of objects, each
    /// carrying the key field and the changed fields.
    pub fn apply_edits_json(&mut self, drafts: &Json) -> Result<Vec<Row>> {
        let items: Vec<&Json> = match drafts {
            Json::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let edits = items
            .into_iter()
            .map(|draft| Edit::from_json(draft, &self.config.key_field))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.apply_edits(&edits))
    }

    fn forward_updates(&self, updated: &[Row]) {
        let (Some(sink), Some(bundle)) = (&self.sink, &self.config.update_bundle) else {
            return;
        };
        for row in updated {
            let request = UpdateRequest::single(bundle, row.to_json());
            if self.config.debug {
                tracing::debug!(bundle = %bundle, row = %request.object_list[0], "sending update");
            }
            match sink.update(&request) {
                Ok(response) if response.has_errors => {
                    tracing::error!(bundle = %bundle, response = %response.body, "update reported errors");
                }
                Ok(response) => {
                    if self.config.debug {
                        tracing::debug!(bundle = %bundle, response = %response.body, "update accepted");
                    }
                }
                Err(err) => tracing::error!(bundle = %bundle, %err, "update failed"),
            }
        }
    }

    // ========================================================================
    // Host wiring
    // ========================================================================

    fn selected_json(&self) -> Vec<Json> {
        self.selected_rows().into_iter().map(Row::to_json).collect()
    }

    /// Writes the selected rows to the host document, if one is attached.
    pub fn sync_host(&mut self) {
        let rows = self.selected_json();
        let (Some(store), Some(path)) = (&mut self.store, &self.path) else {
            return;
        };
        if let Err(err) = store.write(path, rows) {
            tracing::warn!(%err, path = %path, "failed to sync selected rows");
        }
    }

    fn publish_selection(&self) {
        if !self.config.send_events {
            return;
        }
        let Some(bus) = &self.bus else {
            tracing::warn!("sendEvents is on but no event bus is attached");
            return;
        };
        let Some(path) = &self.path else {
            tracing::warn!("sendEvents is on but jsonPath is unset, cannot derive a channel");
            return;
        };
        let element = self
            .config
            .element_name
            .clone()
            .unwrap_or_else(|| path.element_name().to_string());
        let mut payload = Map::new();
        payload.insert(element, Json::Array(self.selected_json()));
        let publication = Publication {
            channel: channel_name(CHANNEL_PREFIX, path.step_name()),
            kind: RESULT_EVENT.to_string(),
            payload: Json::Object(payload),
            delay: self.config.publish_delay(),
        };
        if self.config.debug {
            tracing::debug!(channel = %publication.channel, "publishing selection");
        }
        if let Err(err) = bus.publish(&publication) {
            tracing::error!(%err, channel = %publication.channel, "publication failed");
        }
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    fn recompute(&mut self) {
        if let Some(sort) = &self.sort {
            if self.config.debug {
                tracing::debug!(field = %sort.field, dir = %sort.dir, "sorting rows");
            }
            sort_rows(self.rows.rows_mut(), sort);
        }

        let ctx = FilterContext {
            search_text: &self.search_text,
            columns: self.registry.columns(),
            filters: self.registry.filters(),
            show_only_selected: self.show_only_selected,
        };
        let visible: Vec<usize> = self
            .rows
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| is_visible(row, &ctx))
            .map(|(i, _)| i)
            .collect();

        self.visible_count = visible.len();
        self.pages = paginate(&visible, self.config.page_size);
        self.current_page = clamp_page_index(self.current_page, self.pages.len());
    }

    /// Footer and control state for rendering.
    pub fn status(&self) -> TableStatus {
        let page_count = self.pages.len();
        let selected = self.selected_rows().len();

        let mut total_rows_message = if self.visible_count == 1 {
            "1 Row".to_string()
        } else {
            format!("{} Rows", self.visible_count)
        };
        if self.visible_count != self.rows.len() {
            total_rows_message.push_str(" ( Filters Applied )");
        }

        TableStatus {
            pagination_message: format!("Page {} of {}", self.current_page + 1, page_count),
            total_rows_message,
            selection_message: format!("{} Selected", selected),
            show_pagination: page_count > 1,
            show_selection_message: self.config.max_row_selection > 1,
            previous_disabled: self.current_page == 0,
            next_disabled: self.current_page + 1 >= page_count,
            show_selection_column: self.selection.is_enabled(),
            show_row_number_column: self.config.show_row_number_column
                || self.registry.any_editable(),
            show_search: !self.config.hide_search,
            show_advanced_filters: self.show_advanced_filters,
        }
    }
}

/// The current page, borrowed from the processor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<'a> {
    /// Row-set version the view was taken from.
    pub version: u64,
    pub page_index: usize,
    pub page_count: usize,
    /// Rows passing search and filters.
    pub visible_rows: usize,
    /// Rows in the whole row set.
    pub total_rows: usize,
    pub rows: Vec<&'a Row>,
}

/// Footer messages and control flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatus {
    /// `"Page X of Y"`.
    pub pagination_message: String,
    /// `"N Rows"`, with `" ( Filters Applied )"` when rows are hidden.
    pub total_rows_message: String,
    /// `"N Selected"`.
    pub selection_message: String,
    pub show_pagination: bool,
    pub show_selection_message: bool,
    pub previous_disabled: bool,
    pub next_disabled: bool,
    pub show_selection_column: bool,
    pub show_row_number_column: bool,
    pub show_search: bool,
    pub show_advanced_filters: bool,
}
