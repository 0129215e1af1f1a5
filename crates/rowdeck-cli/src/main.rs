//! Code for the `rowdeck` executable.
//!
//! Loads a table configuration and a row source from JSON files, drives the
//! pipeline with the given search, filters, sort, page, selection and edits,
//! and prints the resulting page and status as JSON.
mod outbox;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io::stderr;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rowdeck::{
    Dir, FilterInput, JsonDocument, PageView, Publication, RowKey, TableConfig, TableStatus,
    TabularDataProcessor, UpdateRequest,
};
use serde::Serialize;
use serde_json::Value as Json;
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::outbox::Outbox;

#[derive(Parser, Debug)]
#[command(name = "rowdeck", version, about)]
struct Args {
    /// Table configuration (JSON object with camelCase keys)
    #[arg(short, long)]
    config: PathBuf,
    /// Row source: a JSON list of objects, or a single object
    #[arg(short, long)]
    rows: PathBuf,
    /// Global search text
    #[arg(short, long)]
    search: Option<String>,
    /// Field to sort by, overriding sortedBy
    #[arg(long)]
    sort: Option<String>,
    /// Sort direction (asc or desc), overriding sortedDirection
    #[arg(long)]
    dir: Option<Dir>,
    /// Text filter value
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
    /// Lower bound of a numeric or date filter
    #[arg(long = "min", value_name = "FIELD=VALUE")]
    mins: Vec<String>,
    /// Upper bound of a numeric or date filter
    #[arg(long = "max", value_name = "FIELD=VALUE")]
    maxs: Vec<String>,
    /// Turn on a boolean filter
    #[arg(long = "flag", value_name = "FIELD")]
    flags: Vec<String>,
    /// Show only selected rows
    #[arg(long)]
    only_selected: bool,
    /// 1-based page to show
    #[arg(short, long, default_value_t = 1)]
    page: usize,
    /// Keys to select on the shown page
    #[arg(long = "select", value_name = "KEY")]
    select: Vec<String>,
    /// Draft values to merge: a JSON list of objects carrying the key field
    #[arg(long)]
    edits: Option<PathBuf>,
    /// Host document selections are restored from and written back to
    #[arg(long)]
    document: Option<PathBuf>,
    /// List the choices of a text filter
    #[arg(long, value_name = "FIELD")]
    options: Option<String>,
    /// Narrate pipeline activity on stderr
    #[arg(long)]
    debug: bool,
}

/// What gets printed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    page: PageView<'a>,
    status: TableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    updates: Vec<UpdateRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<Publication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<Json>,
}

fn start_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };
    let subscriber = Registry::default().with(
        fmt::layer()
            .without_time()
            .with_writer(stderr)
            .with_filter(filter),
    );

    set_global_default(subscriber).context("unable to set global subscriber")?;

    Ok(())
}

fn read_json(path: &Path) -> Result<Json> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Splits a `FIELD=VALUE` argument.
fn field_value(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field, value)),
        _ => bail!("expected FIELD=VALUE, got '{}'", arg),
    }
}

fn load_config(args: &Args) -> Result<TableConfig> {
    let text = fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read {}", args.config.display()))?;
    let mut config = TableConfig::from_json_str(&text)
        .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;
    if args.debug {
        config.debug = true;
    }
    if let Some(field) = &args.sort {
        config.sorted_by = Some(field.clone());
    }
    if let Some(dir) = args.dir {
        config.sorted_direction = dir;
    }
    Ok(config)
}

fn apply_filters(table: &mut TabularDataProcessor, args: &Args) -> Result<()> {
    if let Some(search) = &args.search {
        table.set_search(search.as_str());
    }
    for arg in &args.filters {
        let (field, value) = field_value(arg)?;
        table.set_filter(field, FilterInput::Text(Some(value.to_string())))?;
    }
    for arg in &args.mins {
        let (field, value) = field_value(arg)?;
        table.set_filter(field, FilterInput::Min(Some(value.to_string())))?;
    }
    for arg in &args.maxs {
        let (field, value) = field_value(arg)?;
        table.set_filter(field, FilterInput::Max(Some(value.to_string())))?;
    }
    for field in &args.flags {
        table.set_filter(field, FilterInput::Toggle)?;
    }
    if args.only_selected {
        table.set_show_only_selected(true);
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let outbox = Outbox::default();
    let document = match &args.document {
        Some(path) if path.exists() => Some(read_json(path)?),
        Some(_) => Some(Json::Object(Default::default())),
        None => None,
    };
    let store = document.map(|root| Rc::new(RefCell::new(JsonDocument::new(root))));

    let mut table = TabularDataProcessor::new(config)?
        .with_sink(outbox.clone())
        .with_bus(outbox.clone());
    if let Some(store) = &store {
        table = table.with_store(Rc::clone(store));
    }

    let rows = read_json(&args.rows)?;
    table
        .set_rows_json(&rows)
        .with_context(|| format!("Invalid rows in {}", args.rows.display()))?;
    if table.restore_from_host()? {
        tracing::info!("restored selection from host document");
    }

    apply_filters(&mut table, &args)?;

    if args.page == 0 {
        bail!("pages are numbered from 1");
    }
    table.go_to_page(args.page - 1)?;

    if !args.select.is_empty() {
        let keys: HashSet<RowKey> = args.select.iter().map(|k| RowKey::from(k.as_str())).collect();
        table.apply_selection_event(&keys)?;
    }

    if let Some(path) = &args.edits {
        let drafts = read_json(path)?;
        table
            .apply_edits_json(&drafts)
            .with_context(|| format!("Invalid edits in {}", path.display()))?;
    }

    let options = args
        .options
        .as_deref()
        .map(|field| table.text_filter_options(field))
        .transpose()?;

    let document = store.as_ref().map(|store| store.borrow().root().clone());
    if let (Some(path), Some(root)) = (&args.document, &document) {
        let text = serde_json::to_string_pretty(root)?;
        fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let report = Report {
        page: table.page_view(),
        status: table.status(),
        options,
        updates: outbox.updates(),
        events: outbox.events(),
        document,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    start_logging(args.debug)?;
    run(args)
}
