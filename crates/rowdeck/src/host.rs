//! Host adapter seams.
//!
//! The processor talks to its host through three narrow traits:
//!
//! - [`DataStore`]: a path-addressed JSON document the selected rows are
//!   written to and restored from
//! - [`PersistenceSink`]: receives one update request per edited row
//! - [`EventBus`]: receives selection publications
//!
//! [`JsonDocument`] is an in-memory [`DataStore`] suitable for tests and for
//! hosts that keep their document as a `serde_json::Value`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::error::{Result, TableError};

/// Prefix of the channel selection events are published on.
pub const CHANNEL_PREFIX: &str = "OS-Step-Channel";

/// Kind tag of selection publications.
pub const RESULT_EVENT: &str = "result";

/// One segment of a [`JsonPath`]: a key, optionally selecting the `n`th
/// (1-based) element when the value under that key is a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub index: Option<usize>,
}

/// Colon-separated path into a host document, e.g.
/// `Step:Container|2:Selections`.
///
/// # Example
///
/// ```
/// use rowdeck::JsonPath;
/// use serde_json::json;
///
/// let path = JsonPath::parse("Step:Items|2:Name").unwrap();
/// let doc = json!({"Step": {"Items": [{"Name": "a"}, {"Name": "b"}]}});
/// assert_eq!(path.resolve(&doc), Some(&json!("b")));
/// assert_eq!(path.step_name(), "Step");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<PathSegment>,
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>[^|:]+)(?:\|(?P<index>\d+))?$").expect("segment pattern is valid")
    })
}

impl JsonPath {
    /// Parses a path. Empty segments and a zero index are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments = raw
            .split(':')
            .map(|segment| {
                let caps = segment_pattern()
                    .captures(segment)
                    .ok_or_else(|| TableError::path(raw, format!("bad segment '{}'", segment)))?;
                let index = match caps.name("index") {
                    Some(m) => {
                        let n: usize = m
                            .as_str()
                            .parse()
                            .map_err(|_| TableError::path(raw, "index out of range"))?;
                        if n == 0 {
                            return Err(TableError::path(raw, "list indices start at 1"));
                        }
                        Some(n)
                    }
                    None => None,
                };
                Ok(PathSegment {
                    name: caps["name"].to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(JsonPath {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Name of the first segment: the step that owns the table.
    pub fn step_name(&self) -> &str {
        &self.segments[0].name
    }

    /// Name of the last segment: the element the table writes to.
    pub fn element_name(&self) -> &str {
        &self.segments[self.segments.len() - 1].name
    }

    /// Resolves the path against a document.
    ///
    /// A segment whose value is missing or falsy resolves to nothing. An
    /// indexed segment over a non-list value keeps the value as is.
    pub fn resolve<'a>(&self, doc: &'a Json) -> Option<&'a Json> {
        let mut current = doc;
        for segment in &self.segments {
            current = current.get(&segment.name).filter(|v| json_truthy(v))?;
            if let (Some(n), Json::Array(items)) = (segment.index, current) {
                current = items.get(n - 1)?;
            }
        }
        Some(current)
    }

    /// Writes a value at the path, creating intermediate objects.
    ///
    /// Indexed segments must point at an existing list element.
    pub fn write(&self, doc: &mut Json, value: Json) -> Result<()> {
        let (last, parents) = self
            .segments
            .split_last()
            .ok_or_else(|| TableError::path(&self.raw, "empty path"))?;
        let mut current = doc;
        for segment in parents {
            current = self.step_into(current, segment)?;
        }
        let object = as_object(current).ok_or_else(|| {
            TableError::path(&self.raw, format!("'{}' has a non-object parent", last.name))
        })?;
        match last.index {
            None => {
                object.insert(last.name.clone(), value);
            }
            Some(n) => {
                let slot = object
                    .get_mut(&last.name)
                    .and_then(Json::as_array_mut)
                    .and_then(|items| items.get_mut(n - 1))
                    .ok_or_else(|| TableError::path(&self.raw, format!("no element {} in '{}'", n, last.name)))?;
                *slot = value;
            }
        }
        Ok(())
    }

    fn step_into<'a>(&self, current: &'a mut Json, segment: &PathSegment) -> Result<&'a mut Json> {
        let object = as_object(current).ok_or_else(|| {
            TableError::path(&self.raw, format!("'{}' has a non-object parent", segment.name))
        })?;
        let child = object
            .entry(segment.name.clone())
            .or_insert_with(|| Json::Object(Map::new()));
        match segment.index {
            None => Ok(child),
            Some(n) => child
                .as_array_mut()
                .and_then(|items| items.get_mut(n - 1))
                .ok_or_else(|| {
                    TableError::path(&self.raw, format!("no element {} in '{}'", n, segment.name))
                }),
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn as_object(value: &mut Json) -> Option<&mut Map<String, Json>> {
    if value.is_null() {
        *value = Json::Object(Map::new());
    }
    value.as_object_mut()
}

fn json_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}

/// Path-addressed host document.
pub trait DataStore {
    /// Reads the value at a path, if any.
    fn read(&self, path: &JsonPath) -> Option<Json>;

    /// Replaces the value at a path with the given rows.
    fn write(&mut self, path: &JsonPath, rows: Vec<Json>) -> Result<()>;
}

/// Shared handle, so the host keeps access to a store it hands to a
/// processor.
impl<T: DataStore> DataStore for Rc<RefCell<T>> {
    fn read(&self, path: &JsonPath) -> Option<Json> {
        self.borrow().read(path)
    }

    fn write(&mut self, path: &JsonPath, rows: Vec<Json>) -> Result<()> {
        self.borrow_mut().write(path, rows)
    }
}

/// In-memory [`DataStore`] over a JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonDocument {
    root: Json,
}

impl JsonDocument {
    pub fn new(root: Json) -> Self {
        JsonDocument { root }
    }

    pub fn root(&self) -> &Json {
        &self.root
    }

    pub fn into_inner(self) -> Json {
        self.root
    }
}

impl DataStore for JsonDocument {
    fn read(&self, path: &JsonPath) -> Option<Json> {
        path.resolve(&self.root).cloned()
    }

    fn write(&mut self, path: &JsonPath, rows: Vec<Json>) -> Result<()> {
        path.write(&mut self.root, Json::Array(rows))
    }
}

/// Update request for one edited row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Identifier of the remote update bundle.
    pub bundle_name: String,
    pub bulk_upload: bool,
    pub ignore_cache: bool,
    pub input_type: String,
    /// Rows to persist. Always exactly one.
    pub object_list: Vec<Json>,
}

impl UpdateRequest {
    /// Request persisting a single row.
    pub fn single(bundle_name: impl Into<String>, row: Json) -> Self {
        UpdateRequest {
            bundle_name: bundle_name.into(),
            bulk_upload: false,
            ignore_cache: true,
            input_type: "JSON".to_string(),
            object_list: vec![row],
        }
    }
}

/// Response from a [`PersistenceSink`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SinkResponse {
    /// The remote side reported a failure.
    pub has_errors: bool,
    /// Raw response body, for logging.
    pub body: Json,
}

impl SinkResponse {
    /// A successful response.
    pub fn ok(body: Json) -> Self {
        SinkResponse {
            has_errors: false,
            body,
        }
    }

    /// A response that reports errors.
    pub fn failed(body: Json) -> Self {
        SinkResponse {
            has_errors: true,
            body,
        }
    }
}

/// Receiver of edited rows.
///
/// Called once per updated row. Implementations that talk to a remote
/// service are expected to dispatch without blocking the caller; the
/// processor only logs the outcome.
pub trait PersistenceSink {
    fn update(&self, request: &UpdateRequest) -> Result<SinkResponse>;
}

/// An outbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub channel: String,
    pub kind: String,
    pub payload: Json,
    /// How long the bus should wait before delivering, to let host-side
    /// state settle.
    #[serde(skip)]
    pub delay: Duration,
}

/// Channel name for a step: `"<prefix>-<step>"`.
pub fn channel_name(prefix: &str, step: &str) -> String {
    format!("{}-{}", prefix, step)
}

/// Pub/sub bus selection events are published to.
pub trait EventBus {
    fn publish(&self, publication: &Publication) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_segments() {
        let path = JsonPath::parse("AddOns:Container|1:Selected").unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.segments()[1].index, Some(1));
        assert_eq!(path.step_name(), "AddOns");
        assert_eq!(path.element_name(), "Selected");
        assert_eq!(path.to_string(), "AddOns:Container|1:Selected");
    }

    #[test]
    fn parse_rejects_bad_paths() {
        assert!(JsonPath::parse("").is_err());
        assert!(JsonPath::parse("a::b").is_err());
        assert!(JsonPath::parse("a|0").is_err());
        assert!(JsonPath::parse("a|x").is_err());
    }

    #[test]
    fn resolve_indexed_and_missing() {
        let doc = json!({"S": {"L": [{"v": 1}, {"v": 2}], "Zero": 0}});
        let hit = JsonPath::parse("S:L|2:v").unwrap();
        assert_eq!(hit.resolve(&doc), Some(&json!(2)));
        assert_eq!(JsonPath::parse("S:L|3:v").unwrap().resolve(&doc), None);
        assert_eq!(JsonPath::parse("S:Nope").unwrap().resolve(&doc), None);
        assert_eq!(JsonPath::parse("S:Zero").unwrap().resolve(&doc), None);
    }

    #[test]
    fn write_creates_intermediate_objects() {
        let mut doc = JsonDocument::default();
        let path = JsonPath::parse("Step:Table").unwrap();
        doc.write(&path, vec![json!({"Id": 1})]).unwrap();
        assert_eq!(doc.root(), &json!({"Step": {"Table": [{"Id": 1}]}}));
        assert_eq!(doc.read(&path), Some(json!([{"Id": 1}])));
    }

    #[test]
    fn write_through_list_element() {
        let mut doc = JsonDocument::new(json!({"S": {"L": [{}, {}]}}));
        let path = JsonPath::parse("S:L|2:T").unwrap();
        doc.write(&path, vec![]).unwrap();
        assert_eq!(doc.root(), &json!({"S": {"L": [{}, {"T": []}]}}));

        let missing = JsonPath::parse("S:L|5:T").unwrap();
        assert!(doc.write(&missing, vec![]).is_err());
    }

    #[test]
    fn update_request_shape() {
        let request = UpdateRequest::single("UpdateAccounts", json!({"Id": 1}));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "bundleName": "UpdateAccounts",
                "bulkUpload": false,
                "ignoreCache": true,
                "inputType": "JSON",
                "objectList": [{"Id": 1}],
            })
        );
    }

    #[test]
    fn channel_names() {
        assert_eq!(channel_name(CHANNEL_PREFIX, "Select"), "OS-Step-Channel-Select");
    }
}
