//! Runs the `rowdeck` binary against JSON fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value as Json};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(config: Json, rows: Json) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), config.to_string()).unwrap();
        fs::write(dir.path().join("rows.json"), rows.to_string()).unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, json: Json) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, json.to_string()).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_rowdeck"))
            .arg("--config")
            .arg(self.path("config.json"))
            .arg("--rows")
            .arg(self.path("rows.json"))
            .args(args)
            .output()
            .unwrap()
    }

    fn report(&self, args: &[&str]) -> Json {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "rowdeck failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn parts(n: i64) -> Json {
    Json::Array(
        (1..=n)
            .map(|i| json!({"Id": i, "Name": format!("part {}", i), "Qty": i * 10}))
            .collect(),
    )
}

fn page_ids(report: &Json) -> Vec<i64> {
    report["page"]["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Id"].as_i64().unwrap())
        .collect()
}

fn read(path: &Path) -> Json {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn prints_first_page_and_status() {
    let fixture = Fixture::new(json!({"keyField": "Id"}), parts(25));
    let report = fixture.report(&[]);

    assert_eq!(page_ids(&report), (1..=10).collect::<Vec<_>>());
    assert_eq!(report["page"]["pageCount"], 3);
    assert_eq!(report["status"]["paginationMessage"], "Page 1 of 3");
    assert_eq!(report["status"]["totalRowsMessage"], "25 Rows");
}

#[test]
fn sorts_filters_and_pages() {
    let fixture = Fixture::new(
        json!({
            "keyField": "Id",
            "pageSize": "5",
            "columns": [{"fieldName": "Qty", "type": "number", "filterable": true}]
        }),
        parts(25),
    );
    // pageSize given as a string is not accepted.
    assert!(!fixture.run(&[]).status.success());

    let fixture = Fixture::new(
        json!({
            "keyField": "Id",
            "pageSize": 5,
            "columns": [{"fieldName": "Qty", "type": "number", "filterable": true}]
        }),
        parts(25),
    );
    let report = fixture.report(&["--sort", "Qty", "--dir", "desc", "--min", "Qty=100", "--page", "2"]);
    assert_eq!(page_ids(&report), [20, 19, 18, 17, 16]);
    assert_eq!(report["status"]["totalRowsMessage"], "16 Rows ( Filters Applied )");
    assert_eq!(report["status"]["paginationMessage"], "Page 2 of 4");
}

#[test]
fn search_is_applied() {
    let fixture = Fixture::new(
        json!({"keyField": "Id", "columns": [{"fieldName": "Name"}]}),
        parts(25),
    );
    let report = fixture.report(&["--search", "PART 2"]);
    assert_eq!(report["page"]["visibleRows"], 7);
}

#[test]
fn selection_is_written_to_document_and_published() {
    let fixture = Fixture::new(
        json!({
            "keyField": "Id",
            "jsonPath": "PickParts:Selected",
            "sendEvents": "true"
        }),
        parts(3),
    );
    let document = fixture.path("document.json");
    let report = fixture.report(&["--select", "2", "--document", document.to_str().unwrap()]);

    assert_eq!(report["status"]["selectionMessage"], "1 Selected");
    assert_eq!(report["events"][0]["channel"], "OS-Step-Channel-PickParts");
    assert_eq!(report["events"][0]["payload"]["Selected"][0]["Id"], 2);

    let saved = read(&document);
    assert_eq!(saved["PickParts"]["Selected"][0]["Id"], 2);

    // A second run restores the selection from the document.
    let report = fixture.report(&["--document", document.to_str().unwrap(), "--only-selected"]);
    assert_eq!(page_ids(&report), [2]);
}

#[test]
fn edits_produce_update_requests() {
    let fixture = Fixture::new(
        json!({"keyField": "Id", "updateBundle": "UpdateParts"}),
        parts(3),
    );
    let edits = fixture.write("edits.json", json!([{"Id": 3, "Qty": 5}]));
    let report = fixture.report(&["--edits", edits.to_str().unwrap()]);

    let updates = report["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["bundleName"], "UpdateParts");
    assert_eq!(updates[0]["objectList"][0]["Qty"], 5);
    assert_eq!(updates[0]["objectList"][0]["Name"], "part 3");
}

#[test]
fn lists_text_filter_options() {
    let fixture = Fixture::new(
        json!({"keyField": "Id", "columns": [{"fieldName": "Kind", "filterable": true}]}),
        json!([
            {"Id": 1, "Kind": "bolt"},
            {"Id": 2, "Kind": "nut"},
            {"Id": 3, "Kind": "bolt"}
        ]),
    );
    let report = fixture.report(&["--options", "Kind", "--filter", "Kind=nut"]);
    assert_eq!(report["options"], json!(["", "bolt", "nut"]));
    assert_eq!(page_ids(&report), [2]);
}

#[test]
fn rejects_bad_input() {
    let fixture = Fixture::new(json!({"keyField": "Id"}), parts(3));
    assert!(!fixture.run(&["--page", "0"]).status.success());
    assert!(!fixture.run(&["--page", "9"]).status.success());
    assert!(!fixture.run(&["--min", "Qty"]).status.success());

    let fixture = Fixture::new(json!({"keyField": "Id"}), json!([{"Id": 1}, {"Id": 1}]));
    let output = fixture.run(&[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate row key"));
}
