use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dwv() -> Command {
    let mut cmd = Command::cargo_bin("dwv").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_raw_document(dir: &Path) -> std::path::PathBuf {
    let raw = serde_json::json!({
        "text": "Policy Title\nAnnual limit 5,000 GBP",
        "pages": [ { "tokens": [], "dimension": { "width": 612 } } ],
        "entities": [
            {
                "id": "0",
                "type": "Title",
                "confidence": 0.98,
                "mentionText": "stale",
                "textAnchor": { "textSegments": [ { "startIndex": "0", "endIndex": "12" } ] }
            },
            {
                "id": "1",
                "type": "Benefit",
                "properties": [
                    { "type": "Limit", "mentionText": "5,000 GBP" }
                ]
            }
        ]
    });
    let path = dir.join("raw.json");
    fs::write(&path, serde_json::to_vec_pretty(&raw).unwrap()).unwrap();
    path
}

#[test]
fn binary_runs() {
    dwv()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dwv"));
}

#[test]
fn refine_repairs_document() {
    let tmp = TempDir::new().unwrap();
    let input = write_raw_document(tmp.path());
    let output = tmp.path().join("cleaned.json");

    dwv()
        .args(["refine", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt 1 mentions"));

    let cleaned: serde_json::Value =
        serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(cleaned["entities"][0]["mentionText"], "Policy Title");
    assert!(cleaned.get("pages").is_none());
    assert!(cleaned["entities"][0].get("textAnchor").is_none());
}

#[test]
fn refine_rejects_invalid_document() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("bad.json");
    fs::write(&input, r#"{ "text": "body", "entities": [] }"#).unwrap();
    let output = tmp.path().join("cleaned.json");

    dwv()
        .args(["refine", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("entities"));
}

#[test]
fn export_writes_csv() {
    let tmp = TempDir::new().unwrap();
    let input = write_raw_document(tmp.path());
    let cleaned = tmp.path().join("cleaned.json");
    let csv_out = tmp.path().join("records.csv");

    dwv()
        .args(["refine", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&cleaned)
        .assert()
        .success();

    dwv()
        .args(["export", "--input"])
        .arg(&cleaned)
        .arg("--output")
        .arg(&csv_out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 rows"));

    let csv = fs::read_to_string(&csv_out).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("entity_id,entity_type"));
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Policy Title"));
}
