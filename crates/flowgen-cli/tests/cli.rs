//! Tests for the `flowgen compile` command.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const DOOR: &str = r#"{
    "name": "Door",
    "class": {
        "name": "Door",
        "variables": [{ "id": 1, "name": "open", "ty": { "Primitive": "Bool" } }],
        "events": [{ "id": 2, "name": "Start", "entry": 10 }]
    },
    "nodes": [
        {
            "id": 10,
            "node": {
                "kind": "set_value",
                "target": { "Variable": { "Field": 1 } },
                "value": { "Literal": { "Bool": true } }
            }
        }
    ]
}"#;

/// Door whose only node reads an unconnected port.
const BROKEN: &str = r#"{
    "name": "Broken",
    "class": {
        "name": "Broken",
        "events": [{ "id": 2, "name": "Start", "entry": 10 }]
    },
    "nodes": [{ "id": 10, "node": { "kind": "invoke", "call": "Unassigned" } }]
}"#;

fn flowgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowgen"))
        .args(args)
        .output()
        .expect("binary should execute")
}

fn write_input(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn compile_writes_source_and_map() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "door.json", DOOR);
    let out = dir.path().join("out");
    let output = flowgen(&[
        "compile",
        "--input",
        &input,
        "--output-dir",
        out.to_str().unwrap(),
        "--namespace",
        "Game.Doors",
        "--source-map",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));

    let source = fs::read_to_string(out.join("Door.cs")).unwrap();
    assert!(source.contains("namespace Game.Doors {"), "{source}");
    assert!(source.contains("open = true;"), "{source}");
    assert!(!source.contains("/*#"), "{source}");

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("Door.map.json")).unwrap()).unwrap();
    let spans = map["spans"].as_array().unwrap();
    assert!(spans.iter().any(|s| s["id"] == "n10"), "{map}");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["diagnostics"].as_array().unwrap().len(), 0);
}

#[test]
fn generation_error_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "broken.json", BROKEN);
    let output = flowgen(&[
        "compile",
        "--input",
        &input,
        "--output-dir",
        dir.path().join("out").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Generation error"));
}

#[test]
fn batched_failure_exits_with_two_and_still_writes() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "broken.json", BROKEN);
    let out = dir.path().join("out");
    let output = flowgen(&[
        "compile",
        "--input",
        &input,
        "--output-dir",
        out.to_str().unwrap(),
        "--batched",
        "4",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let source = fs::read_to_string(out.join("Broken.cs")).unwrap();
    assert!(source.contains("/* flowgen: node 10"), "{source}");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["diagnostics"][0]["node"], 10);
}

#[test]
fn missing_input_exits_with_three() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let output = flowgen(&["compile", "--input", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn config_file_is_layered_under_flags() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "door.json", DOOR);
    let config = write_input(
        dir.path(),
        "config.json",
        r#"{ "namespace": "FromFile", "header": false }"#,
    );
    let out = dir.path().join("out");
    let output = flowgen(&[
        "compile",
        "--input",
        &input,
        "--output-dir",
        out.to_str().unwrap(),
        "--config",
        &config,
        "--optimize",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let source = fs::read_to_string(out.join("Door.cs")).unwrap();
    assert!(source.starts_with("namespace FromFile {"), "{source}");
    assert!(source.contains("GetVariable(string name)"), "{source}");
}
