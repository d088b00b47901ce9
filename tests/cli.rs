use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const VALID_BODY: &str = "### Collection Name\nPage Tools\n\n\
### Description\nSmall helpers.\n\n\
### Category\nutilities\n\n\
### GitHub Username\n@tess\n\n\
### Commands JSON\n```json\n[{\"name\": \"Print\", \"description\": \"Print page\", \"code\": \"window.print();\"}]\n```\n\n\
### Checklist\n- [x] I tested these commands\n";

fn run_tool(bin: &str, home: &Path, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env("HOME", home)
        .output()
        .expect("run tool")
}

fn write(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn validate_exits_zero_when_valid() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "sub.md", VALID_BODY);
    let out = run_tool(env!("CARGO_BIN_EXE_gate-validate"), tmp.path(), &[&input]);
    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let result: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["valid"], true);
}

#[test]
fn validate_exits_one_when_invalid() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "sub.md", "### Collection Name\nEmpty\n");
    let out = run_tool(env!("CARGO_BIN_EXE_gate-validate"), tmp.path(), &[&input]);
    assert_eq!(out.status.code(), Some(1));
    let result: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["valid"], false);
    assert!(!result["errors"].as_array().unwrap().is_empty());
}

#[test]
fn missing_input_exits_two() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.md");
    let missing = missing.to_str().unwrap();
    for bin in [
        env!("CARGO_BIN_EXE_gate-validate"),
        env!("CARGO_BIN_EXE_gate-extract"),
        env!("CARGO_BIN_EXE_collection-gate"),
    ] {
        let out = run_tool(bin, tmp.path(), &[missing]);
        assert_eq!(out.status.code(), Some(2), "{bin}");
        assert!(out.stdout.is_empty(), "{bin}");
    }
}

#[test]
fn failed_write_still_prints_outcome() {
    let tmp = TempDir::new().unwrap();
    let input = write(
        tmp.path(),
        "sub.md",
        &VALID_BODY.replace("@tess", "@tess/alt"),
    );
    let store = tmp.path().join("store");
    let out = run_tool(
        env!("CARGO_BIN_EXE_collection-gate"),
        tmp.path(),
        &[
            &input,
            "--store",
            store.to_str().unwrap(),
            "--approver",
            "maintainer",
        ],
    );
    assert_eq!(out.status.code(), Some(2));
    let outcome: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(outcome["decision"]["recommendation"].is_string());
    assert!(outcome["materializeError"].is_string());
    assert!(outcome.get("materialized").is_none());
}
