//! Integration tests for the `td` CLI.
//!
//! Each test creates a temp store, runs `td` as a subprocess, and
//! verifies stdout, exit codes, and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Get the path to the built `td` binary.
fn td_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("td");
    path
}

fn td(root: &Path, args: &[&str]) -> Output {
    Command::new(td_bin())
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run td")
}

fn td_ok(root: &Path, args: &[&str]) -> String {
    let out = td(root, args);
    assert!(
        out.status.success(),
        "td {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8(out.stdout).unwrap()
}

fn init_store(root: &Path) {
    td_ok(root, &["init"]);
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Extract the backticked ID from "Added todo `todo-...`" output.
fn added_id(stdout: &str) -> String {
    let start = stdout.find('`').expect("no id in output") + 1;
    let end = stdout.rfind('`').unwrap();
    stdout[start..end].to_string()
}

// ============================================================================
// Setup
// ============================================================================

#[test]
fn init_creates_data_file() {
    let tmp = TempDir::new().unwrap();
    let out = td_ok(tmp.path(), &["init"]);
    assert!(out.contains("Initialized"));
    assert!(tmp.path().join("taskdeck/data.json").is_file());
}

#[test]
fn init_refuses_second_time_without_force() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    let out = td(tmp.path(), &["init"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already exists"));
    assert!(td(tmp.path(), &["init", "--force"]).status.success());
}

#[test]
fn commands_fail_without_store() {
    let tmp = TempDir::new().unwrap();
    let out = td(tmp.path(), &["list"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("td init"));
}

// ============================================================================
// Project / todo / subtask lifecycle
// ============================================================================

#[test]
fn full_lifecycle() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    td_ok(tmp.path(), &["project", "Groceries"]);
    let todo_id = added_id(&td_ok(tmp.path(), &["add", "Groceries", "Buy milk"]));
    let sub_id = added_id(&td_ok(tmp.path(), &["sub", &todo_id, "check the fridge"]));

    let listing = td_ok(tmp.path(), &["list"]);
    assert!(listing.contains("Groceries"));
    assert!(listing.contains("[ ] Buy milk"));
    assert!(listing.contains("[ ] check the fridge"));

    td_ok(tmp.path(), &["done", &sub_id]);
    td_ok(tmp.path(), &["done", &todo_id]);
    let listing = td_ok(tmp.path(), &["list"]);
    assert!(listing.contains("[x] Buy milk"));
    assert!(listing.contains("[x] check the fridge"));

    td_ok(tmp.path(), &["done", &todo_id, "--undo"]);
    let listing = td_ok(tmp.path(), &["list"]);
    assert!(listing.contains("[ ] Buy milk"));

    td_ok(tmp.path(), &["delete", &todo_id]);
    let listing = td_ok(tmp.path(), &["list"]);
    assert!(!listing.contains("Buy milk"));
}

#[test]
fn done_unknown_id_fails() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    let out = td(tmp.path(), &["done", "todo-nope"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("todo-nope"));
}

#[test]
fn list_json_shape() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    td_ok(tmp.path(), &["project", "Alpha"]);
    td_ok(tmp.path(), &["add", "Alpha", "first thing"]);

    let out = td_ok(tmp.path(), &["--json", "list"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["total_projects"], 1);
    assert_eq!(parsed["total_todos"], 1);
    assert_eq!(parsed["projects"][0]["name"], "Alpha");
    assert_eq!(parsed["projects"][0]["todos"][0]["text"], "first thing");
}

#[test]
fn search_finds_and_records() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    td_ok(tmp.path(), &["project", "Reading"]);
    td_ok(tmp.path(), &["add", "Reading", "finish the novel"]);

    let out = td_ok(tmp.path(), &["--json", "search", "NOVEL"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["matches"][0]["kind"], "todo");
    assert_eq!(parsed["matches"][0]["text"], "finish the novel");

    // The search term lands in the persisted history
    let data = fs::read_to_string(tmp.path().join("taskdeck/data.json")).unwrap();
    assert!(data.contains("NOVEL"));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn check_passes_on_fresh_store() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    let out = td_ok(tmp.path(), &["check"]);
    assert!(out.contains("OK"));
}

#[test]
fn check_reports_errors_on_broken_file() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    let bad = tmp.path().join("bad.json");
    fs::write(&bad, r#"{ "version": 1, "projects": "nope" }"#).unwrap();

    let out = td(tmp.path(), &["check", "--file", bad.to_str().unwrap()]);
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("error:"));
}

#[test]
fn check_json_output() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    let out = td_ok(tmp.path(), &["--json", "check"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["valid"], true);
}

// ============================================================================
// Import / export
// ============================================================================

#[test]
fn import_todoist_dry_run_does_not_commit() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    let fx = fixture("todoist_export.json");
    let out = td_ok(
        tmp.path(),
        &["import", fx.to_str().unwrap(), "--dry-run"],
    );
    assert!(out.contains("Would import"));
    assert!(out.contains("2 project(s)"));

    let listing = td_ok(tmp.path(), &["list"]);
    assert!(!listing.contains("Website"));
}

#[test]
fn import_todoist_commits_and_backs_up() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    let fx = fixture("todoist_export.json");
    let out = td_ok(tmp.path(), &["import", fx.to_str().unwrap(), "--yes"]);
    assert!(out.contains("Imported 2 project(s)"));
    assert!(out.contains("跳过收件箱项目"));

    let listing = td_ok(tmp.path(), &["list"]);
    assert!(listing.contains("Website"));
    assert!(listing.contains("Design homepage"));

    // The pre-import state was backed up first
    let backups = td_ok(tmp.path(), &["backup", "list"]);
    assert!(backups.contains("backup-"));
}

#[test]
fn import_without_yes_is_not_committed() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    // Command::output() closes the child's stdin, so the confirmation
    // prompt reads an empty answer and declines
    let fx = fixture("todoist_export.json");
    let out = td_ok(tmp.path(), &["import", fx.to_str().unwrap()]);
    assert!(out.contains("Import cancelled."));

    let listing = td_ok(tmp.path(), &["list"]);
    assert!(!listing.contains("Website"));
}

#[test]
fn import_commits_when_confirmed_on_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    let fx = fixture("todoist_export.json");
    let mut child = Command::new(td_bin())
        .arg("-C")
        .arg(tmp.path())
        .args(["import", fx.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn td");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"y\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Imported 2 project(s)"));

    let listing = td_ok(tmp.path(), &["list"]);
    assert!(listing.contains("Website"));
}

#[test]
fn import_trello_json_preview() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    let fx = fixture("trello_export.json");
    let out = td_ok(
        tmp.path(),
        &["--json", "import", fx.to_str().unwrap(), "--dry-run"],
    );
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["format"]["format"], "trello");
    assert_eq!(parsed["committed"], false);
    assert_eq!(parsed["projects"], 2);
    assert_eq!(parsed["validation"]["valid"], true);
    assert!(parsed["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w.as_str().unwrap().contains("跳过空列表")));
}

#[test]
fn import_unknown_format_fails() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    let bad = tmp.path().join("mystery.json");
    fs::write(&bad, r#"{ "foo": [1, 2, 3] }"#).unwrap();

    let out = td(tmp.path(), &["import", bad.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("无法识别的文件格式"));
}

#[test]
fn export_then_import_round_trips() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());
    td_ok(tmp.path(), &["project", "Keep me"]);
    td_ok(tmp.path(), &["add", "Keep me", "survive the trip"]);

    let exported = tmp.path().join("export.json");
    td_ok(tmp.path(), &["export", exported.to_str().unwrap()]);

    td_ok(tmp.path(), &["init", "--force"]);
    assert!(!td_ok(tmp.path(), &["list"]).contains("Keep me"));

    td_ok(tmp.path(), &["import", exported.to_str().unwrap(), "--yes"]);
    let listing = td_ok(tmp.path(), &["list"]);
    assert!(listing.contains("Keep me"));
    assert!(listing.contains("survive the trip"));
}

// ============================================================================
// Backups
// ============================================================================

#[test]
fn backup_create_list_prune() {
    let tmp = TempDir::new().unwrap();
    init_store(tmp.path());

    let out = td_ok(tmp.path(), &["backup"]);
    assert!(out.contains("Wrote backup"));

    let out = td_ok(tmp.path(), &["--json", "backup", "list"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["backups"].as_array().unwrap().len(), 1);

    let out = td_ok(tmp.path(), &["backup", "prune", "--keep", "0"]);
    assert!(out.contains("Removed 1"));
    let out = td_ok(tmp.path(), &["backup", "list"]);
    assert!(out.contains("No backups."));
}
