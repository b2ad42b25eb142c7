use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn loglens(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("loglens").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn write_config(data_dir: &Path, log_root: &Path) {
    fs::create_dir_all(data_dir).unwrap();
    fs::write(
        data_dir.join("config.toml"),
        format!(
            "[sources.codex]\nenabled = true\nlog_root = \"{}\"\n",
            log_root.display()
        ),
    )
    .unwrap();
}

fn write_session(root: &Path, name: &str) {
    fs::create_dir_all(root).unwrap();
    fs::write(
        root.join(name),
        concat!(
            r#"{"type":"session_meta","payload":{"id":"sess-cli-test","cwd":"/work/app"}}"#,
            "\n",
            r#"{"type":"event_msg","payload":{"type":"user_message","message":"Add web api handler"}}"#,
            "\n",
            r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"Handler added."}]}}"#,
            "\n",
        ),
    )
    .unwrap();
}

#[test]
fn classify_reports_user_event() {
    let dir = TempDir::new().unwrap();
    loglens(dir.path())
        .args(["classify", "--line"])
        .arg(r#"{"type":"event_msg","payload":{"type":"user_message","message":"Implement X"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: user"))
        .stdout(predicate::str::contains("text: Implement X"));
}

#[test]
fn classify_reports_drops() {
    let dir = TempDir::new().unwrap();
    loglens(dir.path())
        .args(["classify", "--line"])
        .arg(r#"{"type":"event_msg","payload":{"type":"token_count"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("dropped: empty_text"));
}

#[test]
fn classify_marks_code_edits_tool_like() {
    let dir = TempDir::new().unwrap();
    loglens(dir.path())
        .args(["classify", "--line"])
        .arg(
            r#"{"type":"response_item","payload":{"type":"function_call","name":"apply_patch","arguments":"{\"patch\":\"*** Begin Patch\"}","call_id":"c9"}}"#,
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: code_edit"))
        .stdout(predicate::str::contains("tool_like: true"));
}

#[test]
fn classify_rejects_malformed_records() {
    let dir = TempDir::new().unwrap();
    loglens(dir.path())
        .args(["classify", "--line", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn sessions_on_empty_store_hints_at_indexing() {
    let dir = TempDir::new().unwrap();
    loglens(dir.path())
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions indexed"));
}

#[test]
fn index_then_list_show_and_search() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let log_root = dir.path().join("sessions");
    write_config(&data_dir, &log_root);
    write_session(&log_root, "rollout-1.jsonl");

    loglens(&data_dir)
        .args(["index", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 1 session(s)"));

    loglens(&data_dir)
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("sess-cli-tes"))
        .stdout(predicate::str::contains("full"));

    loglens(&data_dir)
        .args(["show", "sess-cli-test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Add web api handler"))
        .stdout(predicate::str::contains("Handler added."));

    loglens(&data_dir)
        .args(["search", "web", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Add web api handler"));

    // Conjunctive: a token that appears nowhere kills the match
    loglens(&data_dir)
        .args(["search", "web", "nonexistentterm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
}

#[test]
fn search_falls_back_to_raw_files_before_indexing() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let log_root = dir.path().join("sessions");
    write_config(&data_dir, &log_root);
    write_session(&log_root, "rollout-1.jsonl");

    // No `index update` has run; the index is empty
    loglens(&data_dir)
        .args(["search", "web", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Add web api handler"))
        .stdout(predicate::str::contains("[raw]"));
}

#[test]
fn json_format_emits_machine_readable_output() {
    let dir = TempDir::new().unwrap();
    loglens(dir.path())
        .args(["--format", "json", "classify", "--line"])
        .arg(r#"{"type":"event_msg","payload":{"type":"user_message","message":"Implement X"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\": \"event\""));
}
