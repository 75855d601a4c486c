use std::error::Error;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(data_dir: &Path) -> Result<Command, Box<dyn Error>> {
    let mut command = Command::cargo_bin("codehub")?;
    command
        .env_remove("CODEHUB_HOME")
        .env_remove("CODEHUB_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    Ok(command)
}

fn stdout_of(command: &mut Command) -> Result<String, Box<dyn Error>> {
    let output = command.output()?;
    assert!(output.status.success(), "command failed: {output:?}");
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Create project, create file, write content, then read it back from a fresh process.
#[test]
fn content_written_in_one_run_is_read_in_the_next() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;

    let project = stdout_of(cli(data.path())?.args(["new-project", "P1"]))?;
    let file = stdout_of(cli(data.path())?.args(["new-file", "a.txt"]))?;
    assert!(!project.is_empty());
    assert_ne!(project, file);

    cli(data.path())?
        .args(["write", "a.txt", "--text", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 5 bytes to a.txt"));

    cli(data.path())?
        .args(["cat", &file, "--project", "P1"])
        .assert()
        .success()
        .stdout("hello");

    let stored = fs::read_to_string(data.path().join("codehub-projects.json"))?;
    let parsed: serde_json::Value = serde_json::from_str(&stored)?;
    assert_eq!(parsed[0]["name"], "P1");
    assert_eq!(parsed[0]["files"][0]["name"], "a.txt");
    assert_eq!(parsed[0]["files"][0]["content"], "hello");
    Ok(())
}

#[test]
fn new_file_without_a_project_shows_the_notice() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    cli(data.path())?
        .args(["new-file", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("create a project before adding files"));
    Ok(())
}

#[test]
fn blank_project_name_is_rejected() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    cli(data.path())?
        .args(["new-project", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be blank"));
    cli(data.path())?
        .arg("projects")
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects yet."));
    Ok(())
}

#[test]
fn corrupt_storage_is_treated_as_empty() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    fs::write(data.path().join("codehub-projects.json"), "definitely not json")?;
    cli(data.path())?
        .arg("projects")
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects yet."));
    Ok(())
}

#[test]
fn replay_applies_intents_and_prints_the_view() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    let script = data.path().join("script.jsonl");
    fs::write(
        &script,
        r#"# open a, b, c then close b
{"intent":"create_file","name":"orphan.txt"}
{"intent":"create_project","name":"Demo"}
{"intent":"create_file","name":"a"}
{"intent":"create_file","name":"b"}
{"intent":"create_file","name":"c"}
{"intent":"edit_content","text":"c body"}
"#,
    )?;

    let output = stdout_of(cli(data.path())?.arg("replay").arg(&script))?;
    let view: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(view["projects"][0]["name"], "Demo");
    assert_eq!(view["tabs"].as_array().map(Vec::len), Some(3));
    assert_eq!(view["tabs"][2]["active"], true);
    assert_eq!(view["editor"], "c body");

    let b_id = view["tabs"][1]["id"].as_str().unwrap_or_default().to_string();
    let project_id = view["projects"][0]["id"].as_str().unwrap_or_default().to_string();
    fs::write(
        &script,
        format!(
            "{{\"intent\":\"select_project\",\"project\":\"{project_id}\"}}\n\
             {{\"intent\":\"open_file\",\"file\":\"{b_id}\"}}\n\
             {{\"intent\":\"close_tab\",\"tab\":\"{b_id}\"}}\n"
        ),
    )?;
    let output = stdout_of(cli(data.path())?.arg("replay").arg(&script))?;
    let view: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(view["tabs"].as_array().map(Vec::len), Some(0));
    assert_eq!(view["editor"], "");
    Ok(())
}

#[test]
fn replay_reports_malformed_lines() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    let script = data.path().join("bad.jsonl");
    fs::write(&script, "{\"intent\":\"rename_file\"}\n")?;
    cli(data.path())?
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1: invalid intent"));
    Ok(())
}

#[test]
fn session_closes_active_tab_and_activates_tail() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    cli(data.path())?
        .arg("session")
        .write_stdin("new-project P\nnew-file a\nnew-file b\nnew-file c\nactivate b\nclose b\nclose c\nclose a\nshow\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("tabs: a [c]"))
        .stdout(predicate::str::contains("tabs: [a]"))
        .stdout(predicate::str::contains("tabs: \n"));
    Ok(())
}

#[test]
fn ask_uses_configured_delay_and_rules() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    fs::write(
        data.path().join("rules.json"),
        r#"{ "rules": [ { "matcher": { "any_of": ["ping"] }, "response": "pong" } ], "fallback": "?" }"#,
    )?;
    fs::write(
        data.path().join("config.json"),
        r#"{ "assistant": { "reply_delay_ms": 0, "rules": "rules.json" } }"#,
    )?;

    cli(data.path())?
        .args(["ask", "PING", "please"])
        .assert()
        .success()
        .stdout("pong\n");
    cli(data.path())?
        .args(["ask", "anything"])
        .assert()
        .success()
        .stdout("?\n");
    Ok(())
}

#[test]
fn ask_is_refused_when_assistant_disabled() -> Result<(), Box<dyn Error>> {
    let data = tempdir()?;
    fs::write(
        data.path().join("config.json"),
        r#"{ "assistant": { "enabled": false } }"#,
    )?;
    cli(data.path())?
        .args(["ask", "css", "style"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("assistant is disabled"));
    Ok(())
}
