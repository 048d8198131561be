use std::path::Path;
use std::process::{Command, Output};

fn run(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_adiutor"))
        .args(args)
        .env("ADIUTOR_DATA_DIR", data_dir)
        .env("ADIUTOR_CONFIG_PATH", data_dir.join("config.json"))
        .env("ADIUTOR_DISABLE_NOTIFICATIONS", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run adiutor")
}

fn stored_tasks(data_dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(data_dir.join("tasks.json")).unwrap();
    serde_json::from_str::<serde_json::Value>(&content).unwrap()["tasks"].clone()
}

#[test]
fn remind_fires_due_reminders_once() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["add", "Stand up", "--remind", "2020-01-01T08:00"]);
    run(dir.path(), &["add", "Later", "--remind", "2999-01-01T08:00"]);

    let first = run(dir.path(), &["remind"]);
    assert!(first.status.success());
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.contains("Reminder: Stand up (due 2020-01-01T08:00)"));
    assert!(!stdout.contains("Later"));

    let tasks = stored_tasks(dir.path());
    let fired = tasks
        .as_array()
        .unwrap()
        .iter()
        .find(|task| task["title"] == "Stand up")
        .unwrap();
    assert_eq!(fired["reminded"], true);

    let second = run(dir.path(), &["remind"]);
    assert!(String::from_utf8_lossy(&second.stdout).contains("No reminders due."));
}

#[test]
fn editing_reminder_time_rearms_it() {
    let dir = tempfile::tempdir().unwrap();
    let added = run(
        dir.path(),
        &["add", "Stand up", "--remind", "2020-01-01T08:00", "--json"],
    );
    let task: serde_json::Value = serde_json::from_slice(&added.stdout).unwrap();
    let id = task["id"].as_str().unwrap().to_string();
    run(dir.path(), &["remind"]);

    run(dir.path(), &["edit", &id, "--remind", "2020-01-02T08:00"]);
    assert_eq!(stored_tasks(dir.path())[0]["reminded"], false);

    let output = run(dir.path(), &["remind", "--json"]);
    let fired: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(fired.as_array().unwrap().len(), 1);
    assert_eq!(fired[0]["id"], id.as_str());
}

#[test]
fn completed_tasks_still_fire() {
    let dir = tempfile::tempdir().unwrap();
    let added = run(
        dir.path(),
        &["add", "Pay rent", "--remind", "2020-01-01T08:00", "--status", "done", "--json"],
    );
    assert!(added.status.success());

    let output = run(dir.path(), &["remind", "--json"]);

    let fired: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(fired[0]["title"], "Pay rent");
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let output = run(dir.path(), &["remind"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No reminders due."));
}

#[test]
fn bad_config_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(
        dir.path(),
        &["remind", "--config-override", "notifications=maybe"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("notifications must be on or off"));
}
