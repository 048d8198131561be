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

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn add(data_dir: &Path, title: &str) -> String {
    let task = stdout_json(&run(data_dir, &["add", title, "--json"]));
    task["id"].as_str().unwrap().to_string()
}

#[test]
fn done_toggles_and_counts_streak_once_per_period() {
    let dir = tempfile::tempdir().unwrap();
    let first = add(dir.path(), "first");
    let second = add(dir.path(), "second");

    let done = stdout_json(&run(dir.path(), &["done", &first, "--json"]));
    assert_eq!(done["status"], "done");
    assert_eq!(done["completed"], true);

    run(dir.path(), &["done", &second]);
    let streak = stdout_json(&run(dir.path(), &["streak", "show", "--json"]));
    assert_eq!(streak["state"]["count"], 1);
    assert_eq!(streak["state"]["currentPeriodProgress"], 2);
    assert_eq!(streak["goalMet"], true);

    let reopened = stdout_json(&run(dir.path(), &["done", &second, "--json"]));
    assert_eq!(reopened["status"], "todo");
    let streak = stdout_json(&run(dir.path(), &["streak", "show", "--json"]));
    assert_eq!(streak["state"]["count"], 1);
    assert_eq!(streak["state"]["currentPeriodProgress"], 1);
}

#[test]
fn higher_target_delays_the_streak() {
    let dir = tempfile::tempdir().unwrap();
    let settings = stdout_json(&run(
        dir.path(),
        &["streak", "set", "--target", "2", "--json"],
    ));
    assert_eq!(settings["settings"]["target"], 2);
    assert_eq!(settings["settings"]["period"], "daily");

    let first = add(dir.path(), "first");
    let second = add(dir.path(), "second");

    run(dir.path(), &["done", &first]);
    let streak = stdout_json(&run(dir.path(), &["streak", "show", "--json"]));
    assert_eq!(streak["state"]["count"], 0);
    assert_eq!(streak["goalMet"], false);

    run(dir.path(), &["done", &second]);
    let streak = stdout_json(&run(dir.path(), &["streak", "show", "--json"]));
    assert_eq!(streak["state"]["count"], 1);
}

#[test]
fn weekly_period_uses_iso_week_keys() {
    let dir = tempfile::tempdir().unwrap();

    let streak = stdout_json(&run(
        dir.path(),
        &["streak", "set", "--period", "weekly", "--json"],
    ));

    let key = streak["state"]["currentPeriodKey"].as_str().unwrap();
    assert_eq!(key.len(), 8);
    assert_eq!(&key[4..6], "-W");
}

#[test]
fn legacy_streak_record_is_migrated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("streak.json"),
        r#"{"count":4,"lastDate":"2020-01-01"}"#,
    )
    .unwrap();

    let streak = stdout_json(&run(dir.path(), &["streak", "show", "--json"]));

    assert_eq!(streak["state"]["count"], 4);
    assert_eq!(streak["state"]["lastSatisfiedPeriod"], "2020-01-01");
    assert_eq!(streak["state"]["currentPeriodProgress"], 0);
    assert!(dir.path().join("streak_v2.json").exists());
    assert!(!dir.path().join("streak.json").exists());
}

#[test]
fn reset_starts_over() {
    let dir = tempfile::tempdir().unwrap();
    let id = add(dir.path(), "first");
    run(dir.path(), &["done", &id]);

    let streak = stdout_json(&run(dir.path(), &["streak", "reset", "--json"]));

    assert_eq!(streak["state"]["count"], 0);
    assert!(streak["state"]["lastSatisfiedPeriod"].is_null());
}

#[test]
fn streak_plain_text_shows_goal() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["streak", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Streak: 0"));
    assert!(stdout.contains("Goal: 1 per daily period, progress 0/1"));
}

#[test]
fn stats_count_completed_and_pending() {
    let dir = tempfile::tempdir().unwrap();
    let empty = run(dir.path(), &["stats"]);
    assert!(empty.status.success());
    assert!(String::from_utf8_lossy(&empty.stdout).contains("No tasks yet!"));

    let first = add(dir.path(), "Stretch");
    add(dir.path(), "Read");
    add(dir.path(), "Write");
    run(dir.path(), &["done", &first]);

    let stats = stdout_json(&run(dir.path(), &["stats", "--json"]));
    assert_eq!(stats, serde_json::json!({ "total": 3, "completed": 1, "pending": 2 }));

    let text = run(dir.path(), &["stats"]);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("completed: 1"));
    assert!(stdout.contains("pending:   2"));
}
