use predicates::str::contains;
use std::fs;

mod common;
use common::{HQ_CENTER, init_with_hq, rga, setup_test_db, temp_out};

fn sample(lat: f64, time: &str) -> String {
    serde_json::json!({
        "latitude": lat,
        "longitude": 100.5018,
        "accuracy": 5.0,
        "captured_at": format!("2025-09-02T{time}"),
    })
    .to_string()
}

/// Outside, inside twice, outside, plus a repeated timestamp.
fn write_walk(name: &str) -> String {
    let path = temp_out(name, "jsonl");
    let lines = [
        "# walk into HQ and out again".to_string(),
        sample(13.758099, "08:00:00"),
        sample(13.756750, "08:05:00"),
        sample(13.756570, "08:10:00"),
        sample(13.757649, "12:00:00"),
        sample(13.757649, "12:00:00"),
    ];
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[test]
fn test_track_emits_enter_then_exit() {
    let db_path = setup_test_db("track_walk");
    init_with_hq(&db_path, "all");
    let walk = write_walk("track_walk");

    rga()
        .args(["--db", &db_path, "track", "--file", &walk, "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("ENTER"))
        .stdout(contains("EXIT"))
        .stdout(contains("1 duplicate sample(s) dropped"))
        .stdout(contains("Processed 4 sample(s), 2 presence event(s)"));

    rga()
        .args(["--db", &db_path, "list", "--presence", "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("enter"))
        .stdout(contains("exit"))
        .stdout(contains("2025-09-02 12:00:00"));
}

#[test]
fn test_track_resumes_from_stored_membership() {
    let db_path = setup_test_db("track_resume");
    init_with_hq(&db_path, "all");

    let enter = temp_out("track_resume_enter", "jsonl");
    fs::write(&enter, sample(13.756570, "08:10:00")).unwrap();
    rga()
        .args(["--db", &db_path, "track", "--file", &enter, "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("1 presence event(s)"));

    // still inside on the next replay: no second Enter
    let stay = temp_out("track_resume_stay", "jsonl");
    fs::write(&stay, sample(13.756750, "09:00:00")).unwrap();
    rga()
        .args(["--db", &db_path, "track", "--file", &stay, "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("Processed 1 sample(s), 0 presence event(s)"));
}

#[test]
fn test_track_ignores_membership_of_deleted_zone() {
    let db_path = setup_test_db("track_deleted_zone");
    init_with_hq(&db_path, "all");

    let inside = temp_out("track_deleted_zone", "jsonl");
    fs::write(&inside, sample(13.756570, "08:10:00")).unwrap();
    rga()
        .args(["--db", &db_path, "track", "--file", &inside, "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("1 presence event(s)"));

    rga()
        .args(["--db", &db_path, "zone", "del", "1"])
        .assert()
        .success();

    // same spot, new zone: it must not inherit zone #1's id or membership
    rga()
        .args([
            "--db", &db_path, "zone", "add", "Annex", "--center", HQ_CENTER, "--radius", "100",
            "--hours", "08:00-18:00", "--days", "mon-fri", "--types", "all",
        ])
        .assert()
        .success()
        .stdout(contains("Zone #2 'Annex' created."));

    rga()
        .args(["--db", &db_path, "track", "--file", &inside, "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("ENTER"))
        .stdout(contains("Processed 1 sample(s), 1 presence event(s)"));
}

#[test]
fn test_track_reports_source_failure() {
    let db_path = setup_test_db("track_failure");
    init_with_hq(&db_path, "all");

    let path = temp_out("track_failure", "jsonl");
    fs::write(&path, r#"{"error":"permission_denied"}"#).unwrap();

    rga()
        .args(["--db", &db_path, "track", "--file", &path, "--user", "alice"])
        .assert()
        .success()
        .stdout(contains("Position unavailable: permission denied"))
        .stdout(contains("Processed 0 sample(s)"));
}

#[test]
fn test_track_missing_file() {
    let db_path = setup_test_db("track_missing");
    init_with_hq(&db_path, "all");

    rga()
        .args(["--db", &db_path, "track", "--file", "/nonexistent/walk.jsonl"])
        .assert()
        .failure()
        .stderr(contains("position file not found"));
}
