use predicates::str::contains;
use std::fs;

mod common;
use common::{AT_30M, init_with_hq, record, rga, setup_test_db, temp_out};

fn seeded(name: &str) -> String {
    let db_path = setup_test_db(name);
    init_with_hq(&db_path, "all");
    record(&db_path, "check_in", AT_30M, "2025-09-01 08:15").success();
    record(&db_path, "check_in", AT_30M, "2025-09-02 08:20").success();
    record(&db_path, "check_out", AT_30M, "2025-10-01 17:05").success();
    db_path
}

#[test]
fn test_export_csv_with_range() {
    let db_path = seeded("export_csv_range");
    let out = temp_out("export_csv_range", "csv");

    rga()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", &out, "--range", "2025-09",
            "--force",
        ])
        .assert()
        .success()
        .stdout(contains("2 rows"));

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("id,user_id,record_type,occurred_at,zone_id,zone_name"));
    assert!(content.contains("2025-09-01T08:15:00"));
    assert!(content.contains(",HQ,"));
    assert!(!content.contains("2025-10-01"));
}

#[test]
fn test_export_json_all() {
    let db_path = seeded("export_json_all");
    let out = temp_out("export_json_all", "json");

    rga()
        .args(["--db", &db_path, "export", "--format", "json", "--file", &out, "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(&out).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&content).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["record_type"], "check_out");
    assert_eq!(rows[0]["review_status"], "pending");
}

#[test]
fn test_export_requires_absolute_path() {
    let db_path = seeded("export_relative");

    rga()
        .args(["--db", &db_path, "export", "--file", "relative.csv", "--force"])
        .assert()
        .failure()
        .stderr(contains("must be absolute"));
}

#[test]
fn test_export_empty_range_warns() {
    let db_path = seeded("export_empty");
    let out = temp_out("export_empty", "csv");

    rga()
        .args([
            "--db", &db_path, "export", "--file", &out, "--range", "2024", "--force",
        ])
        .assert()
        .success()
        .stdout(contains("No rows found"));
    assert!(fs::metadata(&out).is_err());
}
