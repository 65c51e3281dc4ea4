#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const HQ_CENTER: &str = "13.7563,100.5018";
/// Points due north of the HQ center.
pub const AT_30M: &str = "13.756570,100.5018";
pub const AT_50M: &str = "13.756750,100.5018";
pub const AT_150M: &str = "13.757649,100.5018";
pub const AT_200M: &str = "13.758099,100.5018";

pub fn rga() -> Command {
    cargo_bin_cmd!("rgeoattend")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rgeoattend.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rgeoattend_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn init_db(db_path: &str) {
    rga()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

/// Init the DB and create zone #1 "HQ": 100 m radius, 08:00-18:00 Mon-Fri.
pub fn init_with_hq(db_path: &str, types: &str) {
    init_db(db_path);
    rga()
        .args([
            "--db", db_path, "zone", "add", "HQ", "--center", HQ_CENTER, "--radius", "100",
            "--hours", "08:00-18:00", "--days", "mon-fri", "--types", types,
        ])
        .assert()
        .success();
}

/// Request a record as `alice` at `at` on `time`.
pub fn record(
    db_path: &str,
    record_type: &str,
    at: &str,
    time: &str,
) -> assert_cmd::assert::Assert {
    rga()
        .args([
            "--db", db_path, "record", record_type, "--at", at, "--accuracy", "10", "--user",
            "alice", "--time", time,
        ])
        .assert()
}
