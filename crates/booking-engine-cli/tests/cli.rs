use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const SALON: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/salon.json");
const CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/config.json");

fn booking() -> Command {
    Command::cargo_bin("booking").unwrap()
}

fn slot_args<'a>(cmd: &'a mut Command, time: &str) -> &'a mut Command {
    cmd.args(["--data", SALON, "--tenant", "downtown", "--date", "2026-01-12", "--time", time])
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_check_unavailable_lists_alternatives() {
    let mut cmd = booking();
    slot_args(cmd.arg("check"), "10:00 AM").args(["--duration", "30"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["available"], false);
    assert!(json.get("staff_id").is_none());
    assert_eq!(
        json["alternatives"],
        serde_json::json!(["9:00 AM", "9:30 AM", "10:30 AM"])
    );
}

#[test]
fn test_check_available_ignores_cancelled_booking() {
    let mut cmd = booking();
    slot_args(cmd.arg("check"), "11:00").args(["--duration", "30"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["available"], true);
    assert_eq!(json["staff_id"], "s-alex");
}

#[test]
fn test_check_service_uses_its_staff_and_duration() {
    let mut cmd = booking();
    slot_args(cmd.arg("check"), "10:30").args(["--service", "color"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["available"], false);
    assert_eq!(
        json["alternatives"],
        serde_json::json!(["1:00 PM", "1:30 PM", "2:00 PM"])
    );
}

#[test]
fn test_config_raises_alternative_limit() {
    let mut cmd = booking();
    cmd.args(["--config", CONFIG]);
    slot_args(cmd.arg("check"), "10:30").args(["--service", "color"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["alternatives"].as_array().unwrap().len(), 5);
    assert_eq!(json["alternatives"][4], "3:00 PM");
}

#[test]
fn test_invalid_time_is_rejected() {
    let mut cmd = booking();
    slot_args(cmd.arg("check"), "25:00").args(["--duration", "30"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time format"));
}

#[test]
fn test_inactive_staff_is_not_found() {
    let mut cmd = booking();
    slot_args(cmd.arg("check"), "11:00").args(["--duration", "30", "--staff", "s-taylor"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Staff member not found: s-taylor"));
}

#[test]
fn test_check_requires_duration_or_service() {
    let mut cmd = booking();
    slot_args(cmd.arg("check"), "11:00");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--duration is required"));
}

#[test]
fn test_assign_skips_staff_on_time_off() {
    // Color at 11:00 runs into Jordan's lunch
    let mut cmd = booking();
    slot_args(cmd.arg("assign"), "11:00").args(["--service", "color"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["staff_id"], Value::Null);

    let mut cmd = booking();
    slot_args(cmd.arg("assign"), "1:00 PM").args(["--service", "color"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["staff_id"], "s-jordan");
}

#[test]
fn test_book_writes_updated_data() {
    let out = std::env::temp_dir().join(format!("booking-cli-{}.json", std::process::id()));
    let mut cmd = booking();
    slot_args(cmd.arg("book"), "11:00")
        .args(["--service", "cut", "--notes", "walk-in", "--api", "--out"])
        .arg(&out);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["outcome"], "booked");
    assert_eq!(json["appointment"]["staff_id"], "s-alex");
    assert_eq!(json["appointment"]["id"], "appt-4");
    assert_eq!(json["appointment"]["status"], "CONFIRMED");
    assert_eq!(json["appointment"]["source"], "API");

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    std::fs::remove_file(&out).ok();
    let appointments = saved["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 4);
    assert_eq!(appointments[3]["notes"], "walk-in");
}

#[test]
fn test_book_unavailable_reports_alternatives() {
    let mut cmd = booking();
    slot_args(cmd.arg("book"), "10:00").args(["--service", "cut"]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["outcome"], "unavailable");
    assert_eq!(json["alternatives"][0], "9:00 AM");
}

#[test]
fn test_resolve_summer_time() {
    let mut cmd = booking();
    cmd.args([
        "resolve",
        "--date",
        "2026-07-13",
        "--time",
        "10:00 AM",
        "--timezone",
        "America/Toronto",
        "--compact",
    ]);
    let json = stdout_json(&mut cmd);
    assert_eq!(json["utc_start"], "2026-07-13T14:00:00+00:00");
    assert_eq!(json["utc_end"], "2026-07-13T14:30:00+00:00");
    assert_eq!(json["local_weekday"], "Mon");
    assert_eq!(json["local_time"], "10:00 AM");
}

#[test]
fn test_resolve_unknown_timezone_fails() {
    booking()
        .args(["resolve", "--date", "2026-07-13", "--time", "10:00", "--timezone", "Nowhere/Land"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}
