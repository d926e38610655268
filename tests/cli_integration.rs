//! Integration tests for the valet-ticket command line

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

#[allow(deprecated)]
fn valet(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("valet-ticket").unwrap();
    cmd.env_remove("VALET_DATA_DIR")
        .env("RUST_LOG", "off")
        .arg("--no-color")
        .arg("--data-dir")
        .arg(data_dir.path());
    cmd
}

fn initialized() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    valet(&temp_dir).arg("init").assert().success();
    temp_dir
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().unwrap();
    assert!(output.status.success(), "command failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
#[allow(deprecated)]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("valet-ticket").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("revenue"));
}

#[test]
fn test_commands_require_init() {
    let temp_dir = TempDir::new().unwrap();
    valet(&temp_dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"))
        .stdout(predicate::str::contains("valet-ticket init"));
}

#[test]
fn test_init_creates_tables_and_config() {
    let temp_dir = TempDir::new().unwrap();
    valet(&temp_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized valet data directory"));

    assert!(temp_dir.path().join("tickets.yaml").exists());
    assert!(temp_dir.path().join("car_requests.yaml").exists());
    assert!(temp_dir.path().join("valet.yaml").exists());
}

#[test]
fn test_ticket_lifecycle() {
    let data_dir = initialized();

    valet(&data_dir)
        .args(["generate", "--type", "vip", "--instructions", "Keys at desk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issued ticket #00001"));
    valet(&data_dir)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Issued ticket #00002"));

    valet(&data_dir)
        .args(["request", "00001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has been sent to the valet"));
    valet(&data_dir)
        .args(["request", "00001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already been requested"));

    valet(&data_dir)
        .args(["list", "--pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00001"))
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("00002").not());

    valet(&data_dir)
        .arg("queue")
        .assert()
        .success()
        .stdout(predicate::str::contains("00001"))
        .stdout(predicate::str::contains("1 car(s) waiting"));
    let queue = json_output(valet(&data_dir).args(["queue"]));
    assert_eq!(queue.as_array().map(Vec::len), Some(1));
    assert_eq!(queue[0]["status"], "pending");
    assert_eq!(queue[0]["ticket"]["ticket_number"], "00001");

    valet(&data_dir).args(["accept", "00001"]).assert().success();
    valet(&data_dir)
        .args(["request", "00001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("currently being retrieved"));

    valet(&data_dir).args(["complete", "00001"]).assert().success();
    valet(&data_dir)
        .args(["request", "00001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be requested again"));

    valet(&data_dir)
        .args(["pay", "00001", "--method", "visa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked as paid (visa)"));

    let shown = json_output(valet(&data_dir).args(["show", "00001"]));
    assert_eq!(shown["ticket_number"], "00001");
    assert_eq!(shown["ticket_type"], "vip");
    assert_eq!(shown["is_paid"], true);
    assert_eq!(shown["payment_method"], "visa");
    assert_eq!(shown["instructions"], "Keys at desk");
    assert_eq!(shown["request"]["status"], "completed");

    let listed = json_output(valet(&data_dir).args(["list", "--unpaid"]));
    let numbers: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["ticket_number"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(numbers, vec!["00002"]);

    let revenue = json_output(valet(&data_dir).args(["revenue", "--period", "today"]));
    assert_eq!(revenue["report"]["total_count"], 1);
    assert_eq!(revenue["report"]["visa_count"], 1);
}

#[test]
fn test_request_rejects_bad_numbers() {
    let data_dir = initialized();

    valet(&data_dir)
        .args(["request", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a ticket number"));
    valet(&data_dir)
        .args(["request", "00042"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ticket number 00042 does not exist"));
}

#[test]
fn test_delete_ticket() {
    let data_dir = initialized();
    valet(&data_dir).arg("generate").assert().success();
    valet(&data_dir).args(["request", "00001"]).assert().success();

    valet(&data_dir)
        .args(["delete", "00001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted ticket #00001"));

    valet(&data_dir)
        .args(["show", "00001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    let listed = json_output(valet(&data_dir).arg("list"));
    assert_eq!(listed, Value::Array(Vec::new()));
}

#[test]
fn test_enforced_status_order_from_config() {
    let data_dir = initialized();
    std::fs::write(
        data_dir.path().join("valet.yaml"),
        "company_name: Harbour Hotel\nvalet:\n  enforce_status_order: true\n",
    )
    .unwrap();

    let ticket = json_output(valet(&data_dir).arg("generate"));
    assert_eq!(ticket["company_name"], "Harbour Hotel");

    valet(&data_dir).args(["request", "00001"]).assert().success();
    valet(&data_dir)
        .args(["complete", "00001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid status transition"));
    valet(&data_dir).args(["accept", "00001"]).assert().success();
    valet(&data_dir).args(["complete", "00001"]).assert().success();
}

#[test]
fn test_json_error_output() {
    let data_dir = initialized();
    let output = valet(&data_dir)
        .args(["--json", "show", "00007"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let error: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["error_kind"], "NotFound");
}
