use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn stargaze() -> Command {
  let mut cmd = Command::cargo_bin("stargaze").unwrap();
  cmd.env_remove("STARGAZE_SERVER_URL").env_remove("STARGAZE_TIMEOUT_SECS");
  cmd
}

const GRID: &str = r#"[
  {"year": 2024, "marketing_name": "Humana", "measure_name": "Diabetes Care", "star_rating_numeric": 4.0},
  {"year": 2024, "marketing_name": "CVS", "measure_name": "Diabetes Care", "star_rating_numeric": 3.0},
  {"year": 2024, "marketing_name": "Aetna", "measure_name": "Diabetes Care", "star_rating_numeric": 5.0},
  {"year": 2024, "marketing_name": "Humana", "measure_name": "Flu Vaccine", "star_rating_numeric": 3.5},
  {"year": 2024, "marketing_name": "CVS", "measure_name": "Flu Vaccine", "star_rating_numeric": 2.0},
  {"year": 2024, "marketing_name": "Aetna", "measure_name": "Flu Vaccine", "star_rating_numeric": 4.5},
  {"year": 2024, "marketing_name": "Humana", "measure_name": "Statin Use", "star_rating_numeric": 4.0},
  {"year": 2024, "marketing_name": "CVS", "measure_name": "Statin Use", "star_rating_numeric": 1.0}
]"#;

#[test]
fn test_help_lists_subcommands() {
  stargaze()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("chat"))
    .stdout(predicate::str::contains("ask"))
    .stdout(predicate::str::contains("chart"));
}

#[test]
fn test_chart_infers_heatmap_with_gap() {
  let temp = assert_fs::TempDir::new().unwrap();
  let file = temp.child("records.json");
  file.write_str(GRID).unwrap();

  let output = stargaze().args(["chart", "--file"]).arg(file.path()).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["spec"]["archetype"], "heatmap");
  assert_eq!(json["spec"]["height"], 400);
  assert_eq!(json["spec"]["data"]["x"], serde_json::json!(["Humana", "CVS", "Aetna"]));
  assert_eq!(json["spec"]["data"]["z"][2][2], serde_json::Value::Null);
  assert_eq!(json["spec"]["data"]["z"][2][1], 1.0);
  assert_eq!(json["config"]["image_export"], true);
}

#[test]
fn test_chart_type_override_and_expanded_height() {
  let temp = assert_fs::TempDir::new().unwrap();
  let file = temp.child("records.json");
  file.write_str(GRID).unwrap();

  let output = stargaze()
    .args(["chart", "--type", "pie", "--expanded", "--file"])
    .arg(file.path())
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["spec"]["archetype"], "pie");
  assert_eq!(json["spec"]["height"], 600);
  assert_eq!(
    json["spec"]["data"]["series"][0]["x"],
    serde_json::json!(["1 Stars", "2 Stars", "3 Stars", "4 Stars", "5 Stars"])
  );
  assert_eq!(json["spec"]["data"]["series"][0]["y"], serde_json::json!([1.0, 1.0, 1.0, 3.0, 2.0]));
}

#[test]
fn test_chart_rejects_empty_record_file() {
  let temp = assert_fs::TempDir::new().unwrap();
  let file = temp.child("empty.json");
  file.write_str("[]").unwrap();

  stargaze()
    .args(["chart", "--file"])
    .arg(file.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("No records"));
}

#[test]
fn test_chart_reports_duplicate_heatmap_cells() {
  let temp = assert_fs::TempDir::new().unwrap();
  let file = temp.child("dupes.json");
  file
    .write_str(
      r#"[
        {"year": 2023, "entity": "Humana", "measure": "Overall", "value": 4.0},
        {"year": 2024, "entity": "Humana", "measure": "Overall", "value": 4.5}
      ]"#,
    )
    .unwrap();

  stargaze()
    .args(["chart", "--type", "heatmap", "--file"])
    .arg(file.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("more than one value"));
}

#[test]
fn test_ask_rejects_invalid_server_url() {
  stargaze()
    .args(["ask", "--server-url", "not a url", "how", "is", "Humana?"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid server url"));
}

#[test]
fn test_server_url_flag_overrides_invalid_config_file() {
  let temp = assert_fs::TempDir::new().unwrap();
  let config = temp.child("config.json");
  config.write_str(r#"{"server_url": "not a url"}"#).unwrap();

  stargaze()
    .arg("--config")
    .arg(config.path())
    .args(["--server-url", "http://127.0.0.1:9", "--timeout-secs", "2", "ask", "hi"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid server url").not())
    .stderr(predicate::str::contains("No answer from http://127.0.0.1:9"));
}
