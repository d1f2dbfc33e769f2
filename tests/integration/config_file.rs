//! Config file loading, precedence and report files

use std::fs;
use tempfile::TempDir;

use postflight::checks::default_assertion_set;
use postflight::config::{FileConfig, Settings};
use postflight::models::PlanType;
use postflight::{Engine, EngineConfig, HarnessError};

use super::helpers::{settings, FakeDeployment};

#[test]
fn test_file_fills_gaps_but_flags_win() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("postflight.toml");
    fs::write(
        &path,
        r#"
base_url = "https://from-file.example.com"
frontend_url = "https://app-from-file.example.com"
plan_type = "business"
webhook_event_type = "customer.subscription.updated"
timeout_secs = 45
"#,
    )
    .unwrap();

    let file = FileConfig::load(&path).expect("config parses");
    assert_eq!(file.timeout_secs, Some(45));

    let env = Settings {
        frontend_url: None,
        plan_type: None,
        ..settings()
    }
    .with_file(&file)
    .resolve()
    .unwrap();

    // Flag value beats the file
    assert_eq!(env.base_url.as_str(), "https://db.example.com/");
    // File values fill in what was not given
    assert_eq!(env.frontend_url.as_str(), "https://app-from-file.example.com/");
    assert_eq!(env.plan_type, PlanType::Business);
    assert_eq!(env.webhook_event_type, "customer.subscription.updated");
}

#[test]
fn test_secrets_in_file_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("postflight.toml");
    fs::write(&path, "service_key = \"leaked\"\n").unwrap();

    let err = FileConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("service_key"));
}

#[test]
fn test_missing_credentials_are_a_harness_fault() {
    let err = Settings {
        anon_key: None,
        ..settings()
    }
    .resolve()
    .unwrap_err();

    assert!(matches!(err, HarnessError::InvalidConfig(_)));
    assert!(err.to_string().contains("POSTFLIGHT_ANON_KEY"));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_requested_plan_flows_into_probe_and_assertion() {
    let env = std::sync::Arc::new(
        Settings {
            plan_type: Some(PlanType::Business),
            ..settings()
        }
        .resolve()
        .unwrap(),
    );

    // The fake still echoes "pro", so the echo assertion must fail
    let mut engine = Engine::new(EngineConfig::default(), FakeDeployment::healthy().into_arc());
    let report = engine
        .run(default_assertion_set(&env), std::sync::Arc::clone(&env))
        .unwrap();
    let subscription = report.get("create_subscription").unwrap();
    assert!(subscription.detail.contains("expected \"business\""));
}

#[test]
fn test_report_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.json");

    let env = std::sync::Arc::new(settings().resolve().unwrap());
    let mut engine = Engine::new(EngineConfig::default(), FakeDeployment::healthy().into_arc());
    let report = engine.run(default_assertion_set(&env), env).unwrap();
    fs::write(&path, report.to_json(false).unwrap()).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["overall"], "pass");
    assert_eq!(written["results"].as_array().unwrap().len(), 6);
    assert!(written["started_at"].is_string());
}
