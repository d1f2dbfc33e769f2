//! Deployments that are broken or partially degraded

use serde_json::json;

use postflight::checks::catalog::{
    CHECK_CONSISTENCY, CHECK_CREATE_SUBSCRIPTION, CHECK_FEATURES, CHECK_FRONTEND, CHECK_PLANS,
    CHECK_WEBHOOK, CREATE_SUBSCRIPTION_PATH, FEATURES_PATH, PLANS_PATH, WEBHOOK_PATH,
};
use postflight::checks::default_assertion_set;
use postflight::probe::{TransportError, TransportErrorKind};
use postflight::report::FailureKind;
use postflight::{CheckStatus, Engine, EngineConfig, Report};

use super::helpers::{environment, features, subscription_response, FakeDeployment};

fn run(deployment: FakeDeployment) -> Report {
    let env = environment();
    let mut engine = Engine::new(EngineConfig::default(), deployment.into_arc());
    engine
        .run(default_assertion_set(&env), env)
        .expect("run completes")
}

#[test]
fn test_data_store_error_fails_plans() {
    let report = run(FakeDeployment::healthy().reply(
        PLANS_PATH,
        500,
        r#"{"message":"relation \"plans\" does not exist"}"#,
    ));

    let plans = report.get(CHECK_PLANS).unwrap();
    assert_eq!(plans.status, CheckStatus::Fail);
    assert!(plans.detail.contains("HTTP 500"));
    assert!(plans.snippet.as_deref().unwrap().contains("does not exist"));
    // Consistency fetches plans on its own and fails the same way
    assert_eq!(report.get(CHECK_CONSISTENCY).unwrap().status, CheckStatus::Fail);
    // Unrelated checks are unaffected
    assert_eq!(report.get(CHECK_FEATURES).unwrap().status, CheckStatus::Pass);
    assert_eq!(report.exit_code(false), 1);
}

#[test]
fn test_empty_plan_table_fails() {
    let report = run(FakeDeployment::healthy().reply(PLANS_PATH, 200, "[]"));
    let plans = report.get(CHECK_PLANS).unwrap();
    assert_eq!(plans.status, CheckStatus::Fail);
    assert!(plans.detail.contains("empty array"));
}

#[test]
fn test_missing_checkout_url_only_warns() {
    let report = run(FakeDeployment::healthy().reply(
        CREATE_SUBSCRIPTION_PATH,
        200,
        subscription_response(false).to_string(),
    ));

    let subscription = report.get(CHECK_CREATE_SUBSCRIPTION).unwrap();
    assert_eq!(subscription.status, CheckStatus::Warn);
    assert_eq!(subscription.failure_kind, Some(FailureKind::SoftDegradation));
    assert_eq!(report.overall(), CheckStatus::Warn);
    assert_eq!(report.exit_code(false), 0);
    assert_eq!(report.exit_code(true), 1);
}

#[test]
fn test_wrong_plan_echo_fails() {
    let mut body = subscription_response(true);
    body["data"]["planType"] = json!("free");
    let report = run(FakeDeployment::healthy().reply(CREATE_SUBSCRIPTION_PATH, 200, body.to_string()));

    let subscription = report.get(CHECK_CREATE_SUBSCRIPTION).unwrap();
    assert_eq!(subscription.status, CheckStatus::Fail);
    assert!(subscription.detail.contains("expected \"pro\""));
}

#[test]
fn test_webhook_rejecting_unknown_type_fails() {
    let report = run(FakeDeployment::healthy().reply(
        WEBHOOK_PATH,
        400,
        r#"{"error":"Unhandled event type test.event"}"#,
    ));

    let webhook = report.get(CHECK_WEBHOOK).unwrap();
    assert_eq!(webhook.status, CheckStatus::Fail);
    assert_eq!(webhook.failure_kind, Some(FailureKind::ContractViolation));
    assert!(webhook.detail.contains("HTTP 400"));
}

#[test]
fn test_frontend_down_does_not_stop_other_checks() {
    let report = run(FakeDeployment::healthy().reply("/", 500, "Internal Server Error"));

    assert_eq!(report.counts().total, 6);
    assert_eq!(report.get(CHECK_FRONTEND).unwrap().status, CheckStatus::Fail);
    assert_eq!(report.counts().passed, 5);
}

#[test]
fn test_unreachable_functions_are_network_failures() {
    let refused = TransportError::new(TransportErrorKind::Connect, "connection refused");
    let report = run(
        FakeDeployment::healthy()
            .fail(CREATE_SUBSCRIPTION_PATH, refused.clone())
            .fail(WEBHOOK_PATH, refused),
    );

    for name in [CHECK_CREATE_SUBSCRIPTION, CHECK_WEBHOOK] {
        let result = report.get(name).unwrap();
        assert_eq!(result.failure_kind, Some(FailureKind::Network), "{name}");
        assert!(result.detail.contains("connection refused"));
    }
}

#[test]
fn test_missing_feature_row_breaks_consistency() {
    let rows = json!([features()[0].clone(), features()[1].clone()]);
    let report = run(FakeDeployment::healthy().reply(FEATURES_PATH, 200, rows.to_string()));

    // Two well-formed rows are fine on their own
    assert_eq!(report.get(CHECK_FEATURES).unwrap().status, CheckStatus::Pass);
    let consistency = report.get(CHECK_CONSISTENCY).unwrap();
    assert_eq!(consistency.status, CheckStatus::Fail);
    assert!(consistency.detail.contains("plan 'business' has no feature row"));
}

#[test]
fn test_feature_regression_warns() {
    let mut rows = features();
    rows[2]["has_analytics"] = json!(false);
    let report = run(FakeDeployment::healthy().reply(FEATURES_PATH, 200, rows.to_string()));

    let features = report.get(CHECK_FEATURES).unwrap();
    assert_eq!(features.status, CheckStatus::Warn);
    assert!(features.detail.contains("analytics"));
}
