//! Concurrency, ordering, cancellation and skipping

use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use postflight::checks::catalog::{
    CHECK_CONSISTENCY, CHECK_CREATE_SUBSCRIPTION, CHECK_FEATURES, CHECK_FRONTEND, CHECK_PLANS,
    CHECK_WEBHOOK, FEATURES_PATH, PLANS_PATH,
};
use postflight::checks::default_assertion_set;
use postflight::probe::{TransportError, TransportErrorKind};
use postflight::{CancelToken, CheckStatus, Engine, EngineConfig, HarnessError};

use super::helpers::{environment, FakeDeployment};

#[test]
fn test_slow_early_checks_keep_declaration_order() {
    let env = environment();
    let deployment = FakeDeployment::healthy()
        .slow(PLANS_PATH, Duration::from_millis(300))
        .slow(FEATURES_PATH, Duration::from_millis(150))
        .into_arc();

    let mut engine = Engine::new(EngineConfig::default(), deployment);
    let report = engine.run(default_assertion_set(&env), env).unwrap();

    assert_eq!(
        report.names(),
        vec![
            CHECK_PLANS,
            CHECK_FEATURES,
            CHECK_CONSISTENCY,
            CHECK_CREATE_SUBSCRIPTION,
            CHECK_WEBHOOK,
            CHECK_FRONTEND
        ]
    );
    assert_eq!(report.overall(), CheckStatus::Pass);
}

#[test]
fn test_checks_run_concurrently() {
    let env = environment();
    let deployment = FakeDeployment::healthy()
        .slow("/", Duration::from_millis(300))
        .slow(PLANS_PATH, Duration::from_millis(300))
        .slow(FEATURES_PATH, Duration::from_millis(300))
        .into_arc();

    let started = Instant::now();
    let mut engine = Engine::new(EngineConfig::default(), deployment);
    engine.run(default_assertion_set(&env), env).unwrap();

    // Sequential would be well over two seconds (consistency makes two slow calls)
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[test]
fn test_timeouts_are_classified_as_network() {
    let env = environment();
    let deployment = FakeDeployment::healthy()
        .fail(
            PLANS_PATH,
            TransportError::new(TransportErrorKind::Timeout, "no response within 20s"),
        )
        .into_arc();

    let mut engine = Engine::new(EngineConfig::default(), deployment);
    let report = engine.run(default_assertion_set(&env), env).unwrap();

    let plans = report.get(CHECK_PLANS).unwrap();
    assert_eq!(plans.status, CheckStatus::Fail);
    assert!(plans.detail.contains("timeout"));
}

#[test]
fn test_cancel_mid_run_yields_partial_report() {
    let env = environment();
    let deployment = FakeDeployment::healthy()
        .slow("/", Duration::from_secs(3))
        .into_arc();

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.cancel();
    });

    let mut engine = Engine::new(EngineConfig::default(), deployment).with_cancel_token(cancel);
    let started = Instant::now();
    let report = engine.run(default_assertion_set(&env), env).unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(report.partial);
    assert_eq!(report.not_run, vec![CHECK_FRONTEND.to_string()]);
    assert_eq!(report.counts().total, 5);
    assert_eq!(report.exit_code(false), 1);

    let json: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
    assert_eq!(json["partial"], true);
    assert_eq!(json["not_run"][0], CHECK_FRONTEND);
}

#[test]
fn test_skip_mutating_leaves_functions_alone() {
    let env = environment();
    let deployment = FakeDeployment::healthy().into_arc();

    let (set, skipped) = default_assertion_set(&env).without_mutating();
    assert_eq!(skipped, vec![CHECK_CREATE_SUBSCRIPTION, CHECK_WEBHOOK]);

    let mut engine = Engine::new(EngineConfig::default(), deployment.clone());
    let report = engine.run(set, env).unwrap();

    assert_eq!(report.counts().total, 4);
    assert!(report.results.iter().all(|r| !r.mutating));
    // plans twice, features twice, frontend once
    assert_eq!(deployment.calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_preflight_against_dead_host() {
    let env = environment();
    let deployment = FakeDeployment::default()
        .fail(
            "/",
            TransportError::new(TransportErrorKind::Connect, "dns error: no such host"),
        )
        .into_arc();

    let engine = Engine::new(EngineConfig::default(), deployment.clone());
    let err = engine.preflight(&env).unwrap_err();
    assert!(matches!(err, HarnessError::Unreachable { .. }));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(deployment.calls.load(Ordering::SeqCst), 1);
}
