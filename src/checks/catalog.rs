//! The default assertion set for a subscription billing deployment.
//!
//! Declaration order here is the order of the report.

use serde_json::json;

use super::assertion::Assertion;
use super::rules::{catalog_consistency, feature_rows, plan_rows, subscription_data, webhook_ack};
use super::set::{AssertionSet, CheckSpec};
use crate::config::Environment;
use crate::models::{SubscriptionRequest, WebhookEvent};
use crate::probe::{Credential, EndpointSpec, Probe};

pub const PLANS_PATH: &str = "rest/v1/plans";
pub const FEATURES_PATH: &str = "rest/v1/subscription_features";
pub const CREATE_SUBSCRIPTION_PATH: &str = "functions/v1/create-subscription";
pub const WEBHOOK_PATH: &str = "functions/v1/stripe-webhook";

pub const CHECK_PLANS: &str = "plans";
pub const CHECK_FEATURES: &str = "features";
pub const CHECK_CONSISTENCY: &str = "catalog_consistency";
pub const CHECK_CREATE_SUBSCRIPTION: &str = "create_subscription";
pub const CHECK_WEBHOOK: &str = "payment_webhook";
pub const CHECK_FRONTEND: &str = "frontend";

fn plans_probe() -> Probe {
    Probe::new(
        "plan configuration",
        EndpointSpec::get(PLANS_PATH, Credential::Service),
    )
}

fn features_probe() -> Probe {
    Probe::new(
        "feature configuration",
        EndpointSpec::get(FEATURES_PATH, Credential::Service),
    )
}

/// Build the standard checks for the given environment
pub fn default_assertion_set(env: &Environment) -> AssertionSet {
    let subscription = SubscriptionRequest::new(env.plan_type, env.probe_email.clone());
    let event = WebhookEvent::probe(env.webhook_event_type.clone());

    AssertionSet::new(vec![
        CheckSpec::single(
            CHECK_PLANS,
            "Plan configuration is readable and well-formed",
            plans_probe(),
            vec![
                Assertion::non_empty_array(""),
                Assertion::rows(plan_rows),
            ],
        ),
        CheckSpec::single(
            CHECK_FEATURES,
            "Feature flags are readable, one row per plan, richness non-decreasing",
            features_probe(),
            vec![
                Assertion::non_empty_array(""),
                Assertion::rows(feature_rows),
            ],
        ),
        CheckSpec::joined(
            CHECK_CONSISTENCY,
            "Plans and feature flags describe the same tiers",
            vec![plans_probe(), features_probe()],
            "plan/feature consistency",
            catalog_consistency,
        ),
        CheckSpec::single(
            CHECK_CREATE_SUBSCRIPTION,
            "Subscription-creation function returns customer and price identifiers",
            Probe::new(
                "create-subscription",
                EndpointSpec::post(
                    CREATE_SUBSCRIPTION_PATH,
                    Credential::Anon,
                    json!(subscription),
                ),
            )
            .mutating(),
            vec![
                Assertion::required_field("/data"),
                Assertion::required_field("/data/customerId"),
                Assertion::required_field("/data/priceId"),
                Assertion::equals("/data/planType", json!(env.plan_type.as_str())),
                Assertion::rows(subscription_data),
                // Checkout session creation may not be wired up yet
                Assertion::optional_field("/data/checkoutUrl"),
            ],
        ),
        CheckSpec::single(
            CHECK_WEBHOOK,
            "Payment webhook acknowledges events, including unknown types",
            Probe::new(
                "payment-webhook",
                EndpointSpec::post(WEBHOOK_PATH, Credential::Anon, json!(event)),
            )
            .mutating(),
            vec![Assertion::rows(webhook_ack)],
        ),
        CheckSpec::single(
            CHECK_FRONTEND,
            "Frontend bundle is served with its mount point and assets",
            Probe::new("frontend", EndpointSpec::frontend()),
            vec![
                Assertion::marker("root mount element", &["<div id=\"root\""]),
                Assertion::marker("module script", &["type=\"module\""]),
                Assertion::marker("script asset", &[".js"]),
                Assertion::marker("stylesheet", &["stylesheet", ".css"]),
                Assertion::marker("PWA manifest", &["manifest.json", ".webmanifest"]),
            ],
        ),
    ])
}
