//! Typed per-row predicates over plan and feature configuration

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::assertion::Evaluation;
use crate::models::{FeatureRecord, PlanRecord, PlanType, SubscriptionResponse, WebhookAck};

fn decode_rows<T: serde::de::DeserializeOwned>(
    document: &Value,
    what: &str,
    eval: &mut Evaluation,
) -> Option<Vec<T>> {
    match serde_json::from_value::<Vec<T>>(document.clone()) {
        Ok(rows) => Some(rows),
        Err(e) => {
            eval.contract(format!("{what} rows do not match the schema: {e}"));
            None
        }
    }
}

/// Plan rows: unique plan types, non-negative price and limit
pub fn plan_rows(document: &Value, eval: &mut Evaluation) {
    let Some(plans) = decode_rows::<PlanRecord>(document, "plan", eval) else {
        return;
    };

    let mut seen = BTreeSet::new();
    for plan in &plans {
        if !seen.insert(plan.plan_type) {
            eval.contract(format!("plan_type '{}' appears more than once", plan.plan_type));
        }
        if plan.price < 0 {
            eval.contract(format!(
                "plan '{}' has negative price {}",
                plan.plan_type, plan.price
            ));
        }
        if !plan.monthly_limit.is_non_negative() {
            eval.contract(format!(
                "plan '{}' has negative monthly_limit {}",
                plan.plan_type, plan.monthly_limit
            ));
        }
        eval.note(format!(
            "{:<8} | ${:>7.2}/mo | limit {}",
            plan.plan_type.as_str().to_uppercase(),
            plan.price_major(),
            plan.monthly_limit
        ));
    }

    eval.summarize(format!("{} plans configured", plans.len()));
}

/// Feature rows: one per plan type, at least one team member, and richness
/// that never decreases from free to pro to business.
pub fn feature_rows(document: &Value, eval: &mut Evaluation) {
    let Some(features) = decode_rows::<FeatureRecord>(document, "feature", eval) else {
        return;
    };

    let mut by_plan: BTreeMap<PlanType, &FeatureRecord> = BTreeMap::new();
    for feature in &features {
        if by_plan.insert(feature.plan_type, feature).is_some() {
            eval.contract(format!(
                "plan_type '{}' has more than one feature row",
                feature.plan_type
            ));
        }
        if feature.max_team_members < 1 {
            eval.contract(format!(
                "plan '{}' allows {} team members (minimum 1)",
                feature.plan_type, feature.max_team_members
            ));
        }
        eval.note(format_feature_row(feature));
    }

    // BTreeMap iterates in richness order
    let ordered: Vec<&FeatureRecord> = by_plan.values().copied().collect();
    for pair in ordered.windows(2) {
        let lost = pair[0].regressions_in(pair[1]);
        if !lost.is_empty() {
            eval.soft(format!(
                "'{}' offers less than '{}': {}",
                pair[1].plan_type,
                pair[0].plan_type,
                lost.join(", ")
            ));
        }
    }

    eval.summarize(format!("{} feature sets configured", features.len()));
}

fn format_feature_row(feature: &FeatureRecord) -> String {
    let mark = |on: bool| if on { "✓" } else { "✗" };
    format!(
        "{:<8} | analytics {} branding {} api {} reporting {} | team {}",
        feature.plan_type.as_str().to_uppercase(),
        mark(feature.has_analytics),
        mark(feature.has_custom_branding),
        mark(feature.has_api_access),
        mark(feature.has_advanced_reporting),
        feature.max_team_members
    )
}

/// Plans and features describe the same set of tiers.
///
/// Expects `[plans, features]`. Cardinality is compared without assuming a
/// fixed number of tiers.
pub fn catalog_consistency(documents: &[Value], eval: &mut Evaluation) {
    let [plans_doc, features_doc] = documents else {
        eval.contract(format!(
            "expected plan and feature documents, got {}",
            documents.len()
        ));
        return;
    };
    let Some(plans) = decode_rows::<PlanRecord>(plans_doc, "plan", eval) else {
        return;
    };
    let Some(features) = decode_rows::<FeatureRecord>(features_doc, "feature", eval) else {
        return;
    };

    let plan_types: BTreeSet<PlanType> = plans.iter().map(|p| p.plan_type).collect();
    let feature_types: BTreeSet<PlanType> = features.iter().map(|f| f.plan_type).collect();

    if plan_types.len() != features.len() {
        eval.contract(format!(
            "{} distinct plan types but {} feature rows",
            plan_types.len(),
            features.len()
        ));
    }
    for missing in plan_types.difference(&feature_types) {
        eval.contract(format!("plan '{missing}' has no feature row"));
    }
    for orphan in feature_types.difference(&plan_types) {
        eval.contract(format!("feature row for unknown plan '{orphan}'"));
    }

    eval.summarize(format!(
        "{} plan types and {} feature rows are consistent",
        plan_types.len(),
        features.len()
    ));
}

/// The subscription `data` object decodes into its typed shape.
///
/// Missing fields are left to the field assertions; this catches identifiers
/// of the wrong type, such as a numeric customerId.
pub fn subscription_data(document: &Value, eval: &mut Evaluation) {
    let Some(data) = document.get("data").filter(|d| !d.is_null()) else {
        return;
    };
    if let Err(e) = serde_json::from_value::<SubscriptionResponse>(data.clone()) {
        eval.contract(format!("subscription data does not match the schema: {e}"));
    }
}

/// The webhook acknowledged the event with `received: true`.
pub fn webhook_ack(document: &Value, eval: &mut Evaluation) {
    match serde_json::from_value::<WebhookAck>(document.clone()) {
        Ok(ack) if ack.received => {}
        Ok(_) => eval.contract("received is false, expected true"),
        Err(e) => eval.contract(format!("acknowledgement does not match the schema: {e}")),
    }
}
