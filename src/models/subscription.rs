//! Subscription-creation request and response payloads

use serde::{Deserialize, Serialize};

use super::plan::PlanType;

/// Body sent to the subscription-creation function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub plan_type: PlanType,
    pub customer_email: String,
}

impl SubscriptionRequest {
    pub fn new(plan_type: PlanType, customer_email: impl Into<String>) -> Self {
        Self {
            plan_type,
            customer_email: customer_email.into(),
        }
    }
}

/// The `data` object of a successful subscription-creation response.
///
/// Every field is optional here so that a missing field is reported by the
/// assertions with a precise message instead of a generic parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
}
