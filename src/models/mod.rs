//! Typed views of the records and payloads the harness inspects.
//!
//! These are read-only snapshots: plan and feature rows are fetched once per
//! check, subscription and webhook payloads live for a single request.

pub mod feature;
pub mod plan;
pub mod subscription;
pub mod webhook;

pub use feature::FeatureRecord;
pub use plan::{MonthlyLimit, PlanRecord, PlanType, RecordId};
pub use subscription::{SubscriptionRequest, SubscriptionResponse};
pub use webhook::{WebhookAck, WebhookEvent};
