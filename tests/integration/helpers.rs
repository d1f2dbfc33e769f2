//! Shared test helpers: a scripted deployment and environment builders

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use postflight::checks::catalog::{
    CREATE_SUBSCRIPTION_PATH, FEATURES_PATH, PLANS_PATH, WEBHOOK_PATH,
};
use postflight::config::{Environment, Settings};
use postflight::probe::{ProbeRequest, RawResponse, Transport, TransportError};

pub const BASE_URL: &str = "https://db.example.com";
pub const FRONTEND_URL: &str = "https://app.example.com";

#[derive(Debug, Clone)]
enum Scripted {
    Reply { status: u16, body: String },
    Fail(TransportError),
}

/// In-memory stand-in for a deployed stack, keyed by URL path.
///
/// Unknown paths answer 404. Latency can be injected per path.
#[derive(Default)]
pub struct FakeDeployment {
    replies: HashMap<String, Scripted>,
    latency: HashMap<String, Duration>,
    pub requests: Mutex<Vec<ProbeRequest>>,
    pub calls: AtomicUsize,
}

fn key(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

impl FakeDeployment {
    /// A stack where every default check passes
    pub fn healthy() -> Self {
        Self::default()
            .reply(PLANS_PATH, 200, plans().to_string())
            .reply(FEATURES_PATH, 200, features().to_string())
            .reply(
                CREATE_SUBSCRIPTION_PATH,
                200,
                subscription_response(true).to_string(),
            )
            .reply(WEBHOOK_PATH, 200, json!({"received": true}).to_string())
            .reply("/", 200, HEALTHY_HTML)
    }

    pub fn reply(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.replies.insert(
            key(path),
            Scripted::Reply {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn fail(mut self, path: &str, err: TransportError) -> Self {
        self.replies.insert(key(path), Scripted::Fail(err));
        self
    }

    pub fn slow(mut self, path: &str, latency: Duration) -> Self {
        self.latency.insert(key(path), latency);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests_to(&self, path: &str) -> Vec<ProbeRequest> {
        let wanted = key(path);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == wanted)
            .cloned()
            .collect()
    }
}

impl Transport for FakeDeployment {
    fn execute(&self, request: &ProbeRequest) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let path = request.url.path();
        if let Some(latency) = self.latency.get(path) {
            thread::sleep(*latency);
        }
        match self.replies.get(path) {
            Some(Scripted::Reply { status, body }) => Ok(RawResponse::new(*status, body.clone())),
            Some(Scripted::Fail(err)) => Err(err.clone()),
            None => Ok(RawResponse::new(404, r#"{"message":"not found"}"#)),
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        base_url: Some(BASE_URL.into()),
        frontend_url: Some(FRONTEND_URL.into()),
        service_key: Some("service-secret".into()),
        anon_key: Some("anon-public".into()),
        ..Default::default()
    }
}

pub fn environment() -> Arc<Environment> {
    Arc::new(settings().resolve().expect("test settings resolve"))
}

pub fn plans() -> Value {
    json!([
        {"id": 1, "plan_type": "free", "price": 0, "monthly_limit": 5},
        {"id": 2, "plan_type": "pro", "price": 1900, "monthly_limit": 100},
        {"id": 3, "plan_type": "business", "price": 4900, "monthly_limit": -1}
    ])
}

pub fn features() -> Value {
    json!([
        {"plan_type": "free", "has_analytics": false, "has_custom_branding": false,
         "has_api_access": false, "has_advanced_reporting": false, "max_team_members": 1},
        {"plan_type": "pro", "has_analytics": true, "has_custom_branding": true,
         "has_api_access": false, "has_advanced_reporting": true, "max_team_members": 5},
        {"plan_type": "business", "has_analytics": true, "has_custom_branding": true,
         "has_api_access": true, "has_advanced_reporting": true, "max_team_members": 50}
    ])
}

pub fn subscription_response(with_checkout: bool) -> Value {
    let mut data = json!({
        "customerId": "cus_test_123",
        "priceId": "price_pro_monthly",
        "planType": "pro"
    });
    if with_checkout {
        data["checkoutUrl"] = json!("https://checkout.example.com/c/pay/cs_test");
    }
    json!({ "data": data })
}

pub const HEALTHY_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <link rel="manifest" href="/manifest.json" />
    <script type="module" crossorigin src="/assets/index-4f2a.js"></script>
    <link rel="stylesheet" crossorigin href="/assets/index-9c1e.css">
  </head>
  <body><div id="root"></div></body>
</html>"#;
