//! Resolved run environment.
//!
//! Values come from CLI flags and environment variables, optionally backed by a
//! TOML file for the non-secret settings. Resolution happens once at start; the
//! resulting `Environment` is immutable and shared read-only with every check.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};
use crate::models::webhook::PROBE_EVENT_TYPE;
use crate::models::PlanType;
use crate::validation::{parse_http_url, validate_email};

/// Default customer email used by the subscription-creation probe
pub const DEFAULT_PROBE_EMAIL: &str = "postflight-probe@example.com";

/// A credential that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Everything a run needs to know about the deployment under test
#[derive(Debug, Clone)]
pub struct Environment {
    pub base_url: Url,
    pub frontend_url: Url,
    /// Elevated credential for the data-store resources
    pub service_key: Secret,
    /// Low-privilege credential for the public functions
    pub anon_key: Secret,
    pub probe_email: String,
    pub plan_type: PlanType,
    pub webhook_event_type: String,
}

impl Environment {
    /// Absolute URL of a path below the base URL
    pub fn endpoint(&self, path: &str) -> HarnessResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| HarnessError::InvalidConfig(format!("cannot build endpoint '{joined}': {e}")))
    }
}

/// Non-secret settings that may live in a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub frontend_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub probe_email: Option<String>,
    pub plan_type: Option<PlanType>,
    pub webhook_event_type: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Raw, possibly incomplete inputs gathered from flags and the environment
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub base_url: Option<String>,
    pub frontend_url: Option<String>,
    pub service_key: Option<String>,
    pub anon_key: Option<String>,
    pub probe_email: Option<String>,
    pub plan_type: Option<PlanType>,
    pub webhook_event_type: Option<String>,
}

impl Settings {
    /// Fill gaps from the file. Values already present win.
    pub fn with_file(mut self, file: &FileConfig) -> Self {
        self.base_url = self.base_url.or_else(|| file.base_url.clone());
        self.frontend_url = self.frontend_url.or_else(|| file.frontend_url.clone());
        self.probe_email = self.probe_email.or_else(|| file.probe_email.clone());
        self.plan_type = self.plan_type.or(file.plan_type);
        self.webhook_event_type = self
            .webhook_event_type
            .or_else(|| file.webhook_event_type.clone());
        self
    }

    /// Validate and freeze into an `Environment`
    pub fn resolve(self) -> HarnessResult<Environment> {
        let base_url = required(self.base_url, "base URL (POSTFLIGHT_BASE_URL)")?;
        let frontend_url = required(self.frontend_url, "frontend URL (POSTFLIGHT_FRONTEND_URL)")?;
        let service_key = required(self.service_key, "service credential (POSTFLIGHT_SERVICE_KEY)")?;
        let anon_key = required(self.anon_key, "anon credential (POSTFLIGHT_ANON_KEY)")?;

        let base_url =
            parse_http_url(&base_url).map_err(|e| HarnessError::InvalidConfig(e.to_string()))?;
        let frontend_url =
            parse_http_url(&frontend_url).map_err(|e| HarnessError::InvalidConfig(e.to_string()))?;

        let probe_email = self
            .probe_email
            .unwrap_or_else(|| DEFAULT_PROBE_EMAIL.to_string());
        validate_email(&probe_email).map_err(|e| HarnessError::InvalidConfig(e.to_string()))?;

        let webhook_event_type = self
            .webhook_event_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| PROBE_EVENT_TYPE.to_string());

        Ok(Environment {
            base_url,
            frontend_url,
            service_key: Secret::new(service_key),
            anon_key: Secret::new(anon_key),
            probe_email,
            plan_type: self.plan_type.unwrap_or(PlanType::Pro),
            webhook_event_type,
        })
    }
}

fn required(value: Option<String>, what: &str) -> HarnessResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(HarnessError::InvalidConfig(format!("missing {what}"))),
    }
}
