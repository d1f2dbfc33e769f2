//! Endpoint descriptors and the concrete requests built from them

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::config::Environment;
use crate::error::HarnessResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Which credential a probe presents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    None,
    /// Elevated data-store credential
    Service,
    /// Public, low-privilege credential
    Anon,
}

/// Where the request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Path below the data-store / functions base URL
    Base(String),
    /// The served frontend bundle
    Frontend,
}

/// Static description of one endpoint contract
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub method: Method,
    pub target: Target,
    pub credential: Credential,
    pub body: Option<Value>,
}

impl EndpointSpec {
    pub fn get(path: impl Into<String>, credential: Credential) -> Self {
        Self {
            method: Method::Get,
            target: Target::Base(path.into()),
            credential,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, credential: Credential, body: Value) -> Self {
        Self {
            method: Method::Post,
            target: Target::Base(path.into()),
            credential,
            body: Some(body),
        }
    }

    pub fn frontend() -> Self {
        Self {
            method: Method::Get,
            target: Target::Frontend,
            credential: Credential::None,
            body: None,
        }
    }

    /// Bind the descriptor to a concrete environment
    pub fn build(&self, env: &Environment) -> HarnessResult<ProbeRequest> {
        let url = match &self.target {
            Target::Base(path) => env.endpoint(path)?,
            Target::Frontend => env.frontend_url.clone(),
        };

        let mut headers = Vec::new();
        let key = match self.credential {
            Credential::None => None,
            Credential::Service => Some(env.service_key.expose()),
            Credential::Anon => Some(env.anon_key.expose()),
        };
        if let Some(key) = key {
            headers.push(("apikey".to_string(), key.to_string()));
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        }
        if self.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        Ok(ProbeRequest {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
        })
    }
}

/// A fully resolved request, ready for a transport
#[derive(Clone, PartialEq)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ProbeRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ProbeRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &header_names)
            .field("body", &self.body)
            .finish()
    }
}
