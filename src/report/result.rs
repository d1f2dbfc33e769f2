//! Per-check results

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Outcome of one check. Ordered by severity: Pass < Warn < Fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a check did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// DNS, connect or timeout failure; no HTTP response
    Network,
    /// Wrong status code, missing required field, broken invariant
    ContractViolation,
    /// Optional enrichment missing or a non-fatal marker absent
    SoftDegradation,
    /// The check itself crashed; contained to this result
    CheckFault,
}

impl FailureKind {
    /// Status this kind of finding maps to
    pub fn status(&self) -> CheckStatus {
        match self {
            FailureKind::SoftDegradation => CheckStatus::Warn,
            _ => CheckStatus::Fail,
        }
    }
}

/// Result of executing a single check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Bounded excerpt of the raw response, for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Extra observations worth showing an operator (plan table rows etc.)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    pub mutating: bool,
}

impl ProbeResult {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, detail, None)
    }

    pub fn warn(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(
            name,
            CheckStatus::Warn,
            detail,
            Some(FailureKind::SoftDegradation),
        )
    }

    /// Non-passing result; the status follows `kind`
    pub fn fail(name: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::new(name, kind.status(), detail, Some(kind))
    }

    fn new(
        name: impl Into<String>,
        status: CheckStatus,
        detail: impl Into<String>,
        failure_kind: Option<FailureKind>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
            failure_kind,
            snippet: None,
            notes: Vec::new(),
            duration: Duration::ZERO,
            mutating: false,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        let snippet = snippet.into();
        if !snippet.is_empty() {
            self.snippet = Some(snippet);
        }
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_mutating(mut self, mutating: bool) -> Self {
        self.mutating = mutating;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
