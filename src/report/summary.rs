//! Aggregate report over all check results

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

use super::result::{CheckStatus, ProbeResult};

/// Exit code for a clean (or warn-only) run
pub const EXIT_OK: i32 = 0;
/// Exit code when any check failed or the run was cut short
pub const EXIT_FAILED: i32 = 1;

/// Consolidated outcome of one run, in declaration order
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// True when the run was cancelled before every check completed
    pub partial: bool,
    /// Checks that never produced a result because the run was cancelled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_run: Vec<String>,
    pub results: Vec<ProbeResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    overall: CheckStatus,
    counts: Counts,
    exit_code: i32,
    #[serde(flatten)]
    report: &'a Report,
}

impl Report {
    pub fn new(started_at: DateTime<Utc>, duration: Duration, results: Vec<ProbeResult>) -> Self {
        Self {
            started_at,
            duration,
            partial: false,
            not_run: Vec::new(),
            results,
        }
    }

    pub fn partial(mut self, not_run: Vec<String>) -> Self {
        self.partial = true;
        self.not_run = not_run;
        self
    }

    /// Fail if any Fail, else Warn if any Warn, else Pass
    pub fn overall(&self) -> CheckStatus {
        self.results
            .iter()
            .map(|r| r.status)
            .max()
            .unwrap_or(CheckStatus::Pass)
    }

    pub fn counts(&self) -> Counts {
        let count = |status| self.results.iter().filter(|r| r.status == status).count();
        Counts {
            total: self.results.len(),
            passed: count(CheckStatus::Pass),
            warned: count(CheckStatus::Warn),
            failed: count(CheckStatus::Fail),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.name.as_str()).collect()
    }

    /// Process exit status for this report.
    ///
    /// Warn exits 0 unless `fail_on_warn` is set. A partial run never exits 0.
    pub fn exit_code(&self, fail_on_warn: bool) -> i32 {
        if self.partial {
            return EXIT_FAILED;
        }
        match self.overall() {
            CheckStatus::Pass => EXIT_OK,
            CheckStatus::Warn if !fail_on_warn => EXIT_OK,
            CheckStatus::Warn | CheckStatus::Fail => EXIT_FAILED,
        }
    }

    /// Machine-readable form for CI
    pub fn to_json(&self, fail_on_warn: bool) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportDocument {
            overall: self.overall(),
            counts: self.counts(),
            exit_code: self.exit_code(fail_on_warn),
            report: self,
        })
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
