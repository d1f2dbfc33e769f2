//! Named checks and the ordered set they form

use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;

use super::assertion::{Assertion, Evaluation, JoinRule};
use crate::config::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::probe::{Probe, ProbeError, ProbeRequest, ProbeResponse, Transport};
use crate::report::{FailureKind, ProbeResult};
use crate::utils::snippet;
use crate::validation::validate_check_name;

/// What a check does with its probe(s)
#[derive(Debug, Clone)]
pub enum CheckKind {
    /// One probe, a list of assertions over its response
    Single {
        probe: Probe,
        assertions: Vec<Assertion>,
    },
    /// Several probes fetched by this check alone, one rule over all bodies
    Joined {
        probes: Vec<Probe>,
        label: String,
        rule: JoinRule,
    },
}

/// A named check in the assertion set
#[derive(Debug, Clone)]
pub struct CheckSpec {
    pub name: String,
    pub description: String,
    pub kind: CheckKind,
}

impl CheckSpec {
    pub fn single(
        name: impl Into<String>,
        description: impl Into<String>,
        probe: Probe,
        assertions: Vec<Assertion>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CheckKind::Single { probe, assertions },
        }
    }

    pub fn joined(
        name: impl Into<String>,
        description: impl Into<String>,
        probes: Vec<Probe>,
        label: impl Into<String>,
        rule: JoinRule,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CheckKind::Joined {
                probes,
                label: label.into(),
                rule,
            },
        }
    }

    pub fn probes(&self) -> Vec<&Probe> {
        match &self.kind {
            CheckKind::Single { probe, .. } => vec![probe],
            CheckKind::Joined { probes, .. } => probes.iter().collect(),
        }
    }

    /// Number of network calls this check makes
    pub fn probe_count(&self) -> u32 {
        self.probes().len() as u32
    }

    /// Whether any probe has real external effects
    pub fn is_mutating(&self) -> bool {
        self.probes().iter().any(|p| p.mutating)
    }

    /// Execute the check and classify the outcome.
    ///
    /// Never returns an error: network failures, bad statuses and broken
    /// contracts all become a non-passing `ProbeResult`.
    pub fn run(&self, env: &Environment, transport: &dyn Transport) -> ProbeResult {
        let started = Instant::now();
        let result = match &self.kind {
            CheckKind::Single { probe, assertions } => {
                self.run_single(probe, assertions, env, transport)
            }
            CheckKind::Joined {
                probes,
                label,
                rule,
            } => self.run_joined(probes, label, *rule, env, transport),
        };
        result
            .with_duration(started.elapsed())
            .with_mutating(self.is_mutating())
    }

    fn run_single(
        &self,
        probe: &Probe,
        assertions: &[Assertion],
        env: &Environment,
        transport: &dyn Transport,
    ) -> ProbeResult {
        let (request, response) = match self.call(probe, env, transport) {
            Ok(pair) => pair,
            Err(result) => return *result,
        };

        let json = assertions
            .iter()
            .any(Assertion::needs_json)
            .then(|| response.json());

        let mut eval = Evaluation::default();
        for assertion in assertions {
            assertion.evaluate(response.text(), json.as_ref(), &mut eval);
        }

        let pass_detail = format!(
            "HTTP {} from {} {}; {} assertion(s) held",
            response.status(),
            request.method,
            request.url,
            assertions.len()
        );
        self.conclude(eval, pass_detail, response.snippet())
    }

    fn run_joined(
        &self,
        probes: &[Probe],
        label: &str,
        rule: JoinRule,
        env: &Environment,
        transport: &dyn Transport,
    ) -> ProbeResult {
        let mut documents = Vec::with_capacity(probes.len());
        for probe in probes {
            let (request, response) = match self.call(probe, env, transport) {
                Ok(pair) => pair,
                Err(result) => return *result,
            };
            match response.json() {
                Ok(value) => documents.push(value),
                Err(err) => return self.probe_failure(probe, &request, &err),
            }
        }

        let mut eval = Evaluation::default();
        rule(&documents, &mut eval);
        let pass_detail = format!("{label} held across {} resources", probes.len());
        let excerpt = documents
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        self.conclude(eval, pass_detail, snippet(&excerpt))
    }

    /// Build and send one probe request; failures come back as a finished result
    fn call(
        &self,
        probe: &Probe,
        env: &Environment,
        transport: &dyn Transport,
    ) -> Result<(ProbeRequest, ProbeResponse), Box<ProbeResult>> {
        let request = probe.request(env).map_err(|e| {
            Box::new(ProbeResult::fail(
                &self.name,
                FailureKind::CheckFault,
                format!("cannot build request for {}: {e}", probe.label),
            ))
        })?;
        let response = probe
            .execute(&request, transport)
            .map_err(|err| Box::new(self.probe_failure(probe, &request, &err)))?;
        Ok((request, response))
    }

    fn probe_failure(
        &self,
        probe: &Probe,
        request: &ProbeRequest,
        err: &ProbeError,
    ) -> ProbeResult {
        let kind = if err.is_network() {
            FailureKind::Network
        } else {
            FailureKind::ContractViolation
        };
        ProbeResult::fail(
            &self.name,
            kind,
            format!("{}: {err} from {} {}", probe.label, request.method, request.url),
        )
        .with_snippet(err.snippet().unwrap_or_default())
    }

    fn conclude(&self, eval: Evaluation, pass_detail: String, excerpt: String) -> ProbeResult {
        let result = match eval.worst() {
            None => ProbeResult::pass(&self.name, eval.summary.unwrap_or(pass_detail)),
            Some(worst) => {
                let status = worst.kind.status();
                let detail = eval
                    .findings
                    .iter()
                    .filter(|f| f.kind.status() == status)
                    .chain(eval.findings.iter().filter(|f| f.kind.status() != status))
                    .map(|f| f.detail.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                ProbeResult::fail(&self.name, worst.kind, detail)
            }
        };
        result.with_snippet(excerpt).with_notes(eval.notes)
    }
}

/// Ordered, validated collection of checks. Declaration order is report order.
#[derive(Debug, Clone, Default)]
pub struct AssertionSet {
    checks: Vec<CheckSpec>,
}

impl AssertionSet {
    pub fn new(checks: Vec<CheckSpec>) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &[CheckSpec] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn into_checks(self) -> Vec<CheckSpec> {
        self.checks
    }

    /// Drop checks whose probes have external side effects
    pub fn without_mutating(self) -> (Self, Vec<String>) {
        let (mutating, kept): (Vec<_>, Vec<_>) =
            self.checks.into_iter().partition(CheckSpec::is_mutating);
        let skipped = mutating.into_iter().map(|c| c.name).collect();
        (Self::new(kept), skipped)
    }

    /// Reject sets the engine could not report on faithfully
    pub fn validate(&self, env: &Environment) -> HarnessResult<()> {
        if self.checks.is_empty() {
            return Err(HarnessError::InvalidAssertionSet(
                "assertion set has no checks".into(),
            ));
        }

        let mut seen = HashSet::new();
        for check in &self.checks {
            validate_check_name(&check.name)
                .map_err(|e| HarnessError::InvalidAssertionSet(e.to_string()))?;
            if !seen.insert(check.name.as_str()) {
                return Err(HarnessError::InvalidAssertionSet(format!(
                    "duplicate check name '{}'",
                    check.name
                )));
            }
            if check.probes().is_empty() {
                return Err(HarnessError::InvalidAssertionSet(format!(
                    "check '{}' has no probe",
                    check.name
                )));
            }
            if let CheckKind::Single { assertions, .. } = &check.kind {
                if assertions.is_empty() {
                    return Err(HarnessError::InvalidAssertionSet(format!(
                        "check '{}' has no assertions",
                        check.name
                    )));
                }
            }
            for probe in check.probes() {
                probe.request(env).map_err(|e| {
                    HarnessError::InvalidAssertionSet(format!(
                        "check '{}' probe '{}': {e}",
                        check.name, probe.label
                    ))
                })?;
            }
        }
        Ok(())
    }
}
