//! Declarative assertions over a probe response

use serde_json::Value;

use crate::probe::ProbeError;
use crate::report::FailureKind;

/// How a missing or mismatching field is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absence is a contract violation (Fail)
    Required,
    /// Absence is advisory (Warn)
    Optional,
}

impl Requirement {
    fn kind(&self) -> FailureKind {
        match self {
            Requirement::Required => FailureKind::ContractViolation,
            Requirement::Optional => FailureKind::SoftDegradation,
        }
    }
}

/// A single non-passing observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FailureKind,
    pub detail: String,
}

impl Finding {
    pub fn contract(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ContractViolation,
            detail: detail.into(),
        }
    }

    pub fn soft(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::SoftDegradation,
            detail: detail.into(),
        }
    }
}

/// Accumulates findings, notes and a pass summary while a check is evaluated
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
    pub notes: Vec<String>,
    pub summary: Option<String>,
}

impl Evaluation {
    pub fn contract(&mut self, detail: impl Into<String>) {
        self.findings.push(Finding::contract(detail));
    }

    pub fn soft(&mut self, detail: impl Into<String>) {
        self.findings.push(Finding::soft(detail));
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn summarize(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }

    /// Most severe finding, if any
    pub fn worst(&self) -> Option<&Finding> {
        self.findings
            .iter()
            .max_by_key(|f| f.kind.status())
    }
}

/// Typed predicate over one JSON document
pub type RowRule = fn(&Value, &mut Evaluation);

/// Typed predicate over several JSON documents fetched by one check
pub type JoinRule = fn(&[Value], &mut Evaluation);

/// One declarative assertion
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Field at a JSON pointer exists, is not null, and is not an empty string
    FieldPresent {
        pointer: String,
        requirement: Requirement,
    },
    /// Field at a JSON pointer equals the expected value
    FieldEquals {
        pointer: String,
        expected: Value,
        requirement: Requirement,
    },
    /// Array at a JSON pointer has at least one element
    ArrayNonEmpty { pointer: String },
    /// Each row of the document satisfies a typed rule
    Rows { rule: RowRule },
    /// Raw body contains at least one of the given markers
    BodyContains {
        label: String,
        any_of: Vec<String>,
        requirement: Requirement,
    },
}

impl Assertion {
    pub fn required_field(pointer: impl Into<String>) -> Self {
        Assertion::FieldPresent {
            pointer: pointer.into(),
            requirement: Requirement::Required,
        }
    }

    pub fn optional_field(pointer: impl Into<String>) -> Self {
        Assertion::FieldPresent {
            pointer: pointer.into(),
            requirement: Requirement::Optional,
        }
    }

    pub fn equals(pointer: impl Into<String>, expected: Value) -> Self {
        Assertion::FieldEquals {
            pointer: pointer.into(),
            expected,
            requirement: Requirement::Required,
        }
    }

    pub fn non_empty_array(pointer: impl Into<String>) -> Self {
        Assertion::ArrayNonEmpty {
            pointer: pointer.into(),
        }
    }

    pub fn rows(rule: RowRule) -> Self {
        Assertion::Rows { rule }
    }

    pub fn marker(label: impl Into<String>, any_of: &[&str]) -> Self {
        Assertion::BodyContains {
            label: label.into(),
            any_of: any_of.iter().map(|m| m.to_string()).collect(),
            requirement: Requirement::Optional,
        }
    }

    /// Whether this assertion needs the body parsed as JSON
    pub fn needs_json(&self) -> bool {
        !matches!(self, Assertion::BodyContains { .. })
    }

    /// Evaluate against a response body.
    ///
    /// `json` is the body parsed once up front; it is only consulted by
    /// assertions that need it.
    pub fn evaluate(
        &self,
        text: &str,
        json: Option<&Result<Value, ProbeError>>,
        eval: &mut Evaluation,
    ) {
        if let Assertion::BodyContains {
            label,
            any_of,
            requirement,
        } = self
        {
            if !any_of.iter().any(|m| text.contains(m.as_str())) {
                let finding = Finding {
                    kind: requirement.kind(),
                    detail: format!("{label} marker not found"),
                };
                eval.findings.push(finding);
            }
            return;
        }

        let document = match json {
            Some(Ok(value)) => value,
            Some(Err(err)) => {
                eval.contract(err.to_string());
                return;
            }
            None => {
                eval.contract("response body was not parsed");
                return;
            }
        };

        match self {
            Assertion::FieldPresent {
                pointer,
                requirement,
            } => {
                if !is_present(document.pointer(pointer)) {
                    eval.findings.push(Finding {
                        kind: requirement.kind(),
                        detail: format!("{} is missing", field_name(pointer)),
                    });
                }
            }
            Assertion::FieldEquals {
                pointer,
                expected,
                requirement,
            } => match document.pointer(pointer) {
                Some(actual) if actual == expected => {}
                Some(actual) => eval.findings.push(Finding {
                    kind: requirement.kind(),
                    detail: format!("{} is {actual}, expected {expected}", field_name(pointer)),
                }),
                None => eval.findings.push(Finding {
                    kind: requirement.kind(),
                    detail: format!("{} is missing", field_name(pointer)),
                }),
            },
            Assertion::ArrayNonEmpty { pointer } => match document.pointer(pointer) {
                Some(Value::Array(items)) if !items.is_empty() => {}
                Some(Value::Array(_)) => {
                    eval.contract(format!("{} is an empty array", field_name(pointer)))
                }
                Some(other) => eval.contract(format!(
                    "{} is not an array ({})",
                    field_name(pointer),
                    json_type(other)
                )),
                None => eval.contract(format!("{} is missing", field_name(pointer))),
            },
            Assertion::Rows { rule } => rule(document, eval),
            Assertion::BodyContains { .. } => unreachable!("handled above"),
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// `/data/customerId` -> `data.customerId`, `` -> `response body`
fn field_name(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "response body".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
