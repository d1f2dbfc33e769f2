//! Plan configuration rows

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Plan tier. Declaration order is the richness order: free < pro < business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Free,
    Pro,
    Business,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::Pro => "pro",
            PlanType::Business => "business",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(PlanType::Free),
            "pro" => Ok(PlanType::Pro),
            "business" => Ok(PlanType::Business),
            _ => anyhow::bail!("Invalid plan type: {s}. Use: free, pro, business"),
        }
    }
}

/// Row identifier; the data store may hand out integers or UUID strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

/// Monthly usage limit. `-1` or `null` in the store means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyLimit {
    Limited(i64),
    Unbounded,
}

impl MonthlyLimit {
    /// Sentinel the store uses for "no limit"
    pub const UNBOUNDED_SENTINEL: i64 = -1;

    pub fn is_non_negative(&self) -> bool {
        match self {
            MonthlyLimit::Limited(n) => *n >= 0,
            MonthlyLimit::Unbounded => true,
        }
    }
}

impl fmt::Display for MonthlyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthlyLimit::Limited(n) => write!(f, "{n}"),
            MonthlyLimit::Unbounded => f.write_str("unlimited"),
        }
    }
}

impl Serialize for MonthlyLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MonthlyLimit::Limited(n) => serializer.serialize_i64(*n),
            MonthlyLimit::Unbounded => serializer.serialize_i64(Self::UNBOUNDED_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for MonthlyLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<serde_json::Number> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(MonthlyLimit::Unbounded),
            Some(n) => {
                let n = n
                    .as_i64()
                    .ok_or_else(|| de::Error::custom(format!("monthly_limit is not an integer: {n}")))?;
                if n == Self::UNBOUNDED_SENTINEL {
                    Ok(MonthlyLimit::Unbounded)
                } else {
                    Ok(MonthlyLimit::Limited(n))
                }
            }
        }
    }
}

/// One row of the plan configuration resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub plan_type: PlanType,
    /// Price in minor currency units (cents)
    pub price: i64,
    #[serde(default = "unbounded")]
    pub monthly_limit: MonthlyLimit,
}

fn unbounded() -> MonthlyLimit {
    MonthlyLimit::Unbounded
}

impl PlanRecord {
    /// Price in major currency units, for display only
    pub fn price_major(&self) -> f64 {
        self.price as f64 / 100.0
    }
}
