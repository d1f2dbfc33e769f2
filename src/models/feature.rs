//! Feature-flag configuration rows

use serde::{Deserialize, Serialize};

use super::plan::PlanType;

/// One row of the feature-flag resource; exactly one per plan type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub plan_type: PlanType,
    pub has_analytics: bool,
    pub has_custom_branding: bool,
    pub has_api_access: bool,
    pub has_advanced_reporting: bool,
    pub max_team_members: i64,
}

impl FeatureRecord {
    /// Names of the boolean flags that are switched on
    pub fn enabled_flags(&self) -> Vec<&'static str> {
        [
            ("analytics", self.has_analytics),
            ("custom_branding", self.has_custom_branding),
            ("api_access", self.has_api_access),
            ("advanced_reporting", self.has_advanced_reporting),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }

    /// Flags and limits that `self` grants but `richer` does not.
    ///
    /// A tier is at least as rich as another when it keeps every flag and
    /// allows at least as many team members.
    pub fn regressions_in(&self, richer: &FeatureRecord) -> Vec<String> {
        let mut lost: Vec<String> = self
            .enabled_flags()
            .into_iter()
            .filter(|flag| !richer.enabled_flags().contains(flag))
            .map(str::to_string)
            .collect();

        if richer.max_team_members < self.max_team_members {
            lost.push(format!(
                "max_team_members {} < {}",
                richer.max_team_members, self.max_team_members
            ));
        }
        lost
    }
}
