//! Remediator configuration
//!
//! Loaded once at startup and immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default notification subject
pub const DEFAULT_SUBJECT: &str = "IAM Auto Remediation Triggered";

/// Actors that must never be auto-remediated
///
/// Membership is an exact, case-sensitive string match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionSet(BTreeSet<String>);

impl ExemptionSet {
    pub fn new<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(actors.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list (e.g. the `EXEMPT_USERS` variable)
    ///
    /// Entries are trimmed; empty entries are dropped.
    pub fn from_list(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, actor: &str) -> bool {
        self.0.contains(actor)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Process-wide remediation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediatorConfig {
    /// Actors excluded from remediation
    pub exemptions: ExemptionSet,
    /// Subject line of the operator notification
    pub subject: String,
}

impl RemediatorConfig {
    pub fn new(exemptions: ExemptionSet) -> Self {
        Self {
            exemptions,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    /// Override the notification subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

impl Default for RemediatorConfig {
    fn default() -> Self {
        Self::new(ExemptionSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_list_trims_and_drops_empty_entries() {
        let set = ExemptionSet::from_list(" svc-deploy, ci-bot ,,terraform ");
        assert_eq!(set.len(), 3);
        assert!(set.contains("svc-deploy"));
        assert!(set.contains("ci-bot"));
        assert!(set.contains("terraform"));
    }

    #[test]
    fn test_membership_is_exact() {
        let set = ExemptionSet::from_list("svc-deploy");
        assert!(!set.contains("SVC-DEPLOY"));
        assert!(!set.contains("svc-deploy-2"));
        assert!(!set.contains("svc"));
    }

    #[test]
    fn test_empty_list() {
        assert!(ExemptionSet::from_list("").is_empty());
        assert!(ExemptionSet::from_list(" , ").is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = RemediatorConfig::new(ExemptionSet::new(["a"])).with_subject("Alert");
        assert_eq!(config.subject, "Alert");
        assert!(config.exemptions.contains("a"));
        assert_eq!(RemediatorConfig::default().subject, DEFAULT_SUBJECT);
    }
}
