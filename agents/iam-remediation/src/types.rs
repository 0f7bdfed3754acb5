//! Types for IAM auto-remediation
//!
//! Credentials, devices, outcomes and the error taxonomy shared by the
//! remediation pipeline and its provider adapters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a provider-side access key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "active"),
            CredentialStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// An access key belonging to an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential {
    /// Access key ID (e.g., "AKIA...")
    pub id: String,
    /// Current status as reported by the provider
    pub status: CredentialStatus,
}

impl AccessCredential {
    pub fn active(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: CredentialStatus::Active,
        }
    }

    pub fn inactive(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: CredentialStatus::Inactive,
        }
    }
}

/// A registered second-factor (MFA) device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondFactorDevice {
    pub serial_number: String,
}

/// Terminal status of one remediation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Skipped,
    Error,
    Remediated,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Skipped => write!(f, "skipped"),
            OutcomeStatus::Error => write!(f, "error"),
            OutcomeStatus::Remediated => write!(f, "remediated"),
        }
    }
}

/// Result of a single `remediate` invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub status: OutcomeStatus,
    /// Why the run was skipped or failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Actor the run was about, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Confirmed actions, in the order they were taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

impl RemediationOutcome {
    pub fn skipped(reason: impl Into<String>, actor: Option<String>) -> Self {
        Self {
            status: OutcomeStatus::Skipped,
            reason: Some(reason.into()),
            actor,
            actions: None,
        }
    }

    /// Failed run. Actions already confirmed are kept so the caller can see
    /// what state the actor was left in.
    pub fn error(reason: impl Into<String>, actor: String, actions: Vec<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            reason: Some(reason.into()),
            actor: Some(actor),
            actions: (!actions.is_empty()).then_some(actions),
        }
    }

    pub fn remediated(actor: String, actions: Vec<String>) -> Self {
        Self {
            status: OutcomeStatus::Remediated,
            reason: None,
            actor: Some(actor),
            actions: Some(actions),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }

    /// Reason to report when the run failed; `None` for skipped or remediated
    pub fn failure_reason(&self) -> Option<&str> {
        self.is_error()
            .then(|| self.reason.as_deref().unwrap_or("unknown error"))
    }

    /// Format the outcome for display
    pub fn display(&self) -> String {
        let mut out = format!("Remediation {}", self.status);
        if let Some(actor) = &self.actor {
            out.push_str(&format!("\n  Actor: {}", actor));
        }
        if let Some(reason) = &self.reason {
            out.push_str(&format!("\n  Reason: {}", reason));
        }
        if let Some(actions) = &self.actions {
            out.push_str("\n  Actions:");
            for action in actions {
                out.push_str(&format!("\n    - {}", action));
            }
        }
        out
    }
}

/// Failures reported by an IAM provider
///
/// `ActorNotFound` and `NoLoginMechanism` are the two conditions the pipeline
/// treats specially; everything else is `Provider`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IamError {
    /// The provider has no principal with this name
    #[error("actor not found: {0}")]
    ActorNotFound(String),

    /// The principal has no interactive login to reset
    #[error("no login mechanism for actor: {0}")]
    NoLoginMechanism(String),

    /// Any other provider failure
    #[error("provider error: {0}")]
    Provider(String),
}

/// Notification channel failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification channel error: {0}")]
pub struct ChannelError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_lowercase_status_and_omits_empty_fields() {
        let outcome = RemediationOutcome::skipped("actor is exempted", Some("svc".to_string()));
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "actor is exempted");
        assert_eq!(json["actor"], "svc");
        assert!(json.get("actions").is_none());
    }

    #[test]
    fn test_error_outcome_keeps_confirmed_actions() {
        let outcome = RemediationOutcome::error(
            "boom",
            "alice".to_string(),
            vec!["Disabled access key: AKIA1".to_string()],
        );
        assert!(outcome.is_error());
        assert_eq!(outcome.actions.as_ref().map(Vec::len), Some(1));

        let empty = RemediationOutcome::error("boom", "alice".to_string(), vec![]);
        assert_eq!(empty.actions, None);
    }

    #[test]
    fn test_failure_reason_only_for_errors() {
        let failed = RemediationOutcome::error("actor does not exist", "ghost".to_string(), vec![]);
        assert_eq!(failed.failure_reason(), Some("actor does not exist"));

        let skipped = RemediationOutcome::skipped("actor is exempted", None);
        assert_eq!(skipped.failure_reason(), None);

        let done = RemediationOutcome::remediated("alice".to_string(), vec![]);
        assert_eq!(done.failure_reason(), None);
    }

    #[test]
    fn test_display_lists_actions() {
        let outcome = RemediationOutcome::remediated(
            "alice".to_string(),
            vec!["No console access".to_string()],
        );
        let text = outcome.display();
        assert!(text.starts_with("Remediation remediated"));
        assert!(text.contains("Actor: alice"));
        assert!(text.contains("- No console access"));
    }
}
