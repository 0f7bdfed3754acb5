//! IAM Remediation Pipeline
//!
//! Runs the containment sequence for one identity event:
//!
//! 1. Extract the actor from the event
//! 2. Skip exempted actors
//! 3. Disable every access key
//! 4. Force a password reset (actors without console access are fine)
//! 5. Record MFA status
//! 6. Notify operators with the action log
//!
//! Any failure after step 2 ends the run with an `error` outcome. Nothing is
//! retried here; retries belong to whatever delivered the event.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::RemediatorConfig;
use crate::event::IdentityEvent;
use crate::providers::{IamProvider, NotificationChannel};
use crate::types::{ChannelError, IamError, RemediationOutcome};

pub const NO_ACTOR_REASON: &str = "no identifying actor found";
pub const EXEMPT_REASON: &str = "actor is exempted";
pub const ACTOR_NOT_FOUND_REASON: &str = "actor does not exist";

pub const PASSWORD_RESET_ACTION: &str = "Password reset forced";
pub const NO_CONSOLE_ACTION: &str = "No console access";
pub const MFA_ENABLED_ACTION: &str = "MFA already enabled";
pub const MFA_MISSING_ACTION: &str = "MFA not enabled - treat as restricted until enabled";

/// States of a remediation run
///
/// `Skipped`, `Error` and `Notified` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationStage {
    Start,
    Skipped,
    CredentialsDisabled,
    ReAuthHandled,
    MfaChecked,
    Notified,
    Error,
}

impl RemediationStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Error | Self::Notified)
    }
}

impl std::fmt::Display for RemediationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Skipped => "skipped",
            Self::CredentialsDisabled => "credentials_disabled",
            Self::ReAuthHandled => "reauth_handled",
            Self::MfaChecked => "mfa_checked",
            Self::Notified => "notified",
            Self::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Fatal failure of one pipeline step
#[derive(Debug, Error)]
enum StepFailure {
    #[error("actor does not exist")]
    ActorNotFound,

    #[error("failed to {step}: {source}")]
    Provider { step: String, source: IamError },

    #[error("failed to publish notification: {0}")]
    Channel(#[from] ChannelError),
}

impl StepFailure {
    fn provider(step: impl Into<String>, source: IamError) -> Self {
        Self::Provider {
            step: step.into(),
            source,
        }
    }
}

/// Event-driven IAM remediator
///
/// Holds only read-only state, so one instance can serve concurrent
/// invocations behind an `Arc`.
pub struct Remediator {
    iam: Arc<dyn IamProvider>,
    channel: Arc<dyn NotificationChannel>,
    config: RemediatorConfig,
}

impl Remediator {
    pub fn new(
        iam: Arc<dyn IamProvider>,
        channel: Arc<dyn NotificationChannel>,
        config: RemediatorConfig,
    ) -> Self {
        Self {
            iam,
            channel,
            config,
        }
    }

    /// Remediate the actor named by `event`
    ///
    /// Always returns an outcome; provider and channel failures become
    /// `error` outcomes.
    pub async fn remediate(&self, event: &IdentityEvent) -> RemediationOutcome {
        let Some(actor) = event.actor() else {
            info!(
                event_name = event.event_name().unwrap_or("unknown"),
                stage = %RemediationStage::Skipped,
                "No actor in event, skipping"
            );
            return RemediationOutcome::skipped(NO_ACTOR_REASON, None);
        };

        if self.config.exemptions.contains(&actor) {
            info!(
                actor = %actor,
                stage = %RemediationStage::Skipped,
                "Actor is exempted, skipping"
            );
            return RemediationOutcome::skipped(EXEMPT_REASON, Some(actor));
        }

        warn!(
            actor = %actor,
            event_name = event.event_name().unwrap_or("unknown"),
            source_ip = event.source_ip().unwrap_or("unknown"),
            "🚨 Starting IAM remediation"
        );

        let mut actions = Vec::new();
        let mut stage = RemediationStage::Start;

        match self.run(&actor, &mut actions, &mut stage).await {
            Ok(()) => {
                info!(
                    actor = %actor,
                    actions = actions.len(),
                    stage = %stage,
                    "✅ Remediation complete"
                );
                RemediationOutcome::remediated(actor, actions)
            }
            Err(failure) => {
                error!(
                    actor = %actor,
                    last_stage = %stage,
                    stage = %RemediationStage::Error,
                    error = %failure,
                    "Remediation aborted"
                );
                RemediationOutcome::error(failure.to_string(), actor, actions)
            }
        }
    }

    async fn run(
        &self,
        actor: &str,
        actions: &mut Vec<String>,
        stage: &mut RemediationStage,
    ) -> Result<(), StepFailure> {
        self.disable_credentials(actor, actions).await?;
        advance(stage, RemediationStage::CredentialsDisabled);

        self.force_reauthentication(actor, actions).await?;
        advance(stage, RemediationStage::ReAuthHandled);

        self.check_second_factor(actor, actions).await?;
        advance(stage, RemediationStage::MfaChecked);

        self.notify(actions).await?;
        advance(stage, RemediationStage::Notified);

        Ok(())
    }

    async fn disable_credentials(
        &self,
        actor: &str,
        actions: &mut Vec<String>,
    ) -> Result<(), StepFailure> {
        let credentials = match self.iam.list_access_credentials(actor).await {
            Ok(credentials) => credentials,
            Err(IamError::ActorNotFound(_)) => return Err(StepFailure::ActorNotFound),
            Err(e) => return Err(StepFailure::provider("list access keys", e)),
        };

        debug!(actor = %actor, count = credentials.len(), "Listed access keys");

        for credential in credentials {
            self.iam
                .disable_access_credential(actor, &credential.id)
                .await
                .map_err(|e| {
                    StepFailure::provider(format!("disable access key {}", credential.id), e)
                })?;

            info!(
                actor = %actor,
                key_id = %credential.id,
                previous_status = %credential.status,
                "Disabled access key"
            );
            actions.push(format!("Disabled access key: {}", credential.id));
        }

        Ok(())
    }

    async fn force_reauthentication(
        &self,
        actor: &str,
        actions: &mut Vec<String>,
    ) -> Result<(), StepFailure> {
        match self.iam.force_password_reset(actor).await {
            Ok(()) => {
                info!(actor = %actor, "Password reset forced");
                actions.push(PASSWORD_RESET_ACTION.to_string());
            }
            Err(IamError::NoLoginMechanism(_)) => {
                debug!(actor = %actor, "Actor has no console login");
                actions.push(NO_CONSOLE_ACTION.to_string());
            }
            Err(e) => return Err(StepFailure::provider("force password reset", e)),
        }
        Ok(())
    }

    async fn check_second_factor(
        &self,
        actor: &str,
        actions: &mut Vec<String>,
    ) -> Result<(), StepFailure> {
        let devices = self
            .iam
            .list_second_factor_devices(actor)
            .await
            .map_err(|e| StepFailure::provider("list MFA devices", e))?;

        if devices.is_empty() {
            warn!(actor = %actor, "Actor has no MFA device");
            actions.push(MFA_MISSING_ACTION.to_string());
        } else {
            debug!(actor = %actor, devices = devices.len(), "MFA enabled");
            actions.push(MFA_ENABLED_ACTION.to_string());
        }
        Ok(())
    }

    async fn notify(&self, actions: &[String]) -> Result<(), StepFailure> {
        let message = actions.join("\n");
        self.channel.publish(&self.config.subject, &message).await?;
        info!(subject = %self.config.subject, "📣 Operators notified");
        Ok(())
    }
}

fn advance(stage: &mut RemediationStage, next: RemediationStage) {
    debug!(from = %stage, to = %next, "Stage transition");
    *stage = next;
}
