//! AWS Adapters
//!
//! IAM and SNS implementations of the capability traits. Credentials and
//! region come from the standard AWS provider chain (env vars, profile,
//! container/instance role).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::StatusType;
use tracing::debug;

use crate::providers::{IamProvider, NotificationChannel};
use crate::types::{AccessCredential, ChannelError, CredentialStatus, IamError, SecondFactorDevice};

/// Load shared AWS configuration from the environment
pub async fn load_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

fn describe<E: std::error::Error>(err: E) -> String {
    DisplayErrorContext(err).to_string()
}

/// IAM provider backed by the AWS IAM API
pub struct AwsIamProvider {
    client: aws_sdk_iam::Client,
}

impl AwsIamProvider {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(config),
        }
    }
}

#[async_trait]
impl IamProvider for AwsIamProvider {
    async fn list_access_credentials(
        &self,
        actor: &str,
    ) -> Result<Vec<AccessCredential>, IamError> {
        let mut credentials = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_access_keys()
                .user_name(actor)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|err| {
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_no_such_entity_exception())
                    {
                        IamError::ActorNotFound(actor.to_string())
                    } else {
                        IamError::Provider(describe(&err))
                    }
                })?;

            for key in page.access_key_metadata() {
                let Some(id) = key.access_key_id() else {
                    continue;
                };
                let status = match key.status() {
                    Some(StatusType::Inactive) => CredentialStatus::Inactive,
                    _ => CredentialStatus::Active,
                };
                credentials.push(AccessCredential {
                    id: id.to_string(),
                    status,
                });
            }

            match page.marker() {
                Some(next) if page.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(actor = %actor, count = credentials.len(), "ListAccessKeys");
        Ok(credentials)
    }

    async fn disable_access_credential(
        &self,
        actor: &str,
        credential_id: &str,
    ) -> Result<(), IamError> {
        self.client
            .update_access_key()
            .user_name(actor)
            .access_key_id(credential_id)
            .status(StatusType::Inactive)
            .send()
            .await
            .map_err(|err| IamError::Provider(describe(&err)))?;

        Ok(())
    }

    async fn force_password_reset(&self, actor: &str) -> Result<(), IamError> {
        self.client
            .update_login_profile()
            .user_name(actor)
            .password_reset_required(true)
            .send()
            .await
            .map_err(|err| {
                // UpdateLoginProfile reports a missing login profile as NoSuchEntity
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_entity_exception())
                {
                    IamError::NoLoginMechanism(actor.to_string())
                } else {
                    IamError::Provider(describe(&err))
                }
            })?;

        Ok(())
    }

    async fn list_second_factor_devices(
        &self,
        actor: &str,
    ) -> Result<Vec<SecondFactorDevice>, IamError> {
        let output = self
            .client
            .list_mfa_devices()
            .user_name(actor)
            .send()
            .await
            .map_err(|err| IamError::Provider(describe(&err)))?;

        Ok(output
            .mfa_devices()
            .iter()
            .map(|device| SecondFactorDevice {
                serial_number: device.serial_number().to_string(),
            })
            .collect())
    }
}

/// Notification channel publishing to an SNS topic
pub struct SnsChannel {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsChannel {
    pub fn new(config: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(config),
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for SnsChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ChannelError> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|err| ChannelError(describe(&err)))?;

        debug!(
            topic = %self.topic_arn,
            message_id = output.message_id().unwrap_or("unknown"),
            "SNS message published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemediatorConfig;
    use crate::event::IdentityEvent;
    use crate::remediator::Remediator;
    use crate::types::OutcomeStatus;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    #[ignore] // Requires AWS credentials and a disposable IAM user
    async fn test_remediate_against_aws() {
        let user = std::env::var("TEST_IAM_USER").unwrap();
        let topic = std::env::var("SNS_TOPIC_ARN").unwrap();

        let config = load_config().await;
        let remediator = Remediator::new(
            Arc::new(AwsIamProvider::new(&config)),
            Arc::new(SnsChannel::new(&config, topic)),
            RemediatorConfig::default(),
        );

        let event = IdentityEvent::new(json!({"detail": {"userIdentity": {"userName": user}}}));
        let outcome = remediator.remediate(&event).await;
        assert_eq!(outcome.status, OutcomeStatus::Remediated);
    }
}
