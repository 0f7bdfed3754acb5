//! Capability Traits
//!
//! Abstractions over the IAM provider and the operator notification channel.
//! The remediator only talks to these traits, so the AWS adapters can be
//! swapped for in-memory doubles.

use async_trait::async_trait;

use super::types::{AccessCredential, ChannelError, IamError, SecondFactorDevice};

/// Identity provider operations needed for containment
#[async_trait]
pub trait IamProvider: Send + Sync {
    /// List every access key of `actor`
    ///
    /// Fails with [`IamError::ActorNotFound`] when the actor is unknown.
    async fn list_access_credentials(&self, actor: &str)
        -> Result<Vec<AccessCredential>, IamError>;

    /// Set an access key to inactive
    async fn disable_access_credential(
        &self,
        actor: &str,
        credential_id: &str,
    ) -> Result<(), IamError>;

    /// Require a password reset at next console sign-in
    ///
    /// Fails with [`IamError::NoLoginMechanism`] when the actor has no
    /// console login.
    async fn force_password_reset(&self, actor: &str) -> Result<(), IamError>;

    /// List MFA devices registered to `actor`
    async fn list_second_factor_devices(
        &self,
        actor: &str,
    ) -> Result<Vec<SecondFactorDevice>, IamError>;
}

/// Operator notification sink
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ChannelError>;
}
