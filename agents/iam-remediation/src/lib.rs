//! IAM Auto-Remediation Agent Library
//!
//! Contains a suspicious IAM actor as soon as an identity event arrives:
//! disables its access keys, forces a password reset, records MFA status
//! and notifies operators.
//!
//! ## Example Usage
//!
//! ```ignore
//! use iam_remediation::{aws, ExemptionSet, IdentityEvent, Remediator, RemediatorConfig};
//!
//! let sdk = aws::load_config().await;
//! let remediator = Remediator::new(
//!     Arc::new(aws::AwsIamProvider::new(&sdk)),
//!     Arc::new(aws::SnsChannel::new(&sdk, topic_arn)),
//!     RemediatorConfig::new(ExemptionSet::from_list("svc-deploy,ci-bot")),
//! );
//!
//! let outcome = remediator.remediate(&IdentityEvent::from_path("event.json")?).await;
//! ```

pub mod aws;
pub mod config;
pub mod event;
pub mod providers;
pub mod remediator;
pub mod server;
pub mod types;

pub use config::{ExemptionSet, RemediatorConfig};
pub use event::{EventError, IdentityEvent};
pub use providers::{IamProvider, NotificationChannel};
pub use remediator::{RemediationStage, Remediator};
pub use types::*;
