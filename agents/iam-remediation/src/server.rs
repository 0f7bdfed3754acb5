//! Webhook Server
//!
//! Receives identity events over HTTP (e.g. from an EventBridge API
//! destination) and runs one remediation per request.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::event::IdentityEvent;
use crate::remediator::Remediator;
use crate::types::RemediationOutcome;

/// Build the webhook router
pub fn router(remediator: Arc<Remediator>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(handle_event))
        .layer(TraceLayer::new_for_http())
        .with_state(remediator)
}

/// Serve the webhook until the process is stopped
pub async fn serve(remediator: Arc<Remediator>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("📡 IAM remediator listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(remediator)).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn handle_event(
    State(remediator): State<Arc<Remediator>>,
    Json(event): Json<IdentityEvent>,
) -> (StatusCode, Json<RemediationOutcome>) {
    let invocation_id = Uuid::new_v4();
    let span = tracing::info_span!("remediation", invocation_id = %invocation_id);

    let outcome = remediator.remediate(&event).instrument(span).await;

    let status = if outcome.is_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExemptionSet, RemediatorConfig};
    use crate::remediator::tests::{FakeChannel, FakeIam};
    use crate::types::{AccessCredential, IamError, OutcomeStatus};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(iam: FakeIam, channel: Arc<FakeChannel>) -> Router {
        let remediator = Remediator::new(
            Arc::new(iam),
            channel,
            RemediatorConfig::new(ExemptionSet::from_list("svc-deploy")),
        );
        router(Arc::new(remediator))
    }

    fn post_event(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/events")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn outcome_of(response: axum::response::Response) -> RemediationOutcome {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(FakeIam::default(), Arc::new(FakeChannel::default()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_remediated_event_returns_ok() {
        let channel = Arc::new(FakeChannel::default());
        let iam = FakeIam {
            keys: vec![AccessCredential::active("AKIA1")],
            ..Default::default()
        };

        let response = app(iam, channel.clone())
            .oneshot(post_event(
                r#"{"detail": {"userIdentity": {"userName": "alice"}}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let outcome = outcome_of(response).await;
        assert_eq!(outcome.status, OutcomeStatus::Remediated);
        assert_eq!(outcome.actor.as_deref(), Some("alice"));
        assert_eq!(channel.published().len(), 1);
    }

    #[tokio::test]
    async fn test_exempted_event_returns_ok_skipped() {
        let response = app(FakeIam::default(), Arc::new(FakeChannel::default()))
            .oneshot(post_event(
                r#"{"detail": {"requestParameters": {"userName": "svc-deploy"}}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(outcome_of(response).await.status, OutcomeStatus::Skipped);
    }

    #[tokio::test]
    async fn test_error_outcome_returns_bad_gateway() {
        let iam = FakeIam {
            list_error: Some(IamError::ActorNotFound("ghost".to_string())),
            ..Default::default()
        };

        let response = app(iam, Arc::new(FakeChannel::default()))
            .oneshot(post_event(
                r#"{"detail": {"userIdentity": {"userName": "ghost"}}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let outcome = outcome_of(response).await;
        assert_eq!(outcome.reason.as_deref(), Some("actor does not exist"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let response = app(FakeIam::default(), Arc::new(FakeChannel::default()))
            .oneshot(post_event("{not json"))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
