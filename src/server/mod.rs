//! HTTP surface of the relay.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::relay::schema::{ActionRequest, Scenario, ScenarioRequest, TurnOutcome};
use crate::relay::{Relay, RelayError};

pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/generate-scenario", post(generate_scenario))
        .route("/api/submit-action", post(submit_action))
        .with_state(relay)
}

/// Bind `config.bind_addr()` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, relay: Arc<Relay>) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Relay listening on http://{}", listener.local_addr()?);
    if !relay.is_configured() {
        warn!("No API key configured; scenario and action requests will fail");
    }
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("server error")
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

async fn generate_scenario(
    State(relay): State<Arc<Relay>>,
    Json(request): Json<ScenarioRequest>,
) -> Result<Json<Scenario>, ApiError> {
    Ok(Json(relay.generate_scenario(request).await?))
}

async fn submit_action(
    State(relay): State<Arc<Relay>>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    Ok(Json(relay.submit_action(request).await?))
}

pub struct ApiError(RelayError);

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            RelayError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Missing API Key" }),
            ),
            RelayError::EmptyAction => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Missing action" }),
            ),
            RelayError::InvalidScenario { raw, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to generate valid scenario", "raw": raw }),
            ),
            RelayError::InvalidOutcome { raw, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to process action", "raw": raw }),
            ),
            RelayError::Model(e) => {
                error!("model call failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error", "details": e.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::client::{ModelClient, ModelError, ModelRequest};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct Unconfigured;

    #[async_trait]
    impl ModelClient for Unconfigured {
        async fn complete(&self, _: ModelRequest) -> Result<String, ModelError> {
            Err(ModelError::EmptyReply)
        }

        fn is_configured(&self) -> bool {
            false
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(Arc::new(Relay::new(Arc::new(Unconfigured))));
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "ok", "message": "Server is running" })
        );
    }

    #[tokio::test]
    async fn missing_key_is_a_500() {
        let app = router(Arc::new(Relay::new(Arc::new(Unconfigured))));
        let response = app
            .oneshot(
                Request::post("/api/generate-scenario")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"theme": "tomb_raiding"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "Missing API Key" }));
    }
}
