mod schedule;

use std::sync::Arc;

use adaptogen_store::ResultStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id;
use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::scheduler::ScheduleError;

pub struct AppState<S> {
    pub orchestrator: Arc<Orchestrator<S>>,
}

// Derived Clone would require `S: Clone`; only the Arc is cloned.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    ok: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                detail: None,
            },
        }
    }

    #[must_use]
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.body.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.body.error
    }

    pub(super) fn from_orchestrator(request_id: &str, error: OrchestratorError) -> Self {
        match error {
            OrchestratorError::Schedule(ScheduleError::InvalidCron { reason, .. }) => {
                Self::bad_request("Invalid cron expression.").with_detail(reason)
            }
            OrchestratorError::Schedule(ScheduleError::Stopped) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down")
            }
            OrchestratorError::Schedule(e @ ScheduleError::Scheduler(_)) => {
                tracing::error!(request_id, error = %e, "api: failed to register job");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to schedule command",
                )
            }
            OrchestratorError::Store(e) => {
                tracing::error!(request_id, error = %e, "api: result store request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "result store request failed",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn build_app<S: ResultStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", post(schedule::schedule_and_run::<S>))
        .route("/health", get(health::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health<S: ResultStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    match state.orchestrator.cache().store().ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthData { ok: true })),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthData { ok: false }))
        }
    }
}

#[cfg(test)]
mod tests {
    use adaptogen_core::fingerprint;
    use adaptogen_runner::RunnerConfig;
    use adaptogen_store::{MemoryStore, ResultCache};
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, Request};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::scheduler::JobRegistry;

    async fn test_app() -> (Router, Arc<Orchestrator<MemoryStore>>) {
        let registry = JobRegistry::start().await.expect("scheduler");
        let orchestrator = Arc::new(Orchestrator::new(
            registry,
            ResultCache::new(MemoryStore::new()),
            RunnerConfig::default(),
        ));
        let app = build_app(AppState {
            orchestrator: Arc::clone(&orchestrator),
        });
        (app, orchestrator)
    }

    fn post_json(body: &Value) -> Request<Body> {
        post_raw(body.to_string())
    }

    fn post_raw(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("request")
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn api_error_omits_absent_detail() {
        let json = serde_json::to_value(&ApiError::bad_request("nope").body).expect("serialize");
        assert_eq!(json, json!({ "error": "nope" }));
    }

    #[test]
    fn invalid_cron_maps_to_bad_request_with_detail() {
        let err = ApiError::from_orchestrator(
            "req-1",
            OrchestratorError::Schedule(ScheduleError::InvalidCron {
                expression: "x".to_string(),
                reason: "bad".to_string(),
            }),
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.detail.as_deref(), Some("bad"));
    }

    #[tokio::test]
    async fn post_runs_live_then_serves_from_cache() {
        let (app, orchestrator) = test_app().await;
        let body = json!({ "cron": "*/5 * * * *", "command": "echo hello" });

        let first = app.clone().oneshot(post_json(&body)).await.expect("response");
        assert_eq!(first.status(), StatusCode::OK);
        let first = body_json(first).await;
        assert_eq!(first["source"], "live");
        assert_eq!(first["key"], fingerprint("echo hello").as_str());
        assert_eq!(first["result"]["stdout"], "hello");
        assert_eq!(first["result"]["exitCode"], 0);
        assert_eq!(first["result"]["ok"], true);

        let second = app.oneshot(post_json(&body)).await.expect("response");
        assert_eq!(second.status(), StatusCode::OK);
        let second = body_json(second).await;
        assert_eq!(second["source"], "redis");
        assert_eq!(second["result"], first["result"]);

        assert_eq!(orchestrator.registry().len().await, 1);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn scalar_and_list_keys_are_equivalent() {
        let (app, orchestrator) = test_app().await;

        let scalar = app
            .clone()
            .oneshot(post_json(
                &json!({ "cron": "0 0 1 1 *", "command": "printf %s", "keys": "a b" }),
            ))
            .await
            .expect("response");
        let scalar = body_json(scalar).await;
        assert_eq!(scalar["result"]["stdout"], "a b");
        assert_eq!(scalar["result"]["keys"], json!(["a b"]));

        let list = app
            .oneshot(post_json(
                &json!({ "cron": "0 0 1 1 *", "command": "printf '%s'", "keys": ["a b"] }),
            ))
            .await
            .expect("response");
        let list = body_json(list).await;
        assert_eq!(list["result"]["keys"], scalar["result"]["keys"]);
        assert_eq!(list["result"]["stdout"], scalar["result"]["stdout"]);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn missing_command_is_rejected() {
        let (app, orchestrator) = test_app().await;
        let response = app
            .oneshot(post_json(&json!({ "cron": "* * * * *" })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "`command` is required and must be a string.");
        assert!(json.get("detail").is_none());
        assert!(orchestrator.registry().is_empty().await);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn non_string_command_is_rejected() {
        let (app, orchestrator) = test_app().await;
        let response = app
            .oneshot(post_json(&json!({ "cron": "* * * * *", "command": ["ls"] })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn missing_cron_is_rejected() {
        let (app, orchestrator) = test_app().await;
        let response = app
            .oneshot(post_json(&json!({ "command": "echo hello" })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "`cron` is required and must be a string.");
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_body_reports_missing_command() {
        let (app, orchestrator) = test_app().await;
        let response = app
            .oneshot(post_raw("{not json"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "`command` is required and must be a string.");
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_cron_is_rejected_with_detail() {
        let (app, orchestrator) = test_app().await;
        let response = app
            .clone()
            .oneshot(post_json(
                &json!({ "cron": "not-a-cron", "command": "echo hello" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid cron expression.");
        assert!(json["detail"].is_string());
        assert!(orchestrator.registry().is_empty().await);

        let retry = app
            .oneshot(post_json(
                &json!({ "cron": "*/5 * * * *", "command": "echo hello" }),
            ))
            .await
            .expect("response");
        assert_eq!(retry.status(), StatusCode::OK);
        assert_eq!(orchestrator.registry().len().await, 1);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn store_failure_returns_internal_error() {
        let (app, orchestrator) = test_app().await;
        orchestrator.cache().store().set_available(false);

        let response = app
            .oneshot(post_json(
                &json!({ "cron": "0 0 1 1 *", "command": "echo hello" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn requests_after_shutdown_are_unavailable() {
        let (app, orchestrator) = test_app().await;
        orchestrator.shutdown().await;

        let response = app
            .oneshot(post_json(
                &json!({ "cron": "0 0 1 1 *", "command": "echo hello" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_reachable_store() {
        let (app, orchestrator) = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "ok": true }));
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn health_reports_unreachable_store() {
        let (app, orchestrator) = test_app().await;
        orchestrator.cache().store().set_available(false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await, json!({ "ok": false }));
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn request_id_is_echoed_or_generated() {
        let (app, orchestrator) = test_app().await;

        let echoed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            echoed.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some("req-123")
        );

        let generated = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let id = generated
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("generated request id");
        assert!(uuid::Uuid::parse_str(id).is_ok());
        orchestrator.shutdown().await;
    }
}
