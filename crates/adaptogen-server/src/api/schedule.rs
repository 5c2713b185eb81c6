//! `POST /`: schedule a command and return its latest result.

use adaptogen_core::normalize_keys;
use adaptogen_store::ResultStore;
use axum::{body::Bytes, extract::State, Extension, Json};
use serde_json::Value;

use crate::middleware::RequestId;
use crate::orchestrator::{ScheduleOutcome, ScheduleRequest};

use super::{ApiError, AppState};

pub(super) async fn schedule_and_run<S: ResultStore>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ScheduleOutcome>, ApiError> {
    let request = parse_request(&body)?;
    let outcome = state
        .orchestrator
        .handle_request(request)
        .await
        .map_err(|e| ApiError::from_orchestrator(&req_id.0, e))?;

    tracing::info!(
        request_id = %req_id.0,
        fingerprint = %outcome.key,
        source = ?outcome.source,
        exit_code = outcome.result.exit_code,
        "api: schedule request served"
    );
    Ok(Json(outcome))
}

/// Decode and validate a request body.
///
/// A body that is not JSON is treated like an empty object, so the caller
/// sees the usual missing-field error rather than a parser message.
fn parse_request(body: &[u8]) -> Result<ScheduleRequest, ApiError> {
    let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let command = required_string(&payload, "command")?;
    let cron = required_string(&payload, "cron")?;
    let keys = normalize_keys(payload.get("keys"));

    Ok(ScheduleRequest {
        cron,
        command,
        keys,
    })
}

fn required_string(payload: &Value, field: &str) -> Result<String, ApiError> {
    match payload.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ApiError::bad_request(format!(
            "`{field}` is required and must be a string."
        ))),
    }
}
