use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use socialforge_common::{JobState, Platform};
use socialforge_orchestrator::{OrchestratorError, SubmitRequest};

use crate::auth::{verify_signature, SIGNATURE_HEADER};
use crate::AppState;

#[derive(Deserialize)]
pub struct WebhookBody {
    title: String,
    external_key: Option<String>,
    /// Platform names; omitted means all three.
    platforms: Option<Vec<String>>,
    callback_url: Option<String>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

fn orchestrator_error(e: OrchestratorError) -> Response {
    match e {
        OrchestratorError::Validation(msg) => bad_request(&msg),
        OrchestratorError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("no job found: {id}")})),
        )
            .into_response(),
        OrchestratorError::NothingToRetry(id) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": format!("no failed platforms to retry for job {id}")})),
        )
            .into_response(),
        OrchestratorError::Store(e) => {
            warn!(error = %e, "Store error while handling request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}

/// POST /webhook/create-profiles
///
/// The body is taken raw so the HMAC check covers the exact bytes the CMS
/// signed. 202 for a newly accepted job, 200 when the key already has one.
pub async fn create_profiles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.webhook_secret {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, header) {
            warn!("Webhook rejected: bad or missing signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "invalid signature"})),
            )
                .into_response();
        }
    }

    let parsed: WebhookBody = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return bad_request(&format!("invalid JSON body: {e}")),
    };

    let platforms = match parsed.platforms {
        None => None,
        Some(names) => {
            let mut out = Vec::with_capacity(names.len());
            for name in &names {
                match name.parse::<Platform>() {
                    Ok(p) => out.push(p),
                    Err(e) => return bad_request(&e),
                }
            }
            Some(out)
        }
    };

    let result = state
        .orchestrator
        .submit(SubmitRequest {
            title: parsed.title,
            external_key: parsed.external_key,
            platforms,
            callback_url: parsed.callback_url,
        })
        .await;

    match result {
        Ok(submission) => {
            let status = if submission.created {
                StatusCode::ACCEPTED
            } else {
                StatusCode::OK
            };
            (status, Json(submission.job.summary())).into_response()
        }
        Err(e) => orchestrator_error(e),
    }
}

/// GET /status/{job_id}
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Ok(job_id) = Uuid::parse_str(&job_id) else {
        return bad_request("job id must be a UUID");
    };
    match state.orchestrator.store().get(job_id).await {
        Ok(job) => Json(job.summary()).into_response(),
        Err(socialforge_store::StoreError::NotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("no job found: {id}")})),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Status lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    status: Option<String>,
    limit: Option<i64>,
}

/// GET /jobs?status=partial&limit=50
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => match s.parse::<JobState>() {
            Ok(s) => Some(s),
            Err(e) => return bad_request(&e),
        },
    };
    let limit = params.limit.unwrap_or(100).clamp(1, 500);

    match state.orchestrator.store().list(status, limit).await {
        Ok(jobs) => {
            let summaries: Vec<_> = jobs.iter().map(|j| j.summary()).collect();
            Json(serde_json::json!({"jobs": summaries})).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Job list failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}

/// POST /jobs/{job_id}/retry
pub async fn retry_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Ok(job_id) = Uuid::parse_str(&job_id) else {
        return bad_request("job id must be a UUID");
    };
    match state.orchestrator.retry(job_id).await {
        Ok(job) => (StatusCode::ACCEPTED, Json(job.summary())).into_response(),
        Err(OrchestratorError::Validation(msg)) => {
            (StatusCode::CONFLICT, Json(serde_json::json!({"error": msg}))).into_response()
        }
        Err(e) => orchestrator_error(e),
    }
}

/// GET /health
pub async fn health() -> Response {
    Json(serde_json::json!({"status": "ok"})).into_response()
}
