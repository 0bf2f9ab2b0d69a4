use std::sync::atomic::Ordering;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::service::{submit_evaluation, EvaluateRequest};
use crate::models::evaluation::{EvaluationResult, JobStatus};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub id: Uuid,
    pub status: JobStatus,
}

#[derive(Deserialize)]
pub struct ResultQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: Uuid,
    pub status: JobStatus,
    pub result: Option<EvaluationResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub queue_length: u64,
    pub status: &'static str,
    pub worker_running: bool,
}

/// POST /evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let job = submit_evaluation(
        state.jobs.as_ref(),
        state.documents.as_ref(),
        state.queue.as_ref(),
        request,
    )
    .await?;

    Ok(Json(EvaluateResponse {
        id: job.id,
        status: job.status,
    }))
}

/// GET /result?id=<job_id>
pub async fn handle_get_result(
    State(state): State<AppState>,
    Query(params): Query<ResultQuery>,
) -> Result<Json<ResultResponse>, AppError> {
    let raw_id = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError::Validation("Job ID is required as query parameter: ?id=<job_id>".to_string())
        })?;
    let id = Uuid::parse_str(raw_id)
        .map_err(|_| AppError::Validation(format!("'{raw_id}' is not a valid job id")))?;

    let job = state
        .jobs
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(ResultResponse {
        id: job.id,
        status: job.status,
        result: job.result,
        error_message: job.error_message,
        created_at: job.created_at,
        updated_at: job.updated_at,
    }))
}

/// GET /queue/status
pub async fn handle_queue_status(
    State(state): State<AppState>,
) -> Result<Json<QueueStatusResponse>, AppError> {
    let queue_length = state.queue.len().await?;
    let worker_running = state.worker_running.load(Ordering::Acquire);

    Ok(Json(QueueStatusResponse {
        queue_length,
        status: if worker_running { "active" } else { "stopped" },
        worker_running,
    }))
}
