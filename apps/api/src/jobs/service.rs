//! Producer side of the evaluation queue.

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::documents::store::DocumentStore;
use crate::documents::validation::validate_job_title;
use crate::errors::AppError;
use crate::jobs::queue::JobQueue;
use crate::jobs::store::JobStore;
use crate::models::document::DocumentType;
use crate::models::evaluation::EvaluationJob;

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub cv_id: String,
    pub report_id: String,
    pub job_title: String,
}

/// Validates the request, persists a `queued` job and pushes its id onto the queue.
///
/// If the push fails after the job row exists, the job is marked `failed`
/// before the error is returned so it never lingers in `queued`.
pub async fn submit_evaluation(
    jobs: &dyn JobStore,
    documents: &dyn DocumentStore,
    queue: &dyn JobQueue,
    request: EvaluateRequest,
) -> Result<EvaluationJob, AppError> {
    let cv_id = parse_id(&request.cv_id, "cv_id")?;
    let report_id = parse_id(&request.report_id, "report_id")?;
    validate_job_title(&request.job_title).map_err(AppError::Validation)?;

    ensure_document(documents, cv_id, DocumentType::Cv).await?;
    ensure_document(documents, report_id, DocumentType::ProjectReport).await?;

    let job = EvaluationJob::new(cv_id, report_id, request.job_title.trim().to_string());
    jobs.create(&job).await?;

    if let Err(e) = queue.enqueue(&job.id.to_string()).await {
        let message = format!("failed to queue job: {e}");
        if let Err(store_err) = jobs.mark_failed(job.id, &message).await {
            error!("Job {} could not be marked failed after queue error: {store_err}", job.id);
        }
        return Err(AppError::QueueUnavailable(e));
    }

    info!("Queued evaluation job {} for '{}'", job.id, job.job_title);
    Ok(job)
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("{field} must be a valid document id")))
}

async fn ensure_document(
    documents: &dyn DocumentStore,
    id: Uuid,
    expected: DocumentType,
) -> Result<(), AppError> {
    let doc = documents
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
    if !doc.is(expected) {
        return Err(AppError::Validation(format!(
            "Document {id} is a {}, expected {}",
            doc.doc_type,
            expected.as_str()
        )));
    }
    Ok(())
}
