//! Evaluation Worker: the single consumer of the evaluation queue.
//!
//! Flow per job: claim (status → processing) → load job + documents →
//! CV text → CV context → CV evaluation → report text → case-study context →
//! project evaluation → summary → persist result (status → completed).
//!
//! Every step runs sequentially on the worker task. Any failure marks the job
//! `failed` with that step's message and the loop moves on; nothing escapes
//! the loop. Shutdown is observed between dequeues only, so an in-flight job
//! always runs to completion or to the per-job timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::documents::extract::{normalize_text, ExtractError, TextExtractor};
use crate::documents::store::DocumentStore;
use crate::evaluation::model::EvaluationModel;
use crate::jobs::queue::{JobQueue, QueueError};
use crate::jobs::store::{JobStore, StoreError};
use crate::llm_client::LlmError;
use crate::models::document::DocumentRow;
use crate::models::evaluation::EvaluationResult;
use crate::retrieval::ContextRetriever;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to update status: {0}")]
    Claim(StoreError),

    #[error("failed to get job: {0}")]
    LoadJob(StoreError),

    #[error("job {0} disappeared from the store")]
    JobMissing(Uuid),

    #[error("failed to get CV document: {0}")]
    CvDocument(String),

    #[error("failed to get report document: {0}")]
    ReportDocument(String),

    #[error("failed to extract CV text: {0}")]
    CvText(ExtractError),

    #[error("failed to extract report text: {0}")]
    ReportText(ExtractError),

    #[error("failed to evaluate CV: {0}")]
    CvEvaluation(LlmError),

    #[error("failed to evaluate project: {0}")]
    ProjectEvaluation(LlmError),

    #[error("failed to generate summary: {0}")]
    Summary(LlmError),

    #[error("failed to save results: {0}")]
    SaveResult(StoreError),

    #[error("evaluation timed out after {0} seconds")]
    Timeout(u64),
}

/// What happened to one claimed queue entry.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
    /// The entry could not be claimed (malformed id, unknown job, or a job
    /// that is no longer `queued`) and was dropped untouched.
    Skipped,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// How long one dequeue blocks before the shutdown signal is re-checked.
    pub poll_timeout: Duration,
    /// Upper bound on a single job from claim to final write.
    pub job_timeout: Duration,
}

/// Collaborators the worker is built from.
pub struct WorkerDeps {
    pub jobs: Arc<dyn JobStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub queue: Arc<dyn JobQueue>,
    pub extractor: Arc<dyn TextExtractor>,
    pub model: Arc<dyn EvaluationModel>,
    pub retriever: ContextRetriever,
}

pub struct EvaluationWorker {
    deps: WorkerDeps,
    settings: WorkerSettings,
    running: Arc<AtomicBool>,
}

impl EvaluationWorker {
    pub fn new(deps: WorkerDeps, settings: WorkerSettings) -> Self {
        Self {
            deps,
            settings,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Liveness flag, true while `run` is looping.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Consumes the queue until `shutdown` becomes true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        self.running.store(true, Ordering::Release);
        info!("Evaluation worker started, waiting for jobs...");

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.process_next().await {
                warn!("Failed to pop from queue: {e}");
                // back off so an unreachable queue doesn't spin the loop
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.poll_timeout) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }

        self.running.store(false, Ordering::Release);
        info!("Evaluation worker shutting down");
    }

    /// Waits up to one poll interval for a job and processes it.
    /// `Ok(None)` when the queue stayed empty.
    pub async fn process_next(&self) -> Result<Option<JobOutcome>, QueueError> {
        let Some(raw_id) = self
            .deps
            .queue
            .dequeue_blocking(self.settings.poll_timeout)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(self.handle_job(&raw_id).await))
    }

    /// Runs one claimed job to a terminal state.
    pub async fn handle_job(&self, raw_id: &str) -> JobOutcome {
        let Ok(job_id) = Uuid::parse_str(raw_id.trim()) else {
            warn!("Dropping malformed queue entry '{raw_id}'");
            return JobOutcome::Skipped;
        };

        info!(%job_id, "Processing job");

        match self.deps.jobs.mark_processing(job_id).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                warn!(%job_id, "Queue entry references an unknown job, dropping");
                return JobOutcome::Skipped;
            }
            Err(StoreError::InvalidTransition { from, .. }) if from.is_terminal() => {
                info!(%job_id, "Job already {from}, dropping duplicate queue entry");
                return JobOutcome::Skipped;
            }
            Err(e @ StoreError::InvalidTransition { .. }) => {
                warn!(%job_id, "Job is held by another run, dropping: {e}");
                return JobOutcome::Skipped;
            }
            Err(e) => {
                return self.fail(job_id, PipelineError::Claim(e)).await;
            }
        }

        let timeout = self.settings.job_timeout;
        let outcome = match tokio::time::timeout(timeout, self.run_pipeline(job_id)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PipelineError::Timeout(timeout.as_secs())),
        };

        match outcome {
            Ok(result) => match self.deps.jobs.mark_completed(job_id, &result).await {
                Ok(()) => {
                    info!(
                        %job_id,
                        cv_match_rate = result.cv_match_rate,
                        project_score = result.project_score,
                        "Job completed"
                    );
                    JobOutcome::Completed
                }
                Err(e) => self.fail(job_id, PipelineError::SaveResult(e)).await,
            },
            Err(e) => self.fail(job_id, e).await,
        }
    }

    async fn fail(&self, job_id: Uuid, err: PipelineError) -> JobOutcome {
        let message = err.to_string();
        error!(%job_id, "Job failed: {message}");
        if let Err(store_err) = self.deps.jobs.mark_failed(job_id, &message).await {
            // Nothing left to report through; the job stays in its last persisted state.
            error!(%job_id, "Could not record failure: {store_err}");
        }
        JobOutcome::Failed(message)
    }

    async fn run_pipeline(&self, job_id: Uuid) -> Result<EvaluationResult, PipelineError> {
        let job = self
            .deps
            .jobs
            .get(job_id)
            .await
            .map_err(PipelineError::LoadJob)?
            .ok_or(PipelineError::JobMissing(job_id))?;

        let cv_doc = self
            .load_document(job.cv_id)
            .await
            .map_err(PipelineError::CvDocument)?;
        let report_doc = self
            .load_document(job.report_id)
            .await
            .map_err(PipelineError::ReportDocument)?;

        info!(%job_id, "[1/7] Extracting text from CV");
        let cv_text = self
            .extract(&cv_doc)
            .await
            .map_err(PipelineError::CvText)?;
        info!(%job_id, "Extracted {} characters from CV", cv_text.len());

        info!(%job_id, "[2/7] Retrieving job requirements context ({})", self.deps.retriever.source_name());
        let cv_context = self.deps.retriever.cv_context(&job.job_title).await;

        info!(%job_id, "[3/7] Evaluating CV");
        let cv = self
            .deps
            .model
            .evaluate_cv(&cv_text, &cv_context)
            .await
            .map_err(PipelineError::CvEvaluation)?;
        info!(%job_id, "CV match rate: {:.2}", cv.match_rate);

        info!(%job_id, "[4/7] Extracting text from project report");
        let report_text = self
            .extract(&report_doc)
            .await
            .map_err(PipelineError::ReportText)?;
        info!(%job_id, "Extracted {} characters from report", report_text.len());

        info!(%job_id, "[5/7] Retrieving case study context ({})", self.deps.retriever.source_name());
        let project_context = self.deps.retriever.project_context().await;

        info!(%job_id, "[6/7] Evaluating project");
        let project = self
            .deps
            .model
            .evaluate_project(&report_text, &project_context)
            .await
            .map_err(PipelineError::ProjectEvaluation)?;
        info!(%job_id, "Project score: {:.1}/5.0", project.score);

        info!(%job_id, "[7/7] Generating final summary");
        let summary = self
            .deps
            .model
            .summarize(&cv.feedback, &project.feedback, cv.match_rate, project.score)
            .await
            .map_err(PipelineError::Summary)?;

        Ok(EvaluationResult {
            cv_match_rate: cv.match_rate,
            cv_feedback: cv.feedback,
            project_score: project.score,
            project_feedback: project.feedback,
            overall_summary: summary,
        })
    }

    async fn load_document(&self, id: Uuid) -> Result<DocumentRow, String> {
        match self.deps.documents.get(id).await {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Err(format!("document {id} not found")),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn extract(&self, doc: &DocumentRow) -> Result<String, ExtractError> {
        let raw = self.deps.extractor.extract(doc).await?;
        let text = normalize_text(&raw);
        if text.is_empty() {
            return Err(ExtractError::Empty(doc.file_path.clone()));
        }
        Ok(text)
    }
}
