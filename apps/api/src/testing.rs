//! In-memory fakes for the storage, queue, extraction, model and index seams.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::documents::extract::{ExtractError, TextExtractor};
use crate::documents::storage::ObjectStorage;
use crate::documents::store::DocumentStore;
use crate::evaluation::model::{
    parse_cv_evaluation, parse_project_evaluation, CvEvaluation, EvaluationModel,
    ProjectEvaluation,
};
use crate::jobs::queue::{JobQueue, QueueError};
use crate::jobs::store::{JobStore, StoreError};
use crate::llm_client::LlmError;
use crate::models::document::{DocumentRow, DocumentType};
use crate::models::evaluation::{EvaluationJob, EvaluationResult, JobStatus};
use crate::retrieval::{ContextKind, SimilarityIndex};

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Job store with the same forward-only transition rules as the Postgres one.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, EvaluationJob>>,
    history: Mutex<Vec<(Uuid, JobStatus)>>,
    fail_claim: AtomicBool,
    fail_result_write: AtomicBool,
}

impl InMemoryJobStore {
    /// Makes every `mark_processing` fail as if the database were down.
    pub fn fail_claims(&self) {
        self.fail_claim.store(true, Ordering::SeqCst);
    }

    /// Makes every `mark_completed` fail as if the database were down.
    pub fn fail_result_writes(&self) {
        self.fail_result_write.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<EvaluationJob> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<EvaluationJob> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    /// Every status `id` has held, oldest first.
    pub fn transitions(&self, id: Uuid) -> Vec<JobStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(job, _)| *job == id)
            .map(|(_, status)| *status)
            .collect()
    }

    /// Job ids in the order they were claimed for processing.
    pub fn claim_order(&self) -> Vec<Uuid> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, status)| *status == JobStatus::Processing)
            .map(|(id, _)| *id)
            .collect()
    }

    fn apply(
        &self,
        id: Uuid,
        to: JobStatus,
        update: impl FnOnce(&mut EvaluationJob),
    ) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !job.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                id,
                from: job.status,
                to,
            });
        }
        job.status = to;
        job.updated_at = Utc::now();
        update(job);
        self.history.lock().unwrap().push((id, to));
        Ok(())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &EvaluationJob) -> Result<(), StoreError> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        self.history.lock().unwrap().push((job.id, job.status));
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationJob>, StoreError> {
        Ok(self.snapshot(id))
    }

    async fn mark_processing(&self, id: Uuid) -> Result<(), StoreError> {
        if self.fail_claim.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.apply(id, JobStatus::Processing, |_| {})
    }

    async fn mark_completed(&self, id: Uuid, result: &EvaluationResult) -> Result<(), StoreError> {
        if self.fail_result_write.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.apply(id, JobStatus::Completed, |job| {
            job.result = Some(result.clone());
            job.error_message = None;
        })
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<(), StoreError> {
        self.apply(id, JobStatus::Failed, |job| {
            job.result = None;
            job.error_message = Some(message.to_string());
        })
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub fn document(doc_type: DocumentType, filename: &str) -> DocumentRow {
    let id = Uuid::new_v4();
    DocumentRow {
        id,
        filename: filename.to_string(),
        file_path: ObjectStorage::key_for(id),
        doc_type: doc_type.as_str().to_string(),
        file_size: 2048,
        uploaded_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: Mutex<HashMap<Uuid, DocumentRow>>,
}

impl InMemoryDocumentStore {
    pub fn insert(&self, doc: DocumentRow) -> Uuid {
        let id = doc.id;
        self.docs.lock().unwrap().insert(id, doc);
        id
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, doc: &DocumentRow) -> Result<(), sqlx::Error> {
        self.insert(doc.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error> {
        Ok(self.docs.lock().unwrap().get(&id).cloned())
    }
}

/// Returns `"Text of <filename>"` padded with stray whitespace. A file named
/// `scanned.pdf` yields whitespace only, like an image-only PDF.
#[derive(Default)]
pub struct StubExtractor;

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract(&self, doc: &DocumentRow) -> Result<String, ExtractError> {
        if doc.filename == "scanned.pdf" {
            return Ok(" \n\t \n".to_string());
        }
        Ok(format!("\n  Text   of {}  \n\n", doc.filename))
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryQueue {
    items: Mutex<VecDeque<String>>,
    fail_enqueue: AtomicBool,
    fail_dequeue: AtomicBool,
}

impl InMemoryQueue {
    /// Entries still waiting, oldest first.
    pub fn pending(&self) -> Vec<String> {
        self.items.lock().unwrap().iter().cloned().collect()
    }

    pub fn fail_enqueues(&self) {
        self.fail_enqueue.store(true, Ordering::SeqCst);
    }

    pub fn fail_dequeues(&self) {
        self.fail_dequeue.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, job_id: &str) -> Result<(), QueueError> {
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("connection refused".to_string()));
        }
        self.items.lock().unwrap().push_back(job_id.to_string());
        Ok(())
    }

    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        if self.fail_dequeue.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("connection refused".to_string()));
        }
        let next = self.items.lock().unwrap().pop_front();
        if next.is_none() {
            tokio::time::sleep(timeout).await;
        }
        Ok(next)
    }

    async fn len(&self) -> Result<u64, QueueError> {
        if self.fail_dequeue.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("connection refused".to_string()));
        }
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ModelCall {
    Cv { text: String, context: String },
    Project { text: String, context: String },
    Summary { cv_match_rate: f64, project_score: f64 },
}

/// Answers with fixed raw replies, run through the same parsers as the real
/// client, and records every call.
pub struct ScriptedModel {
    cv_reply: String,
    project_reply: String,
    summary: String,
    delay: Option<Duration>,
    fail_next_cv: AtomicBool,
    calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn replying(cv_reply: &str, project_reply: &str, summary: &str) -> Self {
        Self {
            cv_reply: cv_reply.to_string(),
            project_reply: project_reply.to_string(),
            summary: summary.to_string(),
            delay: None,
            fail_next_cv: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_first_cv_call(self) -> Self {
        self.fail_next_cv.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ModelCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl EvaluationModel for ScriptedModel {
    async fn evaluate_cv(&self, cv_text: &str, context: &str) -> Result<CvEvaluation, LlmError> {
        self.record(ModelCall::Cv {
            text: cv_text.to_string(),
            context: context.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next_cv.swap(false, Ordering::SeqCst) {
            return Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            });
        }
        parse_cv_evaluation(&self.cv_reply)
    }

    async fn evaluate_project(
        &self,
        report_text: &str,
        context: &str,
    ) -> Result<ProjectEvaluation, LlmError> {
        self.record(ModelCall::Project {
            text: report_text.to_string(),
            context: context.to_string(),
        });
        parse_project_evaluation(&self.project_reply)
    }

    async fn summarize(
        &self,
        _cv_feedback: &str,
        _project_feedback: &str,
        cv_match_rate: f64,
        project_score: f64,
    ) -> Result<String, LlmError> {
        self.record(ModelCall::Summary {
            cv_match_rate,
            project_score,
        });
        Ok(self.summary.clone())
    }
}

// ---------------------------------------------------------------------------
// Context index
// ---------------------------------------------------------------------------

/// An index whose every search errors, like an unreachable vector store.
pub struct FailingIndex;

#[async_trait]
impl SimilarityIndex for FailingIndex {
    async fn search(
        &self,
        _query: &str,
        _kind: ContextKind,
        _limit: usize,
    ) -> anyhow::Result<Vec<String>> {
        Err(anyhow!("connection refused"))
    }
}

pub struct StaticIndex {
    hits: Vec<String>,
}

impl StaticIndex {
    pub fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    pub fn with_hits(hits: Vec<String>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl SimilarityIndex for StaticIndex {
    async fn search(
        &self,
        _query: &str,
        _kind: ContextKind,
        limit: usize,
    ) -> anyhow::Result<Vec<String>> {
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}
