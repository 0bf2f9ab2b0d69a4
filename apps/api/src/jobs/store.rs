//! Job Store: the single source of truth for job status and result.
//!
//! Every transition is a conditional UPDATE guarded by the predecessor
//! statuses `JobStatus::can_transition_to` allows, so the lifecycle stays
//! one-directional even with concurrent writers.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::evaluation::{EvaluationJob, EvaluationJobRow, EvaluationResult, JobStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("corrupt job record: {0}")]
    Corrupt(String),

    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persists a new job. The job must be in the `queued` state.
    async fn create(&self, job: &EvaluationJob) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationJob>, StoreError>;

    /// `queued → processing`.
    async fn mark_processing(&self, id: Uuid) -> Result<(), StoreError>;

    /// `processing → completed`, writing the result in the same statement.
    async fn mark_completed(&self, id: Uuid, result: &EvaluationResult) -> Result<(), StoreError>;

    /// `{queued | processing} → failed`, writing the error message in the same statement.
    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<(), StoreError>;
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explains why a guarded UPDATE matched no row.
    async fn rejected(&self, id: Uuid, to: JobStatus) -> StoreError {
        let current: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT status FROM evaluation_jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(current) => classify_rejection(id, current.as_deref(), to),
            Err(e) => StoreError::Database(e),
        }
    }
}

/// Maps the status found after a failed guarded UPDATE to an error. A status
/// that should have allowed the move means the guard and the lifecycle rule
/// disagree, and is reported as corruption rather than a bad transition.
fn classify_rejection(id: Uuid, current: Option<&str>, to: JobStatus) -> StoreError {
    let Some(raw) = current else {
        return StoreError::NotFound(id);
    };
    match raw.parse::<JobStatus>() {
        Ok(from) if !from.can_transition_to(to) => StoreError::InvalidTransition { id, from, to },
        Ok(from) => StoreError::Corrupt(format!(
            "job {id} is {from}, which allows {to}, but the guarded update matched no row"
        )),
        Err(e) => StoreError::Corrupt(e),
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: &EvaluationJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO evaluation_jobs
                (id, cv_id, report_id, job_title, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(job.id)
        .bind(job.cv_id)
        .bind(job.report_id)
        .bind(&job.job_title)
        .bind(JobStatus::Queued.as_str())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationJob>, StoreError> {
        let row = sqlx::query_as::<_, EvaluationJobRow>(
            "SELECT * FROM evaluation_jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EvaluationJob::try_from)
            .transpose()
            .map_err(StoreError::Corrupt)
    }

    async fn mark_processing(&self, id: Uuid) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE evaluation_jobs
            SET status = 'processing', updated_at = now()
            WHERE id = $1 AND status = ANY($2)
            "#,
        )
        .bind(id)
        .bind(JobStatus::predecessors_of(JobStatus::Processing))
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.rejected(id, JobStatus::Processing).await);
        }
        Ok(())
    }

    async fn mark_completed(&self, id: Uuid, result: &EvaluationResult) -> Result<(), StoreError> {
        let payload = serde_json::to_value(result)?;

        let updated = sqlx::query(
            r#"
            UPDATE evaluation_jobs
            SET status = 'completed', result = $2, updated_at = now()
            WHERE id = $1 AND status = ANY($3)
            "#,
        )
        .bind(id)
        .bind(&payload)
        .bind(JobStatus::predecessors_of(JobStatus::Completed))
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.rejected(id, JobStatus::Completed).await);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE evaluation_jobs
            SET status = 'failed', error_message = $2, updated_at = now()
            WHERE id = $1 AND status = ANY($3)
            "#,
        )
        .bind(id)
        .bind(message)
        .bind(JobStatus::predecessors_of(JobStatus::Failed))
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.rejected(id, JobStatus::Failed).await);
        }
        Ok(())
    }
}
