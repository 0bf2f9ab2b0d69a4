use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an evaluation job: `queued → processing → {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Transitions only move forward. A queued job may also fail directly
    /// when it could not be handed to the queue.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    /// Every status `next` may be reached from, as stored column values.
    pub fn predecessors_of(next: JobStatus) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|status| status.can_transition_to(next))
            .map(JobStatus::as_str)
            .collect()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

/// Final report attached to a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 0.0 – 1.0
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    /// 1.0 – 5.0
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
}

/// An evaluation job as seen by producers, the worker and the result endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationJob {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub report_id: Uuid,
    pub job_title: String,
    pub status: JobStatus,
    pub result: Option<EvaluationResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationJob {
    /// A fresh job in the `queued` state.
    pub fn new(cv_id: Uuid, report_id: Uuid, job_title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            cv_id,
            report_id,
            job_title,
            status: JobStatus::Queued,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw `evaluation_jobs` row.
#[derive(Debug, Clone, FromRow)]
pub struct EvaluationJobRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub report_id: Uuid,
    pub job_title: String,
    pub status: String,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EvaluationJobRow> for EvaluationJob {
    type Error = String;

    fn try_from(row: EvaluationJobRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<JobStatus>()?;
        let result = row
            .result
            .map(serde_json::from_value::<EvaluationResult>)
            .transpose()
            .map_err(|e| format!("malformed result payload for job {}: {e}", row.id))?;

        Ok(EvaluationJob {
            id: row.id,
            cv_id: row.cv_id,
            report_id: row.report_id,
            job_title: row.job_title,
            status,
            result,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("paused".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_transitions_are_one_directional() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Queued));
    }

    #[test]
    fn test_predecessors_follow_transition_rule() {
        assert!(JobStatus::predecessors_of(JobStatus::Queued).is_empty());
        assert_eq!(JobStatus::predecessors_of(JobStatus::Processing), vec!["queued"]);
        assert_eq!(JobStatus::predecessors_of(JobStatus::Completed), vec!["processing"]);
        assert_eq!(
            JobStatus::predecessors_of(JobStatus::Failed),
            vec!["queued", "processing"]
        );
    }

    #[test]
    fn test_only_completed_and_failed_are_terminal() {
        let terminal: Vec<_> = JobStatus::ALL
            .into_iter()
            .filter(JobStatus::is_terminal)
            .collect();
        assert_eq!(terminal, vec![JobStatus::Completed, JobStatus::Failed]);
        for status in terminal {
            assert!(JobStatus::predecessors_of(status)
                .iter()
                .all(|from| !from.parse::<JobStatus>().unwrap().is_terminal()));
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn test_row_with_result_converts() {
        let row = EvaluationJobRow {
            id: Uuid::new_v4(),
            cv_id: Uuid::new_v4(),
            report_id: Uuid::new_v4(),
            job_title: "Backend Engineer".to_string(),
            status: "completed".to_string(),
            result: Some(serde_json::json!({
                "cv_match_rate": 0.82,
                "cv_feedback": "Solid Go background.",
                "project_score": 4.5,
                "project_feedback": "Clean queue design.",
                "overall_summary": "Recommended for interview."
            })),
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let job = EvaluationJob::try_from(row).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        let result = job.result.unwrap();
        assert_eq!(result.cv_match_rate, 0.82);
        assert_eq!(result.project_score, 4.5);
    }

    #[test]
    fn test_row_with_unknown_status_is_rejected() {
        let row = EvaluationJobRow {
            id: Uuid::new_v4(),
            cv_id: Uuid::new_v4(),
            report_id: Uuid::new_v4(),
            job_title: "Backend Engineer".to_string(),
            status: "archived".to_string(),
            result: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(EvaluationJob::try_from(row).is_err());
    }
}
