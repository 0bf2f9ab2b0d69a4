//! Evaluation Model: the three model calls the pipeline makes.
//!
//! Each call is one bounded request with its own timeout. Replies must parse
//! into a fixed schema; placeholder feedback is rejected. Numeric outputs are
//! clamped into their domains, never rejected for being out of range.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::evaluation::prompts::{
    CV_EVALUATION_PROMPT_TEMPLATE, CV_EVALUATION_SYSTEM, PROJECT_EVALUATION_PROMPT_TEMPLATE,
    PROJECT_EVALUATION_SYSTEM, SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM,
};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_PLACEHOLDER_INSTRUCTION};
use crate::llm_client::{parse_json_reply, CallOptions, LlmClient, LlmError};

pub const CV_CALL: CallOptions = CallOptions {
    timeout: Duration::from_secs(60),
    max_tokens: 1000,
    temperature: 0.3,
};

pub const PROJECT_CALL: CallOptions = CallOptions {
    timeout: Duration::from_secs(60),
    max_tokens: 1200,
    temperature: 0.3,
};

pub const SUMMARY_CALL: CallOptions = CallOptions {
    timeout: Duration::from_secs(45),
    max_tokens: 500,
    temperature: 0.4,
};

/// Substrings that mark feedback the model copied from the prompt instead of writing.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "your detailed feedback here",
    "provide your actual",
    "placeholder",
];

/// Whole-reply stubs echoed from the schema examples.
const PLACEHOLDER_STUBS: &[&str] = &["3-5 sentences", "4-6 sentences"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvEvaluation {
    pub match_rate: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEvaluation {
    pub score: f64,
    pub feedback: String,
}

#[async_trait]
pub trait EvaluationModel: Send + Sync {
    /// Returns a match rate in [0.0, 1.0] and feedback.
    async fn evaluate_cv(&self, cv_text: &str, context: &str) -> Result<CvEvaluation, LlmError>;

    /// Returns a score in [1.0, 5.0] and feedback.
    async fn evaluate_project(
        &self,
        report_text: &str,
        context: &str,
    ) -> Result<ProjectEvaluation, LlmError>;

    async fn summarize(
        &self,
        cv_feedback: &str,
        project_feedback: &str,
        cv_match_rate: f64,
        project_score: f64,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl EvaluationModel for LlmClient {
    async fn evaluate_cv(&self, cv_text: &str, context: &str) -> Result<CvEvaluation, LlmError> {
        let prompt = CV_EVALUATION_PROMPT_TEMPLATE
            .replace("{context}", context)
            .replace("{cv_text}", cv_text)
            .replace("{no_placeholder_instruction}", NO_PLACEHOLDER_INSTRUCTION);
        let system = format!("{CV_EVALUATION_SYSTEM} {JSON_ONLY_INSTRUCTION}");

        let reply = self.call_text(&prompt, &system, CV_CALL).await?;
        parse_cv_evaluation(&reply)
    }

    async fn evaluate_project(
        &self,
        report_text: &str,
        context: &str,
    ) -> Result<ProjectEvaluation, LlmError> {
        let prompt = PROJECT_EVALUATION_PROMPT_TEMPLATE
            .replace("{context}", context)
            .replace("{report_text}", report_text)
            .replace("{no_placeholder_instruction}", NO_PLACEHOLDER_INSTRUCTION);
        let system = format!("{PROJECT_EVALUATION_SYSTEM} {JSON_ONLY_INSTRUCTION}");

        let reply = self.call_text(&prompt, &system, PROJECT_CALL).await?;
        parse_project_evaluation(&reply)
    }

    async fn summarize(
        &self,
        cv_feedback: &str,
        project_feedback: &str,
        cv_match_rate: f64,
        project_score: f64,
    ) -> Result<String, LlmError> {
        let prompt = SUMMARY_PROMPT_TEMPLATE
            .replace("{cv_match_rate}", &format!("{cv_match_rate:.2}"))
            .replace("{cv_feedback}", cv_feedback)
            .replace("{project_score}", &format!("{project_score:.1}"))
            .replace("{project_feedback}", project_feedback);

        self.call_text(&prompt, SUMMARY_SYSTEM, SUMMARY_CALL).await
    }
}

pub fn parse_cv_evaluation(reply: &str) -> Result<CvEvaluation, LlmError> {
    let mut evaluation: CvEvaluation = parse_json_reply(reply)?;
    evaluation.feedback = checked_feedback(evaluation.feedback)?;
    evaluation.match_rate = clamp_match_rate(evaluation.match_rate);
    Ok(evaluation)
}

pub fn parse_project_evaluation(reply: &str) -> Result<ProjectEvaluation, LlmError> {
    let mut evaluation: ProjectEvaluation = parse_json_reply(reply)?;
    evaluation.feedback = checked_feedback(evaluation.feedback)?;
    evaluation.score = clamp_project_score(evaluation.score);
    Ok(evaluation)
}

pub fn clamp_match_rate(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub fn clamp_project_score(value: f64) -> f64 {
    value.clamp(1.0, 5.0)
}

fn checked_feedback(feedback: String) -> Result<String, LlmError> {
    let trimmed = feedback.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    if is_placeholder(trimmed) {
        return Err(LlmError::Placeholder(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

fn is_placeholder(feedback: &str) -> bool {
    let lowered = feedback.to_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m))
        || PLACEHOLDER_STUBS.iter().any(|s| lowered == *s)
}
