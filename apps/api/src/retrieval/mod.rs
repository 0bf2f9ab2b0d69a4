//! Context Retriever: reference text (job requirements, case-study brief,
//! scoring rubrics) that grounds each model call.
//!
//! The retriever is always present. Its strategy is fixed at construction:
//! either index-backed with a per-call fallback to the built-in texts, or
//! built-in texts only. No operation ever fails the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub mod fallback;
pub mod qdrant;

const SEARCH_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    JobRequirements,
    CaseStudy,
    CvRubric,
    ProjectRubric,
}

impl ContextKind {
    /// Payload tag stored alongside each indexed document.
    pub fn doc_type(&self) -> &'static str {
        match self {
            ContextKind::JobRequirements => "job_description",
            ContextKind::CaseStudy => "case_study",
            ContextKind::CvRubric => "cv_rubric",
            ContextKind::ProjectRubric => "project_rubric",
        }
    }
}

/// A nearest-neighbor index over reference documents.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Returns the text of the closest documents of `kind`, best first.
    async fn search(
        &self,
        query: &str,
        kind: ContextKind,
        limit: usize,
    ) -> anyhow::Result<Vec<String>>;
}

#[derive(Clone)]
enum ContextSource {
    Indexed(Arc<dyn SimilarityIndex>),
    Fixed,
}

#[derive(Clone)]
pub struct ContextRetriever {
    source: ContextSource,
}

impl ContextRetriever {
    pub fn indexed(index: Arc<dyn SimilarityIndex>) -> Self {
        Self {
            source: ContextSource::Indexed(index),
        }
    }

    pub fn fixed() -> Self {
        Self {
            source: ContextSource::Fixed,
        }
    }

    /// "vector_index" or "fallback", for health reporting.
    pub fn source_name(&self) -> &'static str {
        match self.source {
            ContextSource::Indexed(_) => "vector_index",
            ContextSource::Fixed => "fallback",
        }
    }

    pub async fn job_requirements(&self, job_title: &str) -> String {
        let query = format!("{job_title} position requirements and skills");
        self.lookup(&query, ContextKind::JobRequirements).await
    }

    pub async fn case_study(&self) -> String {
        self.lookup("case study evaluation criteria", ContextKind::CaseStudy)
            .await
    }

    pub async fn cv_rubric(&self) -> String {
        self.lookup("CV scoring rubric", ContextKind::CvRubric).await
    }

    pub async fn project_rubric(&self) -> String {
        self.lookup("project scoring rubric", ContextKind::ProjectRubric)
            .await
    }

    /// Job requirements for `job_title` followed by the CV scoring rubric.
    pub async fn cv_context(&self, job_title: &str) -> String {
        let requirements = self.job_requirements(job_title).await;
        let rubric = self.cv_rubric().await;
        format!("{requirements}\n\n{rubric}")
    }

    /// Case-study brief followed by the project scoring rubric.
    pub async fn project_context(&self) -> String {
        let brief = self.case_study().await;
        let rubric = self.project_rubric().await;
        format!("{brief}\n\n{rubric}")
    }

    async fn lookup(&self, query: &str, kind: ContextKind) -> String {
        let index = match &self.source {
            ContextSource::Indexed(index) => index,
            ContextSource::Fixed => {
                debug!("No context index configured, using fallback for {kind:?}");
                return fallback::text_for(kind).to_string();
            }
        };

        match index.search(query, kind, SEARCH_LIMIT).await {
            Ok(hits) => {
                let hits: Vec<String> = hits
                    .into_iter()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect();
                if hits.is_empty() {
                    warn!("Context index returned nothing for {kind:?}, using fallback");
                    return fallback::text_for(kind).to_string();
                }
                debug!("Retrieved {} {kind:?} passages from context index", hits.len());
                hits.join("\n\n")
            }
            Err(e) => {
                warn!("Context index search failed for {kind:?}, using fallback: {e:#}");
                fallback::text_for(kind).to_string()
            }
        }
    }
}
