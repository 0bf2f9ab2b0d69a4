// Fixed reference texts. Used whenever the similarity index is not
// configured, unreachable, or returns nothing, and as the seed corpus
// for the index itself.

use crate::retrieval::ContextKind;

pub const JOB_REQUIREMENTS: &str = "\
Backend Engineer Position Requirements:

Technical Skills:
- 3+ years experience with backend technologies
- Proficiency in Go, Python, Rust, or Node.js
- Strong database skills (PostgreSQL, MySQL, MongoDB)
- REST API design and implementation
- Experience with Redis or message queues
- Cloud platform experience (AWS, GCP, Azure)
- Understanding of microservices architecture

AI/LLM Skills (Preferred):
- Experience with LLM APIs
- Understanding of prompt engineering
- Knowledge of RAG systems and vector databases

Evaluation Focus:
- Technical skills match with requirements
- Years of relevant experience
- Quality of past projects
- Communication and collaboration skills";

pub const CASE_STUDY: &str = "\
Case Study Evaluation Criteria:

1. Correctness (30%): REST API implementation, async job processing, LLM integration, RAG implementation
2. Code Quality (25%): Clean, modular, well-documented code
3. Resilience (20%): Error handling, retries, graceful failures
4. Documentation (15%): Clear README, setup instructions, design explanations
5. Bonus Features (10%): Additional features beyond requirements

Scoring: 1-5 scale (1=Insufficient, 5=Exceptional)";

pub const CV_RUBRIC: &str = "\
CV Scoring Rubric:
- Technical Skills Match (40%): 1-5 based on alignment with job requirements
- Experience Level (25%): 1-5 based on years and project complexity
- Achievements (20%): 1-5 based on measurable impact
- Cultural Fit (15%): 1-5 based on communication and collaboration";

pub const PROJECT_RUBRIC: &str = "\
Project Scoring Rubric:
- Implementation Correctness (30%): 1-5 based on feature completeness
- Code Quality (25%): 1-5 based on structure and maintainability
- Resilience (20%): 1-5 based on error handling
- Documentation (15%): 1-5 based on clarity
- Bonus Features (10%): 1-5 based on extra features";

const AI_SKILLS: &str = "\
AI and LLM Skills (Preferred):
Experience with LLM APIs such as OpenAI or Anthropic.
Understanding of prompt engineering best practices.
Knowledge of RAG systems and vector databases.
Experience with embeddings and similarity search.
Familiarity with LLM chaining and workflow orchestration.";

pub fn text_for(kind: ContextKind) -> &'static str {
    match kind {
        ContextKind::JobRequirements => JOB_REQUIREMENTS,
        ContextKind::CaseStudy => CASE_STUDY,
        ContextKind::CvRubric => CV_RUBRIC,
        ContextKind::ProjectRubric => PROJECT_RUBRIC,
    }
}

/// A document in the seed corpus for the similarity index.
pub struct ReferenceDocument {
    pub kind: ContextKind,
    pub category: &'static str,
    pub text: &'static str,
}

pub fn reference_corpus() -> Vec<ReferenceDocument> {
    vec![
        ReferenceDocument {
            kind: ContextKind::JobRequirements,
            category: "requirements",
            text: JOB_REQUIREMENTS,
        },
        ReferenceDocument {
            kind: ContextKind::JobRequirements,
            category: "ai_skills",
            text: AI_SKILLS,
        },
        ReferenceDocument {
            kind: ContextKind::CaseStudy,
            category: "evaluation",
            text: CASE_STUDY,
        },
        ReferenceDocument {
            kind: ContextKind::CvRubric,
            category: "scoring",
            text: CV_RUBRIC,
        },
        ReferenceDocument {
            kind: ContextKind::ProjectRubric,
            category: "scoring",
            text: PROJECT_RUBRIC,
        },
    ]
}
