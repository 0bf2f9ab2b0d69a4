// All LLM prompt constants for the evaluation pipeline.
// Templates use `{placeholder}` slots filled with `str::replace` before sending.

pub const CV_EVALUATION_SYSTEM: &str = "You are an expert technical recruiter. \
    You evaluate candidate CVs against job requirements and a scoring rubric.";

/// Replace `{context}` and `{cv_text}`.
pub const CV_EVALUATION_PROMPT_TEMPLATE: &str = r#"Analyze this candidate's CV against the job requirements and respond with specific, personalized feedback.

JOB REQUIREMENTS AND RUBRIC:
{context}

CANDIDATE CV TEXT:
{cv_text}

Respond with a JSON object with this EXACT schema:
{
  "match_rate": 0.75,
  "feedback": "3-5 sentences"
}

- "match_rate": decimal between 0.0 and 1.0
- "feedback": evaluation of THIS candidate covering how their technical skills match the
  requirements, their experience level and relevance, notable achievements, and specific
  areas to improve.

{no_placeholder_instruction}"#;

pub const PROJECT_EVALUATION_SYSTEM: &str = "You are an expert technical evaluator \
    assessing a candidate's case-study project submission against a rubric.";

/// Replace `{context}` and `{report_text}`.
pub const PROJECT_EVALUATION_PROMPT_TEMPLATE: &str = r#"Analyze this project thoroughly against the provided rubric and requirements.

CASE STUDY REQUIREMENTS AND RUBRIC:
{context}

CANDIDATE'S PROJECT REPORT:
{report_text}

Respond with a JSON object with this EXACT schema:
{
  "score": 3.5,
  "feedback": "4-6 sentences"
}

- "score": number from 1.0 to 5.0, based strictly on the rubric criteria
- "feedback": covers correctness of the implementation, code quality, error handling
  and documentation of THIS submission.

{no_placeholder_instruction}"#;

pub const SUMMARY_SYSTEM: &str =
    "You are a hiring manager providing concise, actionable recommendations.";

/// Replace `{cv_match_rate}`, `{cv_feedback}`, `{project_score}`, `{project_feedback}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"You are making a final hiring recommendation.

CV Evaluation:
- Match Rate: {cv_match_rate}
- Feedback: {cv_feedback}

Project Evaluation:
- Score: {project_score}/5.0
- Feedback: {project_feedback}

Provide a concise overall summary (3-5 sentences) that:
1. Highlights the candidate's strengths
2. Notes any gaps or concerns
3. Makes a clear hiring recommendation (e.g. "Recommended for interview", "Strong candidate", "Needs more experience")

Return ONLY the summary text, no JSON."#;
