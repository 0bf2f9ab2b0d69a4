// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs alongside it and pulls cross-cutting pieces from here.

/// Appended to system prompts that expect a JSON reply.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Reminds the model that the example in the prompt is a format, not an answer.
pub const NO_PLACEHOLDER_INSTRUCTION: &str = "\
    CRITICAL: Write specific feedback about THIS candidate. \
    Replace ALL example and placeholder text with your actual analysis. \
    Do not use generic or template language.";
