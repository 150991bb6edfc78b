use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Explanation used when the model omits one.
pub const DEFAULT_EXPLANATION: &str = "No explanation provided.";

/// Structured answer returned by the AI solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnswer {
    pub answer: String,
    pub explanation: String,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("No Gemini API key configured")]
    MissingCredential,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Empty AI response text")]
    EmptyResponse,

    #[error("Malformed AI response: {0}")]
    Malformed(String),

    #[error("AI task aborted: {0}")]
    Aborted(String),
}
