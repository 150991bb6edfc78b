use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use super::prompts::build_request_body;
use super::types::{AiAnswer, AiError, DEFAULT_EXPLANATION};
use super::Solver;
use crate::config::GeminiConfig;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_ERROR_BODY_CHARS: usize = 1024;

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiSolver {
    client: reqwest::Client,
    /// Full request URL; carries the API key, never log it.
    endpoint: String,
    model: String,
}

impl GeminiSolver {
    pub fn new(config: &GeminiConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        let endpoint = format!(
            "{}/models/{}:generateContent?key={}",
            config.base_url.as_str().trim_end_matches('/'),
            config.model,
            urlencoding::encode(&config.api_key)
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Solver for GeminiSolver {
    async fn solve(&self, query: &str) -> Result<AiAnswer, AiError> {
        info!("Sending AI solve request to model '{}'", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&build_request_body(query))
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_timeout() {
                    AiError::Request(format!("timeout after {}s", REQUEST_TIMEOUT_SECS))
                } else {
                    // Strip the URL: it contains the API key.
                    AiError::Request(e.without_url().to_string())
                };
                error!("{}", err);
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            let err = AiError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            };
            error!("{}", err);
            return Err(err);
        }

        let wrapper: Value = response.json().await.map_err(|e| {
            let err = AiError::Malformed(format!("response wrapper: {}", e.without_url()));
            error!("{}", err);
            err
        })?;

        let text = candidate_text(&wrapper);
        if text.trim().is_empty() {
            error!("Gemini returned no candidate text");
            return Err(AiError::EmptyResponse);
        }

        let answer = parse_answer(&text).map_err(|e| {
            error!("{} (raw: {})", e, truncate_chars(&text, 500));
            e
        })?;

        info!("AI solve returned answer '{}'", answer.answer);
        Ok(answer)
    }
}

/// Concatenate the text parts of the first candidate:
/// `candidates[0].content.parts[*].text`.
pub(crate) fn candidate_text(wrapper: &Value) -> String {
    wrapper["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Parse the model's text as `{answer, explanation}`. Falls back to the first
/// brace-delimited span when the text is not pure JSON.
pub(crate) fn parse_answer(text: &str) -> Result<AiAnswer, AiError> {
    let cleaned = strip_markdown_json(text);

    let json: Value = match serde_json::from_str(&cleaned) {
        Ok(json) => json,
        Err(direct) => {
            let span = first_object_span(&cleaned).ok_or_else(|| {
                AiError::Malformed(format!("no JSON object in response text ({})", direct))
            })?;
            warn!("AI response was not pure JSON, parsing embedded object");
            serde_json::from_str(span)
                .map_err(|e| AiError::Malformed(format!("embedded JSON: {}", e)))?
        }
    };

    answer_from_json(&json)
}

fn answer_from_json(json: &Value) -> Result<AiAnswer, AiError> {
    let answer = match &json["answer"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(AiError::Malformed("missing 'answer' field".to_string())),
    };

    let explanation = match &json["explanation"] {
        Value::String(s) => s.clone(),
        Value::Null => DEFAULT_EXPLANATION.to_string(),
        other => other.to_string(),
    };

    Ok(AiAnswer {
        answer,
        explanation,
    })
}

/// From the first `{` to the last `}`.
fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strip markdown code fences from model output if present.
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    };
    let cleaned = after_open.trim_end();
    cleaned
        .strip_suffix("```")
        .unwrap_or(cleaned)
        .trim()
        .to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}
