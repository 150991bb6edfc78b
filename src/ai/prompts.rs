//! Prompt and response schema for the AI solver.

/// Build the single user prompt sent for a natural-language math query.
pub fn build_solve_prompt(query: &str) -> String {
    format!(
        r#"You are a smart math assistant. Solve the following math problem: "{query}".
Return the result as JSON with 2 fields:
1. "answer": The short result (a number or an equation).
2. "explanation": A brief explanation of how to solve it (under 50 words)."#
    )
}

/// Response schema for Gemini structured output.
/// Both fields are required strings.
pub fn answer_json_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "answer": { "type": "STRING" },
            "explanation": { "type": "STRING" }
        },
        "required": ["answer", "explanation"]
    })
}

/// Full `generateContent` request body for a query.
pub fn build_request_body(query: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": build_solve_prompt(query) }]
            }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": answer_json_schema()
        }
    })
}
