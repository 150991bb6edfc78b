use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON body of every relay API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiReply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

/// Fields pulled from a `/send-result` body.
///
/// Parsing is lenient: bodies that are not JSON objects behave like `{}` and
/// fields of any JSON type are accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPayload {
    pub expression: Value,
    pub result: Value,
    pub mode: Value,
}

impl ResultPayload {
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(mut fields)) => Self {
                expression: fields.remove("expression").unwrap_or(Value::Null),
                result: fields.remove("result").unwrap_or(Value::Null),
                mode: fields.remove("mode").unwrap_or(Value::Null),
            },
            _ => Self::default(),
        }
    }

    /// `null`, `false`, `0`, and `""` all count as a missing result.
    pub fn has_result(&self) -> bool {
        is_truthy(&self.result)
    }

    pub fn is_ai(&self) -> bool {
        self.mode.as_str() == Some("AI")
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a field for the mail body. Strings are used verbatim; `null`
/// renders empty.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
