use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Text shown in `result` when an evaluation or AI solve fails.
pub const ERROR_RESULT: &str = "Error";
/// Transient explanation while an AI solve is in flight.
pub const THINKING_PLACEHOLDER: &str = "Thinking...";
/// Explanation shown after a failed AI solve.
pub const AI_FAILURE_MESSAGE: &str = "Could not connect to the AI. Please try again.";

/// Calculator input mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Standard,
    Ai,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Standard => Self::Ai,
            Self::Ai => Self::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Ai => "AI",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(Self::Standard),
            "AI" => Ok(Self::Ai),
            other => Err(format!("Unknown mode: '{}'", other)),
        }
    }
}

/// Display operators accepted on the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Percent,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "×",
            Self::Divide => "÷",
            Self::Percent => "%",
        }
    }
}

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// A single discrete keypad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Digit(u8),
    Point,
    Operator(Operator),
    OpenParen,
    CloseParen,
    /// `AC`
    Clear,
    /// `DEL`
    Delete,
    /// `=`
    Equals,
    /// `AI`
    ToggleMode,
}

/// Coarse grouping of tokens used to key the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Digits, the decimal point and parentheses.
    Operand,
    Operator,
    Clear,
    Delete,
    Equals,
    ToggleMode,
}

impl Token {
    pub fn digit(value: u8) -> Option<Self> {
        (value < 10).then_some(Self::Digit(value))
    }

    pub fn class(self) -> TokenClass {
        match self {
            Self::Digit(_) | Self::Point | Self::OpenParen | Self::CloseParen => {
                TokenClass::Operand
            }
            Self::Operator(_) => TokenClass::Operator,
            Self::Clear => TokenClass::Clear,
            Self::Delete => TokenClass::Delete,
            Self::Equals => TokenClass::Equals,
            Self::ToggleMode => TokenClass::ToggleMode,
        }
    }

    /// The button value as it appears on the keypad and in `input`.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Digit(d) => DIGITS[usize::from(d.min(9))],
            Self::Point => ".",
            Self::Operator(op) => op.symbol(),
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::Clear => "AC",
            Self::Delete => "DEL",
            Self::Equals => "=",
            Self::ToggleMode => "AI",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = match s {
            "." => Self::Point,
            "+" => Self::Operator(Operator::Add),
            "-" => Self::Operator(Operator::Subtract),
            "×" => Self::Operator(Operator::Multiply),
            "÷" => Self::Operator(Operator::Divide),
            "%" => Self::Operator(Operator::Percent),
            "(" => Self::OpenParen,
            ")" => Self::CloseParen,
            "AC" => Self::Clear,
            "DEL" => Self::Delete,
            "=" => Self::Equals,
            "AI" => Self::ToggleMode,
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Self::Digit(c as u8 - b'0'),
                    _ => return Err(format!("Unknown calculator token: '{}'", s)),
                }
            }
        };
        Ok(token)
    }
}

/// Explicit session state. `Result` and `AiResult` both mean a result is
/// showing; `AiPending` carries the id of the only in-flight AI request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Editing,
    Result,
    AiPending { request: u64 },
    AiResult,
}

/// A finalized calculation, handed to the notifier and the calculation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub expression: String,
    pub result: String,
    pub mode: Mode,
}

impl CalculationRecord {
    pub fn new(expression: impl Into<String>, result: impl Into<String>, mode: Mode) -> Self {
        Self {
            expression: expression.into(),
            result: result.into(),
            mode,
        }
    }

    /// The string shown in the history drawer.
    pub fn history_entry(&self) -> String {
        match self.mode {
            Mode::Standard => format!("{} = {}", self.expression, self.result),
            Mode::Ai => format!("AI: {} = {}", self.expression, self.result),
        }
    }
}

/// An AI solve handed off to the solver task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    pub id: u64,
    pub query: String,
}

/// Read-only view of the session for front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySnapshot {
    pub input: String,
    pub result: String,
    pub explanation: String,
    pub mode: Mode,
    pub ai_loading: bool,
    pub history: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trips_keypad_values() {
        for value in ["7", ".", "+", "-", "×", "÷", "%", "(", ")", "AC", "DEL", "=", "AI"] {
            let token: Token = value.parse().unwrap();
            assert_eq!(token.symbol(), value);
        }
    }

    #[test]
    fn test_token_rejects_unknown_values() {
        assert!("*".parse::<Token>().is_err());
        assert!("12".parse::<Token>().is_err());
        assert!("".parse::<Token>().is_err());
    }

    #[test]
    fn test_token_classes() {
        assert_eq!(Token::Digit(3).class(), TokenClass::Operand);
        assert_eq!(Token::CloseParen.class(), TokenClass::Operand);
        assert_eq!(Token::Operator(Operator::Percent).class(), TokenClass::Operator);
        assert_eq!(Token::Equals.class(), TokenClass::Equals);
        assert!(Token::digit(10).is_none());
    }

    #[test]
    fn test_mode_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Mode::Ai).unwrap(), "\"AI\"");
        assert_eq!(serde_json::to_string(&Mode::Standard).unwrap(), "\"STANDARD\"");
        assert_eq!("AI".parse::<Mode>().unwrap(), Mode::Ai);
    }

    #[test]
    fn test_history_entry_format() {
        let standard = CalculationRecord::new("2+2", "4", Mode::Standard);
        assert_eq!(standard.history_entry(), "2+2 = 4");

        let ai = CalculationRecord::new("sqrt of 144", "12", Mode::Ai);
        assert_eq!(ai.history_entry(), "AI: sqrt of 144 = 12");
    }

    #[test]
    fn test_record_wire_format() {
        let record = CalculationRecord::new("1+1", "2", Mode::Standard);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"expression": "1+1", "result": "2", "mode": "STANDARD"})
        );
    }
}
