use tracing::{debug, info, warn};

use crate::ai::{AiAnswer, AiError};
use crate::evaluator::Evaluator;

use super::history::History;
use super::transitions::{action_for, Action};
use super::types::{
    AiRequest, CalculationRecord, DisplaySnapshot, Mode, SessionState, Token, AI_FAILURE_MESSAGE,
    ERROR_RESULT, THINKING_PLACEHOLDER,
};

/// Side effect requested by a token. The session itself never performs I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// A standard calculation finished and should be reported.
    Finalized(CalculationRecord),
    /// An AI solve must be started for this request.
    Solve(AiRequest),
}

/// Live state of one calculator instance.
#[derive(Debug, Clone)]
pub struct Session {
    input: String,
    result: String,
    explanation: String,
    mode: Mode,
    state: SessionState,
    history: History,
    last_request: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            result: String::new(),
            explanation: String::new(),
            mode: Mode::Standard,
            state: SessionState::Idle,
            history: History::new(),
            last_request: 0,
        }
    }

    /// Create a session whose history is seeded with entries ordered newest first.
    pub fn with_history(entries: Vec<String>) -> Self {
        let mut session = Self::new();
        session.history = History::from_entries(entries);
        session
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ai_loading(&self) -> bool {
        matches!(self.state, SessionState::AiPending { .. })
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            input: self.input.clone(),
            result: self.result.clone(),
            explanation: self.explanation.clone(),
            mode: self.mode,
            ai_loading: self.is_ai_loading(),
            history: self.history.to_vec(),
        }
    }

    /// Apply one token. Standard evaluation happens inline; an AI solve is
    /// returned as an effect for the caller to run.
    pub fn press<E: Evaluator + ?Sized>(&mut self, token: Token, evaluator: &E) -> Effect {
        let action = action_for(&self.state, token.class());
        debug!("Token '{}' in {:?} -> {:?}", token, self.state, action);

        match action {
            Action::ToggleMode => {
                self.mode = self.mode.toggled();
                self.reset();
                info!("Switched to {} mode", self.mode);
            }
            Action::StartFresh => {
                self.input = token.symbol().to_string();
                self.result.clear();
                self.explanation.clear();
            }
            Action::ChainFromResult => {
                self.input = format!("{}{}", self.result, token.symbol());
                self.result.clear();
                self.explanation.clear();
            }
            Action::Append => self.input.push_str(token.symbol()),
            Action::Clear => self.reset(),
            Action::Backspace => {
                self.input.pop();
            }
            Action::Submit => {
                return match self.mode {
                    Mode::Standard => self.evaluate(evaluator),
                    Mode::Ai => self.begin_solve(),
                };
            }
            Action::Reject => {
                info!("Ignoring '=' while an AI solve is in flight");
            }
        }

        self.settle();
        Effect::None
    }

    /// Replace the whole input (free-text entry in AI mode).
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.result.clear();
        if !self.is_ai_loading() {
            self.explanation.clear();
        }
        self.settle();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Apply the outcome of an AI solve. Responses for a request that is no
    /// longer pending (cleared, mode switched) are discarded.
    /// Returns the record to report when the solve succeeded.
    pub fn complete_solve(
        &mut self,
        request: &AiRequest,
        outcome: Result<AiAnswer, AiError>,
    ) -> Option<CalculationRecord> {
        match self.state {
            SessionState::AiPending { request: pending } if pending == request.id => {}
            _ => {
                info!(
                    "Discarding stale AI response for request {} (state: {:?})",
                    request.id, self.state
                );
                return None;
            }
        }

        // Leave the pending state first so `settle` can pick the result state.
        self.state = SessionState::Idle;

        let record = match outcome {
            Ok(answer) => {
                self.result = answer.answer;
                self.explanation = answer.explanation;
                let record = CalculationRecord::new(request.query.clone(), self.result.clone(), Mode::Ai);
                self.history.push(record.history_entry());
                Some(record)
            }
            Err(e) => {
                warn!("AI solve {} failed: {}", request.id, e);
                self.result = ERROR_RESULT.to_string();
                self.explanation = AI_FAILURE_MESSAGE.to_string();
                None
            }
        };

        self.settle();
        record
    }

    fn evaluate<E: Evaluator + ?Sized>(&mut self, evaluator: &E) -> Effect {
        if self.input.is_empty() {
            return Effect::None;
        }

        let expression = normalize_operators(&self.input);
        let effect = match evaluator.evaluate(&expression) {
            Ok(formatted) => {
                self.result = formatted;
                let record =
                    CalculationRecord::new(self.input.clone(), self.result.clone(), Mode::Standard);
                self.history.push(record.history_entry());
                info!("Evaluated '{}' = {}", record.expression, record.result);
                Effect::Finalized(record)
            }
            Err(e) => {
                warn!("Evaluation failed: {}", e);
                self.result = ERROR_RESULT.to_string();
                Effect::None
            }
        };

        self.settle();
        effect
    }

    fn begin_solve(&mut self) -> Effect {
        if self.input.is_empty() {
            return Effect::None;
        }

        self.last_request += 1;
        let request = AiRequest {
            id: self.last_request,
            query: self.input.clone(),
        };
        self.state = SessionState::AiPending { request: request.id };
        self.result.clear();
        self.explanation = THINKING_PLACEHOLDER.to_string();
        info!("Starting AI solve {} for '{}'", request.id, request.query);
        Effect::Solve(request)
    }

    fn reset(&mut self) {
        if let SessionState::AiPending { request } = self.state {
            info!("Abandoning in-flight AI request {}", request);
        }
        self.input.clear();
        self.result.clear();
        self.explanation.clear();
        self.state = SessionState::Idle;
    }

    /// Recompute the state tag from the fields. A pending AI solve stays
    /// pending until it completes or is reset.
    fn settle(&mut self) {
        self.state = match self.state {
            pending @ SessionState::AiPending { .. } => pending,
            _ if !self.result.is_empty() => match self.mode {
                Mode::Standard => SessionState::Result,
                Mode::Ai => SessionState::AiResult,
            },
            _ if !self.input.is_empty() => SessionState::Editing,
            _ => SessionState::Idle,
        };
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Map keypad text to evaluator syntax: `×`/`÷` become `*`/`/`, a bare
/// leading `.` gets a `0`, and adjacent groups multiply (`2(3)`, `(1)(2)`,
/// `(2)3`).
pub fn normalize_operators(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev: Option<char> = None;

    for c in input.chars() {
        let c = match c {
            '×' => '*',
            '÷' => '/',
            other => other,
        };

        let after_operand = prev.is_some_and(|p| p.is_ascii_digit() || p == ')');
        let implicit_times = (c == '(' && after_operand)
            || (prev == Some(')') && (c.is_ascii_digit() || c == '.'));
        if implicit_times {
            out.push('*');
        }
        if c == '.' && !prev.is_some_and(|p| p.is_ascii_digit()) {
            out.push('0');
        }

        out.push(c);
        prev = Some(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::history::HISTORY_CAPACITY;
    use crate::calculator::types::Operator;
    use crate::evaluator::MathEvaluator;

    fn press_all(session: &mut Session, values: &[&str]) -> Vec<Effect> {
        values
            .iter()
            .map(|v| session.press(v.parse().unwrap(), &MathEvaluator))
            .collect()
    }

    fn type_text(session: &mut Session, text: &str) {
        for c in text.chars() {
            session.press(c.to_string().parse().unwrap(), &MathEvaluator);
        }
    }

    fn answer(answer: &str, explanation: &str) -> AiAnswer {
        AiAnswer {
            answer: answer.to_string(),
            explanation: explanation.to_string(),
        }
    }

    #[test]
    fn test_new_session_is_idle_standard() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.mode(), Mode::Standard);
        assert!(session.input().is_empty());
        assert!(session.result().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_two_plus_two() {
        let mut session = Session::new();
        type_text(&mut session, "2+2");
        assert_eq!(session.state(), SessionState::Editing);

        let effect = session.press(Token::Equals, &MathEvaluator);
        assert_eq!(session.result(), "4");
        assert_eq!(session.history().front(), Some("2+2 = 4"));
        assert_eq!(session.state(), SessionState::Result);
        assert_eq!(
            effect,
            Effect::Finalized(CalculationRecord::new("2+2", "4", Mode::Standard))
        );
    }

    #[test]
    fn test_display_operators_are_normalized() {
        let mut session = Session::new();
        press_all(&mut session, &["6", "×", "7", "÷", "2", "="]);
        assert_eq!(session.result(), "21");
        assert_eq!(session.history().front(), Some("6×7÷2 = 21"));
    }

    #[test]
    fn test_malformed_expression_sets_error() {
        let mut session = Session::new();
        type_text(&mut session, "5(");
        let effect = session.press(Token::Equals, &MathEvaluator);
        assert_eq!(session.result(), ERROR_RESULT);
        assert!(session.history().is_empty());
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn test_equals_on_empty_input_is_noop() {
        let mut session = Session::new();
        let effect = session.press(Token::Equals, &MathEvaluator);
        assert_eq!(effect, Effect::None);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.result().is_empty());
    }

    #[test]
    fn test_digit_after_result_starts_fresh() {
        let mut session = Session::new();
        press_all(&mut session, &["9", "+", "1", "="]);
        assert_eq!(session.result(), "10");

        session.press(Token::Digit(7), &MathEvaluator);
        assert_eq!(session.input(), "7");
        assert!(session.result().is_empty());
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_operator_after_result_chains() {
        let mut session = Session::new();
        press_all(&mut session, &["5", "+", "5", "="]);
        assert_eq!(session.result(), "10");

        session.press(Token::Operator(Operator::Add), &MathEvaluator);
        assert_eq!(session.input(), "10+");
        assert!(session.result().is_empty());

        press_all(&mut session, &["3", "="]);
        assert_eq!(session.result(), "13");
        assert_eq!(session.history().front(), Some("10+3 = 13"));
    }

    #[test]
    fn test_delete_on_empty_is_noop() {
        let mut session = Session::new();
        let effect = session.press(Token::Delete, &MathEvaluator);
        assert_eq!(effect, Effect::None);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.input().is_empty());
    }

    #[test]
    fn test_delete_removes_last_char() {
        let mut session = Session::new();
        type_text(&mut session, "12");
        session.press(Token::Delete, &MathEvaluator);
        assert_eq!(session.input(), "1");
        session.press(Token::Delete, &MathEvaluator);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_delete_handles_multibyte_operator() {
        let mut session = Session::new();
        press_all(&mut session, &["3", "×"]);
        session.press(Token::Delete, &MathEvaluator);
        assert_eq!(session.input(), "3");
    }

    #[test]
    fn test_clear_resets_everything_but_history() {
        let mut session = Session::new();
        press_all(&mut session, &["1", "+", "1", "=", "AC"]);
        assert!(session.input().is_empty());
        assert!(session.result().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_toggle_mode_clears_fields() {
        let mut session = Session::new();
        press_all(&mut session, &["1", "+", "1", "="]);
        session.press(Token::ToggleMode, &MathEvaluator);
        assert_eq!(session.mode(), Mode::Ai);
        assert!(session.input().is_empty());
        assert!(session.result().is_empty());
        assert!(session.explanation().is_empty());

        session.press(Token::ToggleMode, &MathEvaluator);
        assert_eq!(session.mode(), Mode::Standard);
    }

    #[test]
    fn test_history_capped_at_ten() {
        let mut session = Session::new();
        for i in 0..11 {
            session.press(Token::Clear, &MathEvaluator);
            type_text(&mut session, &format!("{}+0", i));
            session.press(Token::Equals, &MathEvaluator);
        }
        assert_eq!(session.history().len(), HISTORY_CAPACITY);
        assert_eq!(session.history().front(), Some("10+0 = 10"));
        assert!(!session.history().iter().any(|e| e == "0+0 = 0"));
    }

    #[test]
    fn test_repeated_equals_reevaluates_input() {
        let mut session = Session::new();
        press_all(&mut session, &["2", "+", "2", "=", "="]);
        assert_eq!(session.result(), "4");
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_ai_submit_enters_pending() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("sqrt of 144");

        let Effect::Solve(request) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };
        assert_eq!(request.query, "sqrt of 144");
        assert!(session.is_ai_loading());
        assert_eq!(session.explanation(), THINKING_PLACEHOLDER);

        let record = session.complete_solve(&request, Ok(answer("12", "12 * 12 = 144")));
        assert_eq!(record, Some(CalculationRecord::new("sqrt of 144", "12", Mode::Ai)));
        assert_eq!(session.result(), "12");
        assert_eq!(session.explanation(), "12 * 12 = 144");
        assert_eq!(session.history().front(), Some("AI: sqrt of 144 = 12"));
        assert_eq!(session.state(), SessionState::AiResult);
        assert!(!session.is_ai_loading());
    }

    #[test]
    fn test_ai_failure_sets_error_without_history() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("integrate x");
        let Effect::Solve(request) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };

        let record = session.complete_solve(&request, Err(AiError::MissingCredential));
        assert!(record.is_none());
        assert_eq!(session.result(), ERROR_RESULT);
        assert_eq!(session.explanation(), AI_FAILURE_MESSAGE);
        assert!(session.history().is_empty());
        assert!(!session.is_ai_loading());
    }

    #[test]
    fn test_ai_submit_on_empty_input_is_noop() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        assert_eq!(session.press(Token::Equals, &MathEvaluator), Effect::None);
        assert!(!session.is_ai_loading());
    }

    #[test]
    fn test_second_submit_while_pending_is_rejected() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("1+1");
        assert!(matches!(
            session.press(Token::Equals, &MathEvaluator),
            Effect::Solve(_)
        ));
        assert_eq!(session.press(Token::Equals, &MathEvaluator), Effect::None);
        assert!(session.is_ai_loading());
    }

    #[test]
    fn test_stale_ai_response_discarded_after_clear() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("2 squared");
        let Effect::Solve(request) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };

        session.press(Token::Clear, &MathEvaluator);
        assert!(!session.is_ai_loading());

        let record = session.complete_solve(&request, Ok(answer("4", "2*2")));
        assert!(record.is_none());
        assert!(session.result().is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_stale_response_does_not_hit_newer_request() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("first");
        let Effect::Solve(first) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };
        session.press(Token::Clear, &MathEvaluator);
        session.set_input("second");
        let Effect::Solve(second) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };

        assert!(session.complete_solve(&first, Ok(answer("1", ""))).is_none());
        assert!(session.is_ai_loading());
        assert!(session.complete_solve(&second, Ok(answer("2", ""))).is_some());
        assert_eq!(session.result(), "2");
    }

    #[test]
    fn test_ai_result_then_operator_chains() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("half of 20");
        let Effect::Solve(request) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };
        session.complete_solve(&request, Ok(answer("10", "20 / 2")));

        session.press(Token::Operator(Operator::Add), &MathEvaluator);
        assert_eq!(session.input(), "10+");
        assert!(session.result().is_empty());
        assert!(session.explanation().is_empty());
    }

    #[test]
    fn test_set_input_clears_result() {
        let mut session = Session::new();
        press_all(&mut session, &["1", "="]);
        session.set_input("3+3");
        assert!(session.result().is_empty());
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_with_history_restores_entries() {
        let session = Session::with_history(vec!["2+2 = 4".to_string(), "1+1 = 2".to_string()]);
        assert_eq!(session.history().front(), Some("2+2 = 4"));
        assert_eq!(session.snapshot().history.len(), 2);
    }

    #[test]
    fn test_normalize_operators() {
        assert_eq!(normalize_operators("6×7÷2"), "6*7/2");
        assert_eq!(normalize_operators("1+2"), "1+2");
    }

    #[test]
    fn test_normalize_leading_decimal_point() {
        assert_eq!(normalize_operators(".5"), "0.5");
        assert_eq!(normalize_operators("2+.5"), "2+0.5");
        assert_eq!(normalize_operators("(.5)"), "(0.5)");
        assert_eq!(normalize_operators("1.25"), "1.25");
    }

    #[test]
    fn test_normalize_implicit_multiplication() {
        assert_eq!(normalize_operators("2(3)"), "2*(3)");
        assert_eq!(normalize_operators("(1+2)(3+4)"), "(1+2)*(3+4)");
        assert_eq!(normalize_operators("(2)3"), "(2)*3");
        assert_eq!(normalize_operators("(2).5"), "(2)*0.5");
        assert_eq!(normalize_operators("2+(3)"), "2+(3)");
    }

    #[test]
    fn test_leading_decimal_point_evaluates() {
        let mut session = Session::new();
        let effects = press_all(&mut session, &[".", "5", "="]);
        assert_eq!(session.result(), "0.5");
        assert_eq!(session.history().front(), Some(".5 = 0.5"));
        assert_eq!(
            effects.last(),
            Some(&Effect::Finalized(CalculationRecord::new(".5", "0.5", Mode::Standard)))
        );

        session.press(Token::Clear, &MathEvaluator);
        press_all(&mut session, &["2", "+", ".", "5", "="]);
        assert_eq!(session.result(), "2.5");
        assert_eq!(session.history().front(), Some("2+.5 = 2.5"));
    }

    #[test]
    fn test_adjacent_groups_multiply() {
        let cases = [
            (&["2", "(", "3", ")", "="][..], "6"),
            (&["(", "1", "+", "2", ")", "(", "3", "+", "4", ")", "="][..], "21"),
            (&["(", "2", ")", "3", "="][..], "6"),
        ];
        for (keys, expected) in cases {
            let mut session = Session::new();
            press_all(&mut session, keys);
            assert_eq!(session.result(), expected, "keys: {:?}", keys);
            assert_eq!(session.history().len(), 1);
        }
    }

    #[test]
    fn test_toggle_from_ai_result_clears_fields() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("sqrt of 144");
        let Effect::Solve(request) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };
        session.complete_solve(&request, Ok(answer("12", "12 * 12 = 144")));
        assert_eq!(session.state(), SessionState::AiResult);
        assert!(!session.explanation().is_empty());

        session.press(Token::ToggleMode, &MathEvaluator);
        assert_eq!(session.mode(), Mode::Standard);
        assert!(session.input().is_empty());
        assert!(session.result().is_empty());
        assert!(session.explanation().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_toggle_after_ai_failure_clears_fields() {
        let mut session = Session::new();
        session.press(Token::ToggleMode, &MathEvaluator);
        session.set_input("integrate x");
        let Effect::Solve(request) = session.press(Token::Equals, &MathEvaluator) else {
            panic!("expected a solve effect");
        };
        session.complete_solve(&request, Err(AiError::MissingCredential));
        assert_eq!(session.explanation(), AI_FAILURE_MESSAGE);

        session.press(Token::ToggleMode, &MathEvaluator);
        assert!(session.input().is_empty());
        assert!(session.result().is_empty());
        assert!(session.explanation().is_empty());
    }
}
