use super::types::{SessionState, TokenClass};

/// What the session does with a token in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    ToggleMode,
    /// Replace `input` with the token, dropping the shown result.
    StartFresh,
    /// Continue from the shown result: `input := result + token`.
    ChainFromResult,
    Append,
    Clear,
    Backspace,
    /// Evaluate in standard mode, solve in AI mode.
    Submit,
    /// `=` while an AI solve is already in flight.
    Reject,
}

/// Transition table keyed by (state, token class).
pub(crate) fn action_for(state: &SessionState, class: TokenClass) -> Action {
    use SessionState::*;

    match (state, class) {
        (_, TokenClass::ToggleMode) => Action::ToggleMode,
        (_, TokenClass::Clear) => Action::Clear,
        (_, TokenClass::Delete) => Action::Backspace,
        (AiPending { .. }, TokenClass::Equals) => Action::Reject,
        (_, TokenClass::Equals) => Action::Submit,
        (Result | AiResult, TokenClass::Operand) => Action::StartFresh,
        (Result | AiResult, TokenClass::Operator) => Action::ChainFromResult,
        (Idle | Editing | AiPending { .. }, TokenClass::Operand | TokenClass::Operator) => {
            Action::Append
        }
    }
}
