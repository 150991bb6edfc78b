//! Keyboard support: maps physical keys to keypad tokens.

use super::types::{Operator, Token};

/// A key event from a keyboard-driven front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Escape,
}

/// Map a key to a token. Keys with no keypad equivalent return `None`.
pub fn token_for_key(key: Key) -> Option<Token> {
    match key {
        Key::Enter => Some(Token::Equals),
        Key::Backspace => Some(Token::Delete),
        Key::Escape => Some(Token::Clear),
        Key::Char(c) => match c {
            '0'..='9' => Token::digit(c as u8 - b'0'),
            '.' => Some(Token::Point),
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            '+' => Some(Token::Operator(Operator::Add)),
            '-' => Some(Token::Operator(Operator::Subtract)),
            '%' => Some(Token::Operator(Operator::Percent)),
            '*' | '×' => Some(Token::Operator(Operator::Multiply)),
            '/' | '÷' => Some(Token::Operator(Operator::Divide)),
            '=' => Some(Token::Equals),
            _ => None,
        },
    }
}

/// Tokens for every mapped character in a line of typed text.
pub fn tokens_for_text(text: &str) -> Vec<Token> {
    text.chars()
        .filter_map(|c| token_for_key(Key::Char(c)))
        .collect()
}
