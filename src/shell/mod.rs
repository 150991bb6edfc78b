//! Line-oriented terminal front-end.
//!
//! A plain line is typed key by key. Lines starting with `:` are commands:
//!
//! | command | effect |
//! | --- | --- |
//! | `:ai <text>` | replace the input with free text |
//! | `:enter`, `:del`, `:esc` | Enter, Backspace, Escape |
//! | `:mode` | toggle STANDARD / AI |
//! | `:history`, `:clear-history` | show or clear history |
//! | `:failures` | show undelivered notifications |
//! | `:key set <KEY>`, `:key delete` | manage the stored Gemini key |
//! | `:quit` | exit |

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ai::Solver;
use crate::calculator::keymap::Key;
use crate::calculator::types::{DisplaySnapshot, Token};
use crate::calculator::Calculator;
use crate::config::keychain;
use crate::evaluator::Evaluator;
use crate::history::SharedLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Keys(Vec<Key>),
    Text(String),
    Press(Key),
    ToggleMode,
    ShowHistory,
    ClearHistory,
    ShowFailures,
    SetKey(String),
    DeleteKey,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix(':') else {
        if line.trim().is_empty() {
            return Ok(Command::Empty);
        }
        return Ok(Command::Keys(line.chars().filter(|c| !c.is_whitespace()).map(Key::Char).collect()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command.trim(), ""),
    };

    match name {
        "ai" => Ok(Command::Text(rest.to_string())),
        "enter" => Ok(Command::Press(Key::Enter)),
        "del" => Ok(Command::Press(Key::Backspace)),
        "esc" => Ok(Command::Press(Key::Escape)),
        "mode" => Ok(Command::ToggleMode),
        "history" => Ok(Command::ShowHistory),
        "clear-history" => Ok(Command::ClearHistory),
        "failures" => Ok(Command::ShowFailures),
        "quit" | "q" => Ok(Command::Quit),
        "key" => match rest.split_once(char::is_whitespace) {
            Some(("set", key)) if !key.trim().is_empty() => {
                Ok(Command::SetKey(key.trim().to_string()))
            }
            _ if rest == "delete" => Ok(Command::DeleteKey),
            _ => Err("usage: :key set <KEY> | :key delete".to_string()),
        },
        other => Err(format!("Unknown command ':{}'", other)),
    }
}

/// Render the display panel.
pub fn render(snapshot: &DisplaySnapshot) -> String {
    let mut out = format!("[{}] {}", snapshot.mode, snapshot.input);
    if !snapshot.result.is_empty() {
        out.push_str(&format!("\n  = {}", snapshot.result));
    }
    if !snapshot.explanation.is_empty() {
        out.push_str(&format!("\n  {}", snapshot.explanation));
    }
    out
}

pub fn render_history(entries: &[String]) -> String {
    if entries.is_empty() {
        return "No history yet.".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{:>2}. {}", i + 1, entry))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Shell<E, S> {
    calculator: Calculator<E, S>,
    log: Option<SharedLog>,
}

impl<E, S> Shell<E, S>
where
    E: Evaluator + 'static,
    S: Solver,
{
    pub fn new(calculator: Calculator<E, S>, log: Option<SharedLog>) -> Self {
        Self { calculator, log }
    }

    /// Read stdin until EOF or `:quit`.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", render(&self.calculator.snapshot()));

        while let Some(line) = lines.next_line().await? {
            let command = match parse_line(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            if command == Command::Quit {
                break;
            }
            if let Some(output) = self.execute(command) {
                println!("{}", output);
            }
        }

        info!("Shell closed");
        Ok(())
    }

    /// Apply one command; returns text to print.
    pub fn execute(&self, command: Command) -> Option<String> {
        let calc = &self.calculator;
        let pending: Vec<JoinHandle<()>> = match command {
            Command::Empty | Command::Quit => return None,
            Command::Keys(keys) => keys.into_iter().filter_map(|key| calc.press_key(key)).collect(),
            Command::Text(text) => {
                calc.set_input(&text);
                Vec::new()
            }
            Command::Press(key) => calc.press_key(key).into_iter().collect(),
            Command::ToggleMode => calc.press(Token::ToggleMode).into_iter().collect(),
            Command::ShowHistory => return Some(render_history(&calc.snapshot().history)),
            Command::ClearHistory => {
                calc.clear_history();
                self.clear_log();
                return Some("History cleared.".to_string());
            }
            Command::ShowFailures => return Some(self.render_failures()),
            Command::SetKey(key) => {
                return Some(match keychain::set_api_key(keychain::GEMINI_SERVICE, &key) {
                    Ok(()) => "API key stored; restart to use it.".to_string(),
                    Err(e) => e.to_string(),
                })
            }
            Command::DeleteKey => {
                return Some(match keychain::delete_api_key(keychain::GEMINI_SERVICE) {
                    Ok(()) => "API key removed.".to_string(),
                    Err(e) => e.to_string(),
                })
            }
        };

        // Reprint once each AI solve settles.
        for handle in pending {
            let calc = calc.clone();
            tokio::spawn(async move {
                if let Err(e) = handle.await {
                    warn!("AI task failed: {}", e);
                }
                println!("{}", render(&calc.snapshot()));
            });
        }

        Some(render(&calc.snapshot()))
    }

    fn clear_log(&self) {
        let Some(log) = &self.log else {
            return;
        };
        let log = log.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = log.clear() {
            warn!("Failed to clear calculation log: {}", e);
        }
    }

    fn render_failures(&self) -> String {
        let failures = self.calculator.notifications().failures().entries();
        if failures.is_empty() {
            return "No failed notifications.".to_string();
        }
        failures
            .iter()
            .map(|f| {
                format!(
                    "{} {} -> {}",
                    f.at.format("%H:%M:%S"),
                    f.record.history_entry(),
                    f.error
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
