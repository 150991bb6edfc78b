pub mod ai;
pub mod calculator;
pub mod config;
mod error;
pub mod evaluator;
pub mod history;
pub mod notifier;
pub mod relay;
pub mod shell;

pub use calculator::{CalculationRecord, Calculator, Mode, SessionState};
pub use error::{ConfigError, LuminaError};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` filter. Logs go to stderr so they stay out of the display output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
