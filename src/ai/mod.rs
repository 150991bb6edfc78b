pub mod gemini;
pub mod prompts;
pub mod types;

use std::future::Future;

use tracing::{info, warn};

use crate::config::GeminiConfig;

pub use self::gemini::GeminiSolver;
pub use self::types::{AiAnswer, AiError};

/// Natural-language math solver.
pub trait Solver: Send + Sync + 'static {
    fn solve(&self, query: &str) -> impl Future<Output = Result<AiAnswer, AiError>> + Send;
}

/// Solver chosen once at startup from the configuration.
/// `Unavailable` reports a missing credential for every solve.
pub enum SolverBackend {
    Gemini(GeminiSolver),
    Unavailable,
}

impl SolverBackend {
    pub fn from_config(config: Option<&GeminiConfig>) -> Self {
        let Some(config) = config else {
            warn!("No Gemini API key configured; AI mode will report errors");
            return Self::Unavailable;
        };

        match GeminiSolver::new(config) {
            Ok(solver) => {
                info!("AI solver ready (model: {})", solver.model());
                Self::Gemini(solver)
            }
            Err(e) => {
                warn!("Failed to initialize AI solver: {}", e);
                Self::Unavailable
            }
        }
    }
}

impl Solver for SolverBackend {
    async fn solve(&self, query: &str) -> Result<AiAnswer, AiError> {
        match self {
            Self::Gemini(solver) => solver.solve(query).await,
            Self::Unavailable => Err(AiError::MissingCredential),
        }
    }
}
