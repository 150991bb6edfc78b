use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use lumina_calc::ai::SolverBackend;
use lumina_calc::calculator::history::HISTORY_CAPACITY;
use lumina_calc::calculator::session::Session;
use lumina_calc::config::ClientConfig;
use lumina_calc::evaluator::MathEvaluator;
use lumina_calc::history::{CalculationLog, SharedLog};
use lumina_calc::notifier::{HttpNotifier, NotificationQueue};
use lumina_calc::shell::Shell;
use lumina_calc::Calculator;

/// How long to wait for queued notifications on exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lumina_calc::init_tracing();

    let config = ClientConfig::load().context("Failed to load configuration")?;

    let log: Option<SharedLog> = config.history_db.as_ref().and_then(|path| {
        match CalculationLog::new(path) {
            Ok(log) => Some(Arc::new(Mutex::new(log))),
            Err(e) => {
                warn!("Calculation log disabled: {}", e);
                None
            }
        }
    });

    let restored = match &log {
        Some(log) => {
            let log = log.lock().unwrap_or_else(|e| e.into_inner());
            match log.recent(HISTORY_CAPACITY) {
                Ok(rows) => rows.iter().map(|row| row.history_entry()).collect(),
                Err(e) => {
                    warn!("Failed to restore history: {}", e);
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };
    info!("Restored {} history entries", restored.len());

    let notifier = HttpNotifier::new(&config.relay_url).map_err(anyhow::Error::msg)?;
    info!("Notifications go to {}", notifier.endpoint());
    let (queue, worker) = NotificationQueue::spawn(notifier, log.clone());

    let calculator = Calculator::with_session(
        Session::with_history(restored),
        MathEvaluator,
        SolverBackend::from_config(config.gemini.as_ref()),
        queue,
    );

    Shell::new(calculator, log).run().await?;

    if tokio::time::timeout(DRAIN_TIMEOUT, worker).await.is_err() {
        warn!("Gave up waiting for pending notifications");
    }
    Ok(())
}
