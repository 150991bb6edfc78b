use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Notifier;
use crate::calculator::CalculationRecord;
use crate::history::SharedLog;

/// Failures kept for diagnostics; older ones are dropped.
const MAX_FAILURES: usize = 50;

/// A notification that could not be delivered.
#[derive(Debug, Clone, Serialize)]
pub struct NotifyFailure {
    pub record: CalculationRecord,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Bounded log of delivery failures, independent of session state.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    inner: Arc<Mutex<VecDeque<NotifyFailure>>>,
}

impl FailureLog {
    pub fn push(&self, failure: NotifyFailure) {
        let mut failures = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if failures.len() == MAX_FAILURES {
            failures.pop_front();
        }
        failures.push_back(failure);
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<NotifyFailure> {
        let failures = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        failures.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fire-and-forget channel for finalized calculations.
///
/// `submit` never blocks and never fails toward the caller. A detached worker
/// appends each record to the calculation log (when configured) and then
/// hands it to the notifier, recording failures in its own [`FailureLog`].
/// The worker stops once every queue handle is dropped.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<CalculationRecord>,
    failures: FailureLog,
}

impl NotificationQueue {
    pub fn spawn<N: Notifier>(notifier: N, log: Option<SharedLog>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let failures = FailureLog::default();
        let worker = tokio::spawn(run_worker(rx, notifier, log, failures.clone()));
        (Self { tx, failures }, worker)
    }

    pub fn submit(&self, record: CalculationRecord) {
        debug!("Queueing notification for '{}'", record.expression);
        if let Err(e) = self.tx.send(record) {
            warn!(
                "Notification worker stopped; dropping result for '{}'",
                e.0.expression
            );
        }
    }

    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }
}

async fn run_worker<N: Notifier>(
    mut rx: mpsc::UnboundedReceiver<CalculationRecord>,
    notifier: N,
    log: Option<SharedLog>,
    failures: FailureLog,
) {
    info!("Notification worker started");

    while let Some(record) = rx.recv().await {
        if let Some(log) = &log {
            persist(log, &record).await;
        }

        if let Err(error) = notifier.notify(&record).await {
            warn!(
                "Failed to send notification for '{}': {}",
                record.expression, error
            );
            failures.push(NotifyFailure {
                record,
                error,
                at: Utc::now(),
            });
        }
    }

    info!("Notification worker stopped");
}

async fn persist(log: &SharedLog, record: &CalculationRecord) {
    let log = Arc::clone(log);
    let record = record.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let log = log.lock().unwrap_or_else(|e| e.into_inner());
        log.record(&record)
    })
    .await;

    match outcome {
        Ok(Ok(id)) => debug!("Logged calculation {}", id),
        Ok(Err(e)) => warn!("Failed to log calculation: {}", e),
        Err(e) => warn!("Calculation log task panicked: {}", e),
    }
}
