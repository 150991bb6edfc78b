pub mod history;
pub mod keymap;
pub mod session;
mod transitions;
pub mod types;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::ai::{AiError, Solver};
use crate::evaluator::Evaluator;
use crate::notifier::NotificationQueue;

use self::keymap::{token_for_key, Key};
use self::session::{Effect, Session};
use self::types::{AiRequest, DisplaySnapshot, Token};

pub use self::types::{CalculationRecord, Mode, SessionState};

/// Session controller: routes tokens through the session state machine and
/// runs the side effects it asks for.
///
/// Standard evaluation is synchronous. An AI solve runs on a spawned task so
/// input keeps flowing while it is in flight; finalized calculations go to the
/// notification queue and are never awaited here.
pub struct Calculator<E, S> {
    session: Arc<Mutex<Session>>,
    evaluator: Arc<E>,
    solver: Arc<S>,
    notifications: NotificationQueue,
}

impl<E, S> Clone for Calculator<E, S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            evaluator: Arc::clone(&self.evaluator),
            solver: Arc::clone(&self.solver),
            notifications: self.notifications.clone(),
        }
    }
}

impl<E, S> Calculator<E, S>
where
    E: Evaluator,
    S: Solver,
{
    pub fn new(evaluator: E, solver: S, notifications: NotificationQueue) -> Self {
        Self::with_session(Session::new(), evaluator, solver, notifications)
    }

    pub fn with_session(
        session: Session,
        evaluator: E,
        solver: S,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            evaluator: Arc::new(evaluator),
            solver: Arc::new(solver),
            notifications,
        }
    }

    /// Feed one token. Returns the handle of the AI task when the token
    /// started a solve; dropping it does not cancel the solve.
    pub fn press(&self, token: Token) -> Option<JoinHandle<()>> {
        let effect = lock(&self.session).press(token, self.evaluator.as_ref());

        match effect {
            Effect::None => None,
            Effect::Finalized(record) => {
                self.notifications.submit(record);
                None
            }
            Effect::Solve(request) => Some(self.spawn_solve(request)),
        }
    }

    /// Feed a keyboard key. Unmapped keys are ignored.
    pub fn press_key(&self, key: Key) -> Option<JoinHandle<()>> {
        token_for_key(key).and_then(|token| self.press(token))
    }

    pub fn set_input(&self, text: &str) {
        lock(&self.session).set_input(text);
    }

    pub fn clear_history(&self) {
        lock(&self.session).clear_history();
        info!("Cleared session history");
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        lock(&self.session).snapshot()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    fn spawn_solve(&self, request: AiRequest) -> JoinHandle<()> {
        let session = Arc::clone(&self.session);
        let solver = Arc::clone(&self.solver);
        let notifications = self.notifications.clone();

        tokio::spawn(async move {
            let query = request.query.clone();
            // Run the solver on its own task so a panic inside it still
            // clears the pending state below.
            let outcome = match tokio::spawn(async move { solver.solve(&query).await }).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("AI solver task for request {} aborted: {}", request.id, e);
                    Err(AiError::Aborted(e.to_string()))
                }
            };

            let record = lock(&session).complete_solve(&request, outcome);
            if let Some(record) = record {
                notifications.submit(record);
            }
        })
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
