pub mod store;
pub mod types;

use std::sync::{Arc, Mutex};

pub use store::CalculationLog;
pub use types::LoggedCalculation;

/// Log handle shared between the notification worker and the shell.
pub type SharedLog = Arc<Mutex<CalculationLog>>;
