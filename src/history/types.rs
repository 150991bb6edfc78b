use serde::Serialize;

use crate::calculator::{CalculationRecord, Mode};

/// A calculation row read back from the log.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedCalculation {
    pub id: i64,
    pub expression: String,
    pub result: String,
    pub mode: Mode,
    pub created_at: String,
}

impl LoggedCalculation {
    pub fn record(&self) -> CalculationRecord {
        CalculationRecord::new(self.expression.clone(), self.result.clone(), self.mode)
    }

    /// Same text the session history shows for this calculation.
    pub fn history_entry(&self) -> String {
        self.record().history_entry()
    }
}
