use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tracing::{info, warn};

use super::types::LoggedCalculation;
use crate::calculator::{CalculationRecord, Mode};
use crate::error::LuminaError;

/// SQLite log of finalized calculations.
/// All operations are synchronous (rusqlite is blocking).
/// Callers in async contexts should use `tokio::task::spawn_blocking`.
pub struct CalculationLog {
    conn: Connection,
}

impl CalculationLog {
    /// Create or open the log database, creating parent directories as needed.
    pub fn new(db_path: &Path) -> Result<Self, LuminaError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LuminaError::History(format!("Failed to create data dir: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| LuminaError::History(format!("Failed to open calculation log: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS calculations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                expression TEXT NOT NULL,
                result TEXT NOT NULL,
                mode TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| LuminaError::History(format!("Failed to create table: {}", e)))?;

        info!("Opened calculation log at {:?}", db_path);
        Ok(Self { conn })
    }

    /// Append a finalized calculation. Returns the row ID.
    pub fn record(&self, record: &CalculationRecord) -> Result<i64, LuminaError> {
        self.conn
            .execute(
                "INSERT INTO calculations (expression, result, mode, created_at)
             VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.expression,
                    record.result,
                    record.mode.as_str(),
                    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
                ],
            )
            .map_err(|e| LuminaError::History(format!("Failed to insert calculation: {}", e)))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent calculations, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LoggedCalculation>, LuminaError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, expression, result, mode, created_at
             FROM calculations
             ORDER BY id DESC
             LIMIT ?1",
            )
            .map_err(|e| LuminaError::History(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let mode: String = row.get(3)?;
                Ok(LoggedCalculation {
                    id: row.get(0)?,
                    expression: row.get(1)?,
                    result: row.get(2)?,
                    mode: mode.parse().unwrap_or_else(|e| {
                        warn!("Unknown mode in calculation log: {}", e);
                        Mode::Standard
                    }),
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| LuminaError::History(format!("Failed to query calculations: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| LuminaError::History(format!("Failed to collect calculations: {}", e)))
    }

    pub fn count(&self) -> Result<u64, LuminaError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM calculations", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| LuminaError::History(format!("Failed to count calculations: {}", e)))
    }

    /// Delete every logged calculation. Returns the number of rows removed.
    pub fn clear(&self) -> Result<usize, LuminaError> {
        let removed = self
            .conn
            .execute("DELETE FROM calculations", [])
            .map_err(|e| LuminaError::History(format!("Failed to clear calculations: {}", e)))?;
        info!("Cleared {} logged calculations", removed);
        Ok(removed)
    }
}
