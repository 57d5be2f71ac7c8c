use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::history::HistoryEntry;
use crate::types::ChangeRecord;

/// SQLite-backed persistence for the history ledger. The engine treats the
/// ledger as an opaque value; this store only loads and saves snapshots of
/// it, one row per committed entry with the records as a JSON blob.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Initialize database with schema
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("Initializing SQLite database at: {}", db_path);

        // Create database file if it doesn't exist
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_schema().await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history_entries (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                saved_at TEXT NOT NULL,
                changes TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_history_position ON history_entries(position)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the persisted ledger in commit order.
    pub async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, saved_at, changes FROM history_entries ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let saved_at: String = row.get("saved_at");
            let changes: String = row.get("changes");

            let changes: Vec<ChangeRecord> = serde_json::from_str(&changes)
                .map_err(|e| anyhow!("corrupt change records for entry {}: {}", id, e))?;
            entries.push(HistoryEntry {
                id: Uuid::parse_str(&id)?,
                saved_at: DateTime::parse_from_rfc3339(&saved_at)?.with_timezone(&Utc),
                changes,
            });
        }

        Ok(entries)
    }

    /// Replace the persisted ledger with the given snapshot.
    pub async fn save_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM history_entries")
            .execute(&mut *tx)
            .await?;

        for (position, entry) in entries.iter().enumerate() {
            sqlx::query(
                "INSERT INTO history_entries (id, position, saved_at, changes) VALUES (?, ?, ?, ?)",
            )
            .bind(entry.id.to_string())
            .bind(position as i64)
            .bind(entry.saved_at.to_rfc3339())
            .bind(serde_json::to_string(&entry.changes)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Persisted {} history entries", entries.len());
        Ok(())
    }
}
