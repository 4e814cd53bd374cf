// src/core/database.rs
//! Indexed event store backed by sqlite.
//!
//! The ledger itself lives in memory; every committed event is mirrored here so the
//! CLI and external indexers can answer counting queries without replaying anything.
//! Each server start opens a new run, since ledger sequence numbers restart at zero.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{EventRecord, JobId, LedgerEvent};

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the store at `database_path` and run migrations.
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!("Database connection established: {}", database_path.display());

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory store, used by tests and throwaway dev servers.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                contract TEXT NOT NULL,
                started_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL REFERENCES runs(id),
                seq INTEGER NOT NULL,
                timestamp INTEGER NOT NULL,
                kind TEXT NOT NULL,
                job_id INTEGER,
                subject TEXT NOT NULL,
                payload TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                UNIQUE (run_id, seq)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_job ON events(run_id, job_id, kind);")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_subject ON events(run_id, subject);")
            .execute(&self.pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Event Models =====

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Run {
    pub id: String,
    pub contract: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredEvent {
    pub id: i64,
    pub run_id: String,
    pub seq: i64,
    pub timestamp: i64,
    pub kind: String,
    pub job_id: Option<i64>,
    pub subject: String,
    pub payload: String,
    pub recorded_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Decode the payload back into the ledger's record type.
    pub fn record(&self) -> Result<EventRecord> {
        let event: LedgerEvent = serde_json::from_str(&self.payload)
            .with_context(|| format!("Corrupt payload for event {}", self.id))?;
        Ok(EventRecord {
            seq: self.seq as u64,
            timestamp: self.timestamp as u64,
            event,
        })
    }
}

// ===== Event Repository =====

pub struct EventRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn start_run(&self, contract: &str) -> Result<Run> {
        let run = Run {
            id: Uuid::new_v4().to_string(),
            contract: contract.to_string(),
            started_at: Utc::now(),
        };
        sqlx::query("INSERT INTO runs (id, contract, started_at) VALUES (?, ?, ?)")
            .bind(&run.id)
            .bind(&run.contract)
            .bind(run.started_at)
            .execute(self.pool)
            .await
            .context("Failed to record run")?;

        info!("Started event run {} for contract {}", run.id, run.contract);
        Ok(run)
    }

    pub async fn latest_run(&self) -> Result<Option<Run>> {
        let run = sqlx::query_as::<_, Run>(
            "SELECT id, contract, started_at FROM runs ORDER BY rowid DESC LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(run)
    }

    /// Append records in one transaction; either all land or none do.
    pub async fn append(&self, run_id: &str, records: &[EventRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for record in records {
            let payload =
                serde_json::to_string(&record.event).context("Failed to serialize event")?;
            sqlx::query(
                r#"
                INSERT INTO events (run_id, seq, timestamp, kind, job_id, subject, payload, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(run_id)
            .bind(record.seq as i64)
            .bind(record.timestamp as i64)
            .bind(record.event.kind())
            .bind(record.event.job_id().map(|id| id as i64))
            .bind(record.event.subject().to_string())
            .bind(payload)
            .bind(now)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to append event {}", record.seq))?;
        }
        tx.commit().await?;

        debug!("Appended {} events to run {}", records.len(), run_id);
        Ok(records.len())
    }

    pub async fn latest_seq(&self, run_id: &str) -> Result<Option<u64>> {
        let seq: Option<i64> = sqlx::query_scalar("SELECT MAX(seq) FROM events WHERE run_id = ?")
            .bind(run_id)
            .fetch_one(self.pool)
            .await?;
        Ok(seq.map(|s| s as u64))
    }

    pub async fn list(&self, run_id: &str, limit: i64) -> Result<Vec<StoredEvent>> {
        let events = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT id, run_id, seq, timestamp, kind, job_id, subject, payload, recorded_at
            FROM events
            WHERE run_id = ?
            ORDER BY seq ASC
            LIMIT ?
            "#,
        )
        .bind(run_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(events)
    }

    pub async fn events_for_job(&self, run_id: &str, job_id: JobId) -> Result<Vec<StoredEvent>> {
        let events = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT id, run_id, seq, timestamp, kind, job_id, subject, payload, recorded_at
            FROM events
            WHERE run_id = ? AND job_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(run_id)
        .bind(job_id as i64)
        .fetch_all(self.pool)
        .await?;
        Ok(events)
    }

    pub async fn applicant_count(&self, run_id: &str, job_id: JobId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT subject) FROM events
            WHERE run_id = ? AND job_id = ? AND kind = 'ApplicationSubmitted'
            "#,
        )
        .bind(run_id)
        .bind(job_id as i64)
        .fetch_one(self.pool)
        .await?;
        Ok(count as u64)
    }

    pub async fn evaluation_started(&self, run_id: &str, job_id: JobId) -> Result<bool> {
        let started: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM events
                WHERE run_id = ? AND job_id = ? AND kind = 'ApplicantEvaluated'
            )
            "#,
        )
        .bind(run_id)
        .bind(job_id as i64)
        .fetch_one(self.pool)
        .await?;
        Ok(started)
    }
}
