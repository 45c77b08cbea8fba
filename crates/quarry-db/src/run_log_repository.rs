use chrono::{DateTime, Utc};
use quarry_core::error::AppError;
use quarry_core::models::{RunLogEntry, RunStatus, RunSummary};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

/// Append-only log of aggregation run summaries.
#[derive(Clone)]
pub struct RunLogRepository {
    pool: Pool<Postgres>,
}

impl RunLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, summary: &RunSummary) -> Result<Uuid, AppError> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO scrape_runs (
                total_fetched, new_records_added, duplicates_skipped, postings_dropped,
                sources_processed, sources_failed, run_at, status, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(summary.total_fetched as i32)
        .bind(summary.new_records_added as i32)
        .bind(summary.duplicates_skipped as i32)
        .bind(summary.postings_dropped as i32)
        .bind(summary.sources_processed as i32)
        .bind(summary.sources_failed as i32)
        .bind(summary.timestamp)
        .bind(summary.status.as_str())
        .bind(&summary.error_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.0)
    }

    /// Most recent runs first.
    pub async fn history(&self, limit: i64) -> Result<Vec<RunLogEntry>, AppError> {
        let rows = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, total_fetched, new_records_added, duplicates_skipped, postings_dropped,
                   sources_processed, sources_failed, run_at, status, error_message, created_at
            FROM scrape_runs
            ORDER BY run_at DESC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit.max(1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    total_fetched: i32,
    new_records_added: i32,
    duplicates_skipped: i32,
    postings_dropped: i32,
    sources_processed: i32,
    sources_failed: i32,
    run_at: DateTime<Utc>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RunRow> for RunLogEntry {
    fn from(row: RunRow) -> Self {
        RunLogEntry {
            id: row.id,
            summary: RunSummary {
                total_fetched: row.total_fetched as u32,
                new_records_added: row.new_records_added as u32,
                duplicates_skipped: row.duplicates_skipped as u32,
                postings_dropped: row.postings_dropped as u32,
                sources_processed: row.sources_processed as u32,
                sources_failed: row.sources_failed as u32,
                timestamp: row.run_at,
                status: row.status.parse().unwrap_or(RunStatus::Failed),
                error_message: row.error_message,
            },
            created_at: row.created_at,
        }
    }
}
