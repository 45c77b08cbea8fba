use quarry_core::error::AppError;
use quarry_core::models::{InsertOutcome, NewJobRecord, RunSummary, Source};
use quarry_core::traits::JobStore;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::job_record_repository::JobRecordRepository;
use crate::run_log_repository::RunLogRepository;
use crate::source_repository::SourceRepository;

/// Owns the connection pool, runs migrations, and hands out repositories.
///
/// Also the [`JobStore`] the aggregator runs against.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    pub fn sources(&self) -> SourceRepository {
        SourceRepository::new(self.pool.clone())
    }

    pub fn job_records(&self) -> JobRecordRepository {
        JobRecordRepository::new(self.pool.clone())
    }

    pub fn run_log(&self) -> RunLogRepository {
        RunLogRepository::new(self.pool.clone())
    }
}

impl JobStore for Database {
    async fn list_active_sources(&self) -> Result<Vec<Source>, AppError> {
        self.sources().list_active().await
    }

    async fn exists_by_identity_hash(&self, identity_hash: &str) -> Result<bool, AppError> {
        self.job_records().exists_by_hash(identity_hash).await
    }

    async fn insert_job_record(&self, record: &NewJobRecord) -> Result<InsertOutcome, AppError> {
        self.job_records().insert(record).await
    }

    async fn touch_source_last_scraped(&self, source_id: Uuid) -> Result<(), AppError> {
        self.sources().touch_last_scraped(source_id).await
    }

    async fn record_run_summary(&self, summary: &RunSummary) -> Result<(), AppError> {
        let id = self.run_log().record(summary).await?;
        tracing::debug!(run_id = %id, status = %summary.status, "Run summary recorded");
        Ok(())
    }
}
