use chrono::{DateTime, NaiveDate, Utc};
use quarry_core::error::AppError;
use quarry_core::models::{InsertOutcome, JobRecord, NewJobRecord};
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Filters for browsing stored job records.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub sector: Option<String>,
    /// Case-insensitive substring of the title, source name, or short description.
    pub query: Option<String>,
    pub limit: Option<i64>,
}

/// Job record persistence. Records are insert-only; the unique index on
/// `identity_hash` is the final word on duplicates.
#[derive(Clone)]
pub struct JobRecordRepository {
    pool: Pool<Postgres>,
}

impl JobRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists_by_hash(&self, identity_hash: &str) -> Result<bool, AppError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM job_records WHERE identity_hash = $1)")
                .bind(identity_hash)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.0)
    }

    /// Insert unless a record with the same identity hash exists.
    pub async fn insert(&self, record: &NewJobRecord) -> Result<InsertOutcome, AppError> {
        let skills: Vec<&str> = record.skills.iter().map(String::as_str).collect();

        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO job_records (
                identity_hash, title, source_id, source_name, location, salary, sector,
                description_short, description_full, requirements, skills, job_url,
                source_type, posted_date, scraped_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (identity_hash) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&record.identity_hash)
        .bind(&record.title)
        .bind(record.source_id)
        .bind(&record.source_name)
        .bind(&record.location)
        .bind(&record.salary)
        .bind(&record.sector)
        .bind(&record.description_short)
        .bind(&record.description_full)
        .bind(&record.requirements)
        .bind(Json(skills))
        .bind(&record.job_url)
        .bind(record.source_type.as_str())
        .bind(record.posted_date)
        .bind(record.scraped_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(match row {
            Some((id,)) => InsertOutcome::Inserted(id),
            None => InsertOutcome::Duplicate,
        })
    }

    /// Newest first by posting date, then scrape time.
    pub async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, AppError> {
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let rows = sqlx::query_as::<_, JobRecordRow>(
            r#"
            SELECT id, identity_hash, title, source_id, source_name, location, salary, sector,
                   description_short, description_full, requirements, skills, job_url,
                   source_type, posted_date, scraped_at, created_at
            FROM job_records
            WHERE ($1::VARCHAR IS NULL OR sector = $1)
              AND ($2::VARCHAR IS NULL
                   OR title ILIKE $2
                   OR source_name ILIKE $2
                   OR description_short ILIKE $2)
            ORDER BY posted_date DESC, scraped_at DESC
            LIMIT $3
            "#,
        )
        .bind(filter.sector.as_deref().map(str::to_lowercase))
        .bind(pattern)
        .bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(row.0)
    }
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct JobRecordRow {
    id: Uuid,
    identity_hash: String,
    title: String,
    source_id: Option<Uuid>,
    source_name: String,
    location: String,
    salary: Option<String>,
    sector: String,
    description_short: String,
    description_full: String,
    requirements: String,
    skills: Json<Vec<String>>,
    job_url: String,
    source_type: String,
    posted_date: NaiveDate,
    scraped_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<JobRecordRow> for JobRecord {
    fn from(row: JobRecordRow) -> Self {
        JobRecord {
            id: row.id,
            identity_hash: row.identity_hash,
            title: row.title,
            source_id: row.source_id,
            source_name: row.source_name,
            location: row.location,
            salary: row.salary,
            sector: row.sector,
            description_short: row.description_short,
            description_full: row.description_full,
            requirements: row.requirements,
            skills: row.skills.0,
            job_url: row.job_url,
            source_type: row.source_type,
            posted_date: row.posted_date,
            scraped_at: row.scraped_at,
            created_at: row.created_at,
        }
    }
}
