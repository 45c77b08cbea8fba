use chrono::{DateTime, Utc};
use quarry_core::error::AppError;
use quarry_core::models::{NewSource, Source, SourceStatus, SourceUpdate};
use quarry_core::source::SourceType;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const SOURCE_COLUMNS: &str = "id, name, board_url, declared_type, status, website_url, logo_url, \
     description, last_scraped_at, created_at, updated_at";

/// Source registry persistence. Sources are soft-deleted through `status`.
#[derive(Clone)]
pub struct SourceRepository {
    pool: Pool<Postgres>,
}

impl SourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a source. A duplicate name or board URL is a [`AppError::Conflict`].
    pub async fn add(&self, source: &NewSource) -> Result<Source, AppError> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            INSERT INTO sources (name, board_url, declared_type, website_url, logo_url, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SOURCE_COLUMNS}
            "#
        ))
        .bind(source.name.trim())
        .bind(source.board_url.trim())
        .bind(source.declared_type.map(|t| t.as_str()))
        .bind(&source.website_url)
        .bind(&source.logo_url)
        .bind(&source.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &source.name))?;

        Ok(row.into())
    }

    /// Active sources, oldest first so run order is stable.
    pub async fn list_active(&self) -> Result<Vec<Source>, AppError> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            SELECT {SOURCE_COLUMNS}
            FROM sources
            WHERE status = 'active'
            ORDER BY created_at ASC, name ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Source>, AppError> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources ORDER BY created_at ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Source>, AppError> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE name = $1"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Apply the set fields of `update`. Unset fields keep their value.
    pub async fn update(&self, name: &str, update: &SourceUpdate) -> Result<Source, AppError> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            UPDATE sources
            SET name = COALESCE($2, name),
                board_url = COALESCE($3, board_url),
                declared_type = COALESCE($4, declared_type),
                website_url = COALESCE($5, website_url),
                logo_url = COALESCE($6, logo_url),
                description = COALESCE($7, description),
                updated_at = NOW()
            WHERE name = $1
            RETURNING {SOURCE_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.board_url.as_deref().map(str::trim))
        .bind(update.declared_type.map(|t| t.as_str()))
        .bind(&update.website_url)
        .bind(&update.logo_url)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, update.name.as_deref().unwrap_or(name)))?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("source '{name}'")))
    }

    /// Soft-delete: the source stops being scraped but its records stay.
    pub async fn deactivate(&self, name: &str) -> Result<Source, AppError> {
        self.set_status(name, SourceStatus::Inactive).await
    }

    pub async fn activate(&self, name: &str) -> Result<Source, AppError> {
        self.set_status(name, SourceStatus::Active).await
    }

    async fn set_status(&self, name: &str, status: SourceStatus) -> Result<Source, AppError> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            UPDATE sources
            SET status = $2, updated_at = NOW()
            WHERE name = $1
            RETURNING {SOURCE_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("source '{name}'")))
    }

    pub async fn touch_last_scraped(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE sources SET last_scraped_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

fn map_write_error(error: sqlx::Error, name: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let field = match db.constraint() {
                Some("uq_sources_board_url") => "board URL",
                _ => "name",
            };
            AppError::Conflict(format!("a source with this {field} already exists ({name})"))
        }
        _ => AppError::DatabaseError(error.to_string()),
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct SourceRow {
    id: Uuid,
    name: String,
    board_url: String,
    declared_type: Option<String>,
    status: String,
    website_url: Option<String>,
    logo_url: Option<String>,
    description: Option<String>,
    last_scraped_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            board_url: row.board_url,
            declared_type: row
                .declared_type
                .and_then(|t| t.parse::<SourceType>().ok()),
            status: row.status.parse().unwrap_or(SourceStatus::Inactive),
            website_url: row.website_url,
            logo_url: row.logo_url,
            description: row.description,
            last_scraped_at: row.last_scraped_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
