use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::source::SourceType;

/// Lifecycle of a source. Sources are deactivated, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Active,
    Inactive,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Active => "active",
            SourceStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SourceStatus::Active),
            "inactive" => Ok(SourceStatus::Inactive),
            _ => Err(format!("Unknown source status: {}", s)),
        }
    }
}

/// A job board registered for scraping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub board_url: String,
    /// Operator-declared ATS family. Overrides URL detection when set.
    pub declared_type: Option<SourceType>,
    pub status: SourceStatus,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    pub fn is_active(&self) -> bool {
        self.status == SourceStatus::Active
    }
}

/// Request to register a new source.
#[derive(Debug, Clone, Default)]
pub struct NewSource {
    pub name: String,
    pub board_url: String,
    pub declared_type: Option<SourceType>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

impl NewSource {
    pub fn new(name: impl Into<String>, board_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            board_url: board_url.into(),
            ..Default::default()
        }
    }

    pub fn with_declared_type(mut self, ty: SourceType) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    pub fn with_logo(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a source's operator-editable fields.
#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub board_url: Option<String>,
    pub declared_type: Option<SourceType>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

impl SourceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.board_url.is_none()
            && self.declared_type.is_none()
            && self.website_url.is_none()
            && self.logo_url.is_none()
            && self.description.is_none()
    }
}

/// A posting as returned by an adapter, before normalization.
///
/// Only `title` and `job_url` are mandatory, and even those are optional
/// here so that a malformed posting can be rejected per-item instead of
/// failing the whole board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: Option<String>,
    /// Absolute, directly navigable URL. The identity hash is derived from it.
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description_short: Option<String>,
    pub description_full: Option<String>,
    pub requirements: Option<String>,
    pub skills: Vec<String>,
    /// Sector hint derived by the adapter (e.g. from a department name).
    pub sector: Option<String>,
    pub posted_date: Option<NaiveDate>,
}

impl RawPosting {
    pub fn new(title: impl Into<String>, job_url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            job_url: Some(job_url.into()),
            ..Default::default()
        }
    }
}

/// Canonical job record ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJobRecord {
    pub identity_hash: String,
    pub title: String,
    pub source_id: Uuid,
    pub source_name: String,
    pub location: String,
    pub salary: Option<String>,
    pub sector: String,
    pub description_short: String,
    pub description_full: String,
    pub requirements: String,
    pub skills: BTreeSet<String>,
    pub job_url: String,
    pub source_type: SourceType,
    pub posted_date: NaiveDate,
    pub scraped_at: DateTime<Utc>,
}

/// A stored job record.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub identity_hash: String,
    pub title: String,
    pub source_id: Option<Uuid>,
    pub source_name: String,
    pub location: String,
    pub salary: Option<String>,
    pub sector: String,
    pub description_short: String,
    pub description_full: String,
    pub requirements: String,
    pub skills: Vec<String>,
    pub job_url: String,
    pub source_type: String,
    pub posted_date: NaiveDate,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    /// A record with the same identity hash already exists.
    Duplicate,
}

/// Final status of an aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// Counters for one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Raw postings returned by all adapters.
    pub total_fetched: u32,
    pub new_records_added: u32,
    pub duplicates_skipped: u32,
    /// Postings rejected for missing a mandatory field.
    pub postings_dropped: u32,
    /// Active sources attempted, including ones that failed.
    pub sources_processed: u32,
    pub sources_failed: u32,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
    pub error_message: Option<String>,
}

impl RunSummary {
    /// A zero-valued summary for a run aborted by an unrecoverable error.
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            total_fetched: 0,
            new_records_added: 0,
            duplicates_skipped: 0,
            postings_dropped: 0,
            sources_processed: 0,
            sources_failed: 0,
            timestamp: Utc::now(),
            status: RunStatus::Failed,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// A persisted run-log entry.
#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    pub id: Uuid,
    pub summary: RunSummary,
    pub created_at: DateTime<Utc>,
}

/// Compute the identity hash of a posting URL: MD5, returned as 32-char hex.
///
/// This is a deduplication key, not a security primitive.
pub fn compute_identity_hash(job_url: &str) -> String {
    format!("{:x}", md5::compute(job_url.as_bytes()))
}
