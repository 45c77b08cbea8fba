use std::future::Future;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{InsertOutcome, NewJobRecord, RunSummary, Source};

/// Fetches a response body from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into plain readable text.
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// The narrow read/write contract the aggregation engine needs from storage.
///
/// Any error returned here is treated as the store being unavailable.
pub trait JobStore: Send + Sync + Clone {
    /// Active sources in a stable order. Inactive sources are never returned.
    fn list_active_sources(&self) -> impl Future<Output = Result<Vec<Source>, AppError>> + Send;

    fn exists_by_identity_hash(
        &self,
        identity_hash: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Insert a record. Must reject a duplicate identity hash with
    /// [`InsertOutcome::Duplicate`] rather than an error, even if the caller
    /// skipped [`exists_by_identity_hash`](Self::exists_by_identity_hash).
    fn insert_job_record(
        &self,
        record: &NewJobRecord,
    ) -> impl Future<Output = Result<InsertOutcome, AppError>> + Send;

    fn touch_source_last_scraped(
        &self,
        source_id: Uuid,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Append a run summary to the run log.
    fn record_run_summary(
        &self,
        summary: &RunSummary,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}
