//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests. State lives in
//! `Arc<Mutex<_>>` so tests can assert on what was recorded after the code
//! under test has consumed a clone.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::adapter::JobBoardAdapter;
use crate::error::AppError;
use crate::models::{InsertOutcome, NewJobRecord, RawPosting, RunSummary, Source, SourceStatus};
use crate::normalize::stable_hash;
use crate::source::SourceType;
use crate::traits::{Fetcher, JobStore};

/// Build an active source with a fresh id and no declared type.
pub fn make_source(name: &str, board_url: &str) -> Source {
    Source {
        id: Uuid::new_v4(),
        name: name.to_string(),
        board_url: board_url.to_string(),
        declared_type: None,
        status: SourceStatus::Active,
        website_url: None,
        logo_url: None,
        description: None,
        last_scraped_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns queued responses and records requested URLs.
#[derive(Clone)]
pub struct MockFetcher {
    /// Each call pops the first element. When empty, returns `"{}"`.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("{}".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockAdapter
// ---------------------------------------------------------------------------

/// Mock adapter serving canned postings per board URL.
///
/// Responses are replayed on every call so the same adapter can back
/// several runs. Unknown boards return an empty list.
#[derive(Clone)]
pub struct MockAdapter {
    source_type: SourceType,
    boards: Arc<Mutex<HashMap<String, Result<Vec<RawPosting>, String>>>>,
    delay: Option<Duration>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockAdapter {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            boards: Arc::new(Mutex::new(HashMap::new())),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_board(self, board_url: &str, postings: Vec<RawPosting>) -> Self {
        self.boards
            .lock()
            .unwrap()
            .insert(board_url.to_string(), Ok(postings));
        self
    }

    /// Make fetches of this board fail with an HTTP error.
    pub fn with_failure(self, board_url: &str, message: &str) -> Self {
        self.boards
            .lock()
            .unwrap()
            .insert(board_url.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl JobBoardAdapter for MockAdapter {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError> {
        self.calls.lock().unwrap().push(board_url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.boards.lock().unwrap().get(board_url).cloned();
        match response {
            Some(Ok(postings)) => Ok(postings),
            Some(Err(message)) => Err(AppError::HttpError(message)),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory store with a unique identity index.
#[derive(Clone)]
pub struct MockStore {
    pub sources: Arc<Mutex<Vec<Source>>>,
    pub records: Arc<Mutex<Vec<NewJobRecord>>>,
    pub runs: Arc<Mutex<Vec<RunSummary>>>,
    pub touched: Arc<Mutex<Vec<Uuid>>>,
    /// Unique index over identity hashes. Authoritative for inserts.
    index: Arc<Mutex<HashSet<String>>>,
    /// When set, every operation fails with this database error.
    unavailable: Option<String>,
    /// When set, `exists_by_identity_hash` always answers `false`.
    stale_index: bool,
    list_error: Arc<Mutex<Option<AppError>>>,
    record_run_error: Arc<Mutex<Option<AppError>>>,
    exists_failure: Arc<Mutex<Option<FailAfter>>>,
    insert_failure: Arc<Mutex<Option<FailAfter>>>,
}

/// Lets `remaining` calls through, then fails every later call.
struct FailAfter {
    remaining: usize,
    message: String,
}

fn trip(slot: &Mutex<Option<FailAfter>>) -> Result<(), AppError> {
    if let Some(fail) = slot.lock().unwrap().as_mut() {
        if fail.remaining == 0 {
            return Err(AppError::DatabaseError(fail.message.clone()));
        }
        fail.remaining -= 1;
    }
    Ok(())
}

impl MockStore {
    pub fn empty() -> Self {
        Self {
            sources: Arc::new(Mutex::new(Vec::new())),
            records: Arc::new(Mutex::new(Vec::new())),
            runs: Arc::new(Mutex::new(Vec::new())),
            touched: Arc::new(Mutex::new(Vec::new())),
            index: Arc::new(Mutex::new(HashSet::new())),
            unavailable: None,
            stale_index: false,
            list_error: Arc::new(Mutex::new(None)),
            record_run_error: Arc::new(Mutex::new(None)),
            exists_failure: Arc::new(Mutex::new(None)),
            insert_failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_sources(sources: Vec<Source>) -> Self {
        let store = Self::empty();
        *store.sources.lock().unwrap() = sources;
        store
    }

    /// Store whose index already holds these posting URLs.
    pub fn with_existing_urls(urls: &[&str]) -> Self {
        let store = Self::empty();
        store.seed_index(urls);
        store
    }

    /// Store where every call fails as if the database were down.
    pub fn unavailable(message: &str) -> Self {
        Self {
            unavailable: Some(message.to_string()),
            ..Self::empty()
        }
    }

    /// `list_active_sources` fails once with this error.
    pub fn with_list_error(self, error: AppError) -> Self {
        *self.list_error.lock().unwrap() = Some(error);
        self
    }

    /// `record_run_summary` fails once with this error.
    pub fn with_record_run_error(self, error: AppError) -> Self {
        *self.record_run_error.lock().unwrap() = Some(error);
        self
    }

    /// `exists_by_identity_hash` succeeds `calls` times, then fails with a
    /// database error.
    pub fn with_exists_failure_after(self, calls: usize, message: &str) -> Self {
        *self.exists_failure.lock().unwrap() = Some(FailAfter {
            remaining: calls,
            message: message.to_string(),
        });
        self
    }

    /// `insert_job_record` succeeds `calls` times, then fails with a
    /// database error.
    pub fn with_insert_failure_after(self, calls: usize, message: &str) -> Self {
        *self.insert_failure.lock().unwrap() = Some(FailAfter {
            remaining: calls,
            message: message.to_string(),
        });
        self
    }

    /// The pre-check misses these URLs but inserts of them are rejected.
    pub fn with_stale_index(mut self, urls: &[&str]) -> Self {
        self.seed_index(urls);
        self.stale_index = true;
        self
    }

    fn seed_index(&self, urls: &[&str]) {
        let mut index = self.index.lock().unwrap();
        for url in urls {
            index.insert(stable_hash(url));
        }
    }

    fn check_available(&self) -> Result<(), AppError> {
        match &self.unavailable {
            Some(message) => Err(AppError::DatabaseError(message.clone())),
            None => Ok(()),
        }
    }
}

impl JobStore for MockStore {
    async fn list_active_sources(&self) -> Result<Vec<Source>, AppError> {
        self.check_available()?;
        if let Some(e) = self.list_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self
            .sources
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect())
    }

    async fn exists_by_identity_hash(&self, identity_hash: &str) -> Result<bool, AppError> {
        self.check_available()?;
        trip(&self.exists_failure)?;
        if self.stale_index {
            return Ok(false);
        }
        Ok(self.index.lock().unwrap().contains(identity_hash))
    }

    async fn insert_job_record(&self, record: &NewJobRecord) -> Result<InsertOutcome, AppError> {
        self.check_available()?;
        trip(&self.insert_failure)?;
        if !self.index.lock().unwrap().insert(record.identity_hash.clone()) {
            return Ok(InsertOutcome::Duplicate);
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(InsertOutcome::Inserted(Uuid::new_v4()))
    }

    async fn touch_source_last_scraped(&self, source_id: Uuid) -> Result<(), AppError> {
        self.check_available()?;
        self.touched.lock().unwrap().push(source_id);
        Ok(())
    }

    async fn record_run_summary(&self, summary: &RunSummary) -> Result<(), AppError> {
        self.check_available()?;
        if let Some(e) = self.record_run_error.lock().unwrap().take() {
            return Err(e);
        }
        self.runs.lock().unwrap().push(summary.clone());
        Ok(())
    }
}
