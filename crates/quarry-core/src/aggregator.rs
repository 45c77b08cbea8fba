//! Multi-source aggregation run.
//!
//! One [`Aggregator::run`] call walks every active source in order,
//! dispatches to the adapter for its ATS family, normalizes and
//! deduplicates what comes back, then persists the accepted records and a
//! [`RunSummary`].
//!
//! # Run states
//!
//! ```text
//! IDLE --> RUNNING --[loop finished]--> COMPLETED
//!             |
//!             +----[store error]-----> FAILED
//! ```
//!
//! Per-source failures (unknown ATS type, fetch error, timeout) and
//! per-posting failures (missing mandatory field) are contained and counted.
//! Only store errors reach the run boundary.

use std::time::Duration;

use chrono::Utc;

use crate::adapter::AdapterRegistry;
use crate::dedup::Deduplicator;
use crate::error::AppError;
use crate::models::{InsertOutcome, NewJobRecord, RunStatus, RunSummary, Source};
use crate::normalize::normalize;
use crate::report::RunReporter;
use crate::source::SourceType;
use crate::traits::JobStore;

/// Tunables for a run.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Upper bound on one adapter `fetch` call. Expiry counts as a fetch failure.
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl AggregatorConfig {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Lifecycle of a single run. No state is re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunState {
    fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Idle, RunState::Running)
                | (RunState::Running, RunState::Completed)
                | (RunState::Running, RunState::Failed)
        )
    }
}

/// Events emitted during a run for monitoring/logging.
#[derive(Debug)]
pub enum RunEvent<'a> {
    Started {
        sources: usize,
    },
    SourceStarted {
        source: &'a Source,
        source_type: SourceType,
    },
    SourceSkipped {
        source: &'a Source,
        reason: &'a AppError,
    },
    SourceFetched {
        source: &'a Source,
        postings: usize,
    },
    SourceFailed {
        source: &'a Source,
        error: &'a AppError,
    },
    PostingDropped {
        source: &'a Source,
        error: &'a AppError,
    },
    DuplicateSkipped {
        job_url: &'a str,
    },
    Finished {
        summary: &'a RunSummary,
    },
    Aborted {
        error: &'a AppError,
    },
}

/// Receives run events (decoupled logging).
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Observer that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunObserver;

impl RunObserver for TracingRunObserver {
    fn on_event(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started { sources } => {
                tracing::info!(%sources, "Starting aggregation run");
            }
            RunEvent::SourceStarted {
                source,
                source_type,
            } => {
                tracing::info!(source = %source.name, ats = %source_type, "Scraping source");
            }
            RunEvent::SourceSkipped { source, reason } => {
                tracing::warn!(source = %source.name, reason = %reason, "Source skipped");
            }
            RunEvent::SourceFetched { source, postings } => {
                tracing::info!(source = %source.name, %postings, "Fetched postings");
            }
            RunEvent::SourceFailed { source, error } if error.is_scrape_failure() => {
                tracing::warn!(source = %source.name, error = %error, "Source failed");
            }
            RunEvent::SourceFailed { source, error } => {
                tracing::error!(source = %source.name, error = %error, "Source failed unexpectedly");
            }
            RunEvent::PostingDropped { source, error } => {
                tracing::warn!(source = %source.name, error = %error, "Posting dropped");
            }
            RunEvent::DuplicateSkipped { job_url } => {
                tracing::debug!(%job_url, "Duplicate skipped");
            }
            RunEvent::Finished { summary } => {
                tracing::info!(
                    status = %summary.status,
                    total_fetched = summary.total_fetched,
                    new_records = summary.new_records_added,
                    duplicates = summary.duplicates_skipped,
                    dropped = summary.postings_dropped,
                    sources = summary.sources_processed,
                    sources_failed = summary.sources_failed,
                    "Aggregation run finished"
                );
            }
            RunEvent::Aborted { error } => {
                tracing::error!(error = %error, "Aggregation run aborted");
            }
        }
    }
}

/// Run-scoped accumulator. Lives exactly as long as one `run()` call.
struct RunContext<'a, S: JobStore> {
    state: RunState,
    dedup: Deduplicator<'a, S>,
    accepted: Vec<NewJobRecord>,
    total_fetched: u32,
    postings_dropped: u32,
    sources_processed: u32,
    sources_failed: u32,
}

impl<'a, S: JobStore> RunContext<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            state: RunState::Idle,
            dedup: Deduplicator::new(store),
            accepted: Vec::new(),
            total_fetched: 0,
            postings_dropped: 0,
            sources_processed: 0,
            sources_failed: 0,
        }
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            total_fetched: self.total_fetched,
            new_records_added: self.dedup.accepted(),
            duplicates_skipped: self.dedup.skipped(),
            postings_dropped: self.postings_dropped,
            sources_processed: self.sources_processed,
            sources_failed: self.sources_failed,
            timestamp: Utc::now(),
            status: RunStatus::Success,
            error_message: None,
        }
    }
}

/// Drives one aggregation pass over all active sources.
///
/// Generic over the store so tests can inject an in-memory one.
pub struct Aggregator<S: JobStore> {
    store: S,
    adapters: AdapterRegistry,
    reporter: RunReporter<S>,
    config: AggregatorConfig,
}

impl<S: JobStore> Aggregator<S> {
    pub fn new(store: S, adapters: AdapterRegistry, config: AggregatorConfig) -> Self {
        Self {
            reporter: RunReporter::new(store.clone()),
            store,
            adapters,
            config,
        }
    }

    /// Execute a run to completion. Always yields a summary; a run aborted by
    /// a store error yields a zeroed `failed` summary carrying the error text.
    ///
    /// The summary is recorded in the run log on a best-effort basis.
    pub async fn run<O: RunObserver>(&self, observer: &O) -> RunSummary {
        let mut ctx = RunContext::new(&self.store);
        ctx.transition(RunState::Running);

        let summary = match self.execute(&mut ctx, observer).await {
            Ok(()) => {
                ctx.transition(RunState::Completed);
                ctx.summary()
            }
            Err(e) => {
                observer.on_event(RunEvent::Aborted { error: &e });
                ctx.transition(RunState::Failed);
                RunSummary::failed(e.to_string())
            }
        };

        self.reporter.record_run(&summary).await;
        observer.on_event(RunEvent::Finished { summary: &summary });
        summary
    }

    async fn execute<O: RunObserver>(
        &self,
        ctx: &mut RunContext<'_, S>,
        observer: &O,
    ) -> Result<(), AppError> {
        let sources = self.store.list_active_sources().await?;
        observer.on_event(RunEvent::Started {
            sources: sources.len(),
        });

        for source in &sources {
            ctx.sources_processed += 1;
            self.process_source(source, ctx, observer).await?;
        }

        self.persist(ctx).await
    }

    /// Scrape one source into the context. Returns `Err` only for store errors.
    async fn process_source<O: RunObserver>(
        &self,
        source: &Source,
        ctx: &mut RunContext<'_, S>,
        observer: &O,
    ) -> Result<(), AppError> {
        let Some(source_type) = SourceType::classify(source) else {
            let reason = AppError::UnknownSourceType(source.board_url.clone());
            observer.on_event(RunEvent::SourceSkipped {
                source,
                reason: &reason,
            });
            ctx.sources_failed += 1;
            return Ok(());
        };

        let Some(adapter) = self.adapters.get(source_type) else {
            let reason = AppError::Generic(format!("No adapter registered for {source_type}"));
            observer.on_event(RunEvent::SourceSkipped {
                source,
                reason: &reason,
            });
            ctx.sources_failed += 1;
            return Ok(());
        };

        observer.on_event(RunEvent::SourceStarted {
            source,
            source_type,
        });

        let fetched =
            tokio::time::timeout(self.config.fetch_timeout, adapter.fetch(&source.board_url))
                .await
                .unwrap_or_else(|_| Err(AppError::Timeout(self.config.fetch_timeout)));

        let postings = match fetched {
            Ok(postings) => postings,
            Err(error) if error.is_store_failure() => return Err(error),
            Err(error) => {
                observer.on_event(RunEvent::SourceFailed {
                    source,
                    error: &error,
                });
                ctx.sources_failed += 1;
                return Ok(());
            }
        };

        self.store.touch_source_last_scraped(source.id).await?;
        observer.on_event(RunEvent::SourceFetched {
            source,
            postings: postings.len(),
        });

        let scraped_at = Utc::now();
        let fetched_count = u32::try_from(postings.len()).unwrap_or(u32::MAX);
        ctx.total_fetched = ctx.total_fetched.saturating_add(fetched_count);

        for raw in postings {
            let Some(job_url) = raw
                .job_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
            else {
                let error = AppError::MissingField { field: "job_url" };
                observer.on_event(RunEvent::PostingDropped {
                    source,
                    error: &error,
                });
                ctx.postings_dropped += 1;
                continue;
            };

            if ctx.dedup.is_duplicate(job_url).await? {
                observer.on_event(RunEvent::DuplicateSkipped { job_url });
                continue;
            }

            match normalize(raw, source, source_type, scraped_at) {
                Ok(record) => {
                    ctx.dedup.accept(&record.identity_hash);
                    ctx.accepted.push(record);
                }
                Err(error) => {
                    observer.on_event(RunEvent::PostingDropped {
                        source,
                        error: &error,
                    });
                    ctx.postings_dropped += 1;
                }
            }
        }

        Ok(())
    }

    /// Insert accepted records newest first. Duplicates rejected by the
    /// store's unique index are counted as skipped, not as errors.
    async fn persist(&self, ctx: &mut RunContext<'_, S>) -> Result<(), AppError> {
        ctx.accepted
            .sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));

        for record in &ctx.accepted {
            match self.store.insert_job_record(record).await? {
                InsertOutcome::Inserted(id) => {
                    tracing::debug!(%id, title = %record.title, "Inserted job record");
                }
                InsertOutcome::Duplicate => {
                    tracing::debug!(job_url = %record.job_url, "Store rejected duplicate");
                    ctx.dedup.reclassify_as_duplicate();
                }
            }
        }

        Ok(())
    }
}
