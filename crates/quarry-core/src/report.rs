use crate::models::RunSummary;
use crate::traits::JobStore;

/// Appends run summaries to the store's run log.
///
/// Reporting is best-effort: a store failure is logged and swallowed so it
/// can never change the outcome of the run being reported.
#[derive(Clone)]
pub struct RunReporter<S: JobStore> {
    store: S,
}

impl<S: JobStore> RunReporter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist the summary. Returns whether it was recorded.
    pub async fn record_run(&self, summary: &RunSummary) -> bool {
        match self.store.record_run_summary(summary).await {
            Ok(()) => {
                tracing::debug!(status = %summary.status, "Run summary recorded");
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    status = %summary.status,
                    "Could not record run summary"
                );
                false
            }
        }
    }
}
