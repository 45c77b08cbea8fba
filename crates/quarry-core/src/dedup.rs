use std::collections::HashSet;

use crate::error::AppError;
use crate::normalize::stable_hash;
use crate::traits::JobStore;

/// Run-scoped duplicate filter.
///
/// The pre-check avoids normalizing and logging postings the store already
/// holds. It is not the enforcement point: the store's unique index is, and
/// an insert it rejects is moved back into the skipped count with
/// [`reclassify_as_duplicate`](Self::reclassify_as_duplicate).
pub struct Deduplicator<'a, S: JobStore> {
    store: &'a S,
    seen: HashSet<String>,
    accepted: u32,
    skipped: u32,
}

impl<'a, S: JobStore> Deduplicator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            seen: HashSet::new(),
            accepted: 0,
            skipped: 0,
        }
    }

    /// Check a posting URL against this run's accepted set and the store.
    ///
    /// Counts the URL as skipped when it is a duplicate. Store errors
    /// propagate unchanged.
    pub async fn is_duplicate(&mut self, job_url: &str) -> Result<bool, AppError> {
        let hash = stable_hash(job_url);
        let duplicate =
            self.seen.contains(&hash) || self.store.exists_by_identity_hash(&hash).await?;
        if duplicate {
            self.skipped += 1;
        }
        Ok(duplicate)
    }

    /// Record that a record with this identity hash has been accepted.
    pub fn accept(&mut self, identity_hash: &str) {
        self.seen.insert(identity_hash.to_string());
        self.accepted += 1;
    }

    /// Move one previously accepted record into the skipped count.
    pub fn reclassify_as_duplicate(&mut self) {
        self.accepted = self.accepted.saturating_sub(1);
        self.skipped += 1;
    }

    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    pub fn skipped(&self) -> u32 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockStore;

    #[tokio::test]
    async fn new_url_is_not_duplicate() {
        let store = MockStore::empty();
        let mut dedup = Deduplicator::new(&store);

        assert!(!dedup.is_duplicate("https://jobs.lever.co/a/1").await.unwrap());
        assert_eq!(dedup.skipped(), 0);
    }

    #[tokio::test]
    async fn stored_url_is_duplicate() {
        let store = MockStore::with_existing_urls(&["https://jobs.lever.co/a/1"]);
        let mut dedup = Deduplicator::new(&store);

        assert!(dedup.is_duplicate("https://jobs.lever.co/a/1").await.unwrap());
        assert_eq!(dedup.skipped(), 1);
        assert_eq!(dedup.accepted(), 0);
    }

    #[tokio::test]
    async fn url_accepted_earlier_in_run_is_duplicate() {
        let store = MockStore::empty();
        let mut dedup = Deduplicator::new(&store);

        let url = "https://boards.greenhouse.io/acme/jobs/7";
        assert!(!dedup.is_duplicate(url).await.unwrap());
        dedup.accept(&stable_hash(url));

        assert!(dedup.is_duplicate(url).await.unwrap());
        assert_eq!(dedup.accepted(), 1);
        assert_eq!(dedup.skipped(), 1);
    }

    #[tokio::test]
    async fn store_error_propagates() {
        let store = MockStore::unavailable("connection refused");
        let mut dedup = Deduplicator::new(&store);

        let err = dedup.is_duplicate("https://x/1").await.unwrap_err();
        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn reclassify_moves_between_counters() {
        let store = MockStore::empty();
        let mut dedup = Deduplicator::new(&store);
        dedup.accept("abc");
        dedup.accept("def");
        dedup.reclassify_as_duplicate();

        assert_eq!(dedup.accepted(), 1);
        assert_eq!(dedup.skipped(), 1);
    }
}
