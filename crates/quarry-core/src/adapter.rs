//! Uniform contract for per-ATS scrapers and the registry that dispatches to them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::RawPosting;
use crate::source::SourceType;

/// Fetches the postings currently listed on one job board.
///
/// Implementations fail with a scrape failure (see
/// [`AppError::is_scrape_failure`]) instead of returning a partial result.
/// Every emitted `job_url` must be absolute: the identity hash is derived
/// from it.
#[async_trait]
pub trait JobBoardAdapter: Send + Sync {
    fn source_type(&self) -> SourceType;

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError>;
}

/// Adapters keyed by the ATS family they handle.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<SourceType, Arc<dyn JobBoardAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own source type, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn JobBoardAdapter>) -> &mut Self {
        self.adapters.insert(adapter.source_type(), adapter);
        self
    }

    pub fn with(mut self, adapter: Arc<dyn JobBoardAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, source_type: SourceType) -> Option<Arc<dyn JobBoardAdapter>> {
        self.adapters.get(&source_type).cloned()
    }

    pub fn source_types(&self) -> Vec<SourceType> {
        let mut types: Vec<_> = self.adapters.keys().copied().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockAdapter;

    #[test]
    fn registry_resolves_by_type() {
        let registry = AdapterRegistry::new()
            .with(Arc::new(MockAdapter::new(SourceType::Lever)))
            .with(Arc::new(MockAdapter::new(SourceType::Ashby)));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(SourceType::Lever).is_some());
        assert!(registry.get(SourceType::Greenhouse).is_none());
        assert_eq!(
            registry.source_types(),
            vec![SourceType::Lever, SourceType::Ashby]
        );
    }

    #[test]
    fn register_replaces_existing() {
        let first = Arc::new(MockAdapter::new(SourceType::Lever));
        let second = Arc::new(
            MockAdapter::new(SourceType::Lever)
                .with_board("https://jobs.lever.co/acme", vec![RawPosting::new("A", "https://x/1")]),
        );
        let mut registry = AdapterRegistry::new();
        registry.register(first).register(second.clone());

        assert_eq!(registry.len(), 1);
        let resolved = registry.get(SourceType::Lever).unwrap();
        assert!(Arc::ptr_eq(
            &resolved,
            &(second as Arc<dyn JobBoardAdapter>)
        ));
    }

    #[tokio::test]
    async fn dispatch_through_trait_object() {
        let registry = AdapterRegistry::new().with(Arc::new(
            MockAdapter::new(SourceType::Breezy).with_board(
                "https://acme.breezy.hr/",
                vec![RawPosting::new("Engineer", "https://acme.breezy.hr/p/1")],
            ),
        ));

        let adapter = registry.get(SourceType::Breezy).unwrap();
        let postings = adapter.fetch("https://acme.breezy.hr/").await.unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title.as_deref(), Some("Engineer"));
    }
}
