use std::sync::Arc;

use quarry_core::adapter::AdapterRegistry;
use quarry_core::traits::{Cleaner, Fetcher};

use crate::adapters::{AshbyAdapter, BreezyAdapter, GreenhouseAdapter, LeverAdapter, WorkableAdapter};

/// A registry with an adapter for every supported ATS, all sharing one
/// fetcher and cleaner.
pub fn default_registry<F, C>(fetcher: F, cleaner: C) -> AdapterRegistry
where
    F: Fetcher + 'static,
    C: Cleaner + 'static,
{
    AdapterRegistry::new()
        .with(Arc::new(LeverAdapter::new(fetcher.clone(), cleaner.clone())))
        .with(Arc::new(GreenhouseAdapter::new(fetcher.clone(), cleaner.clone())))
        .with(Arc::new(AshbyAdapter::new(fetcher.clone(), cleaner.clone())))
        .with(Arc::new(BreezyAdapter::new(fetcher.clone(), cleaner.clone())))
        .with(Arc::new(WorkableAdapter::new(fetcher, cleaner)))
}
