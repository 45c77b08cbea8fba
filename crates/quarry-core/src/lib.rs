pub mod adapter;
pub mod aggregator;
pub mod dedup;
pub mod error;
pub mod models;
pub mod normalize;
pub mod report;
pub mod source;
pub mod throttle;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use adapter::{AdapterRegistry, JobBoardAdapter};
pub use aggregator::{Aggregator, AggregatorConfig, RunEvent, RunObserver, TracingRunObserver};
pub use error::AppError;
pub use models::{
    InsertOutcome, JobRecord, NewJobRecord, NewSource, RawPosting, RunStatus, RunSummary, Source,
    SourceStatus, compute_identity_hash,
};
pub use source::SourceType;
pub use traits::{Cleaner, Fetcher, JobStore};
