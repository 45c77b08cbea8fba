pub mod adapters;
pub mod cleaner;
pub mod fetcher;
pub mod registry;
pub mod sections;
pub mod sector;

pub use adapters::{AshbyAdapter, BreezyAdapter, GreenhouseAdapter, LeverAdapter, WorkableAdapter};
pub use cleaner::HtmdCleaner;
pub use fetcher::ReqwestFetcher;
pub use registry::default_registry;
