pub mod config;
pub mod database;
pub mod job_record_repository;
pub mod run_log_repository;
pub mod source_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use job_record_repository::{JobFilter, JobRecordRepository};
pub use run_log_repository::RunLogRepository;
pub use source_repository::SourceRepository;
