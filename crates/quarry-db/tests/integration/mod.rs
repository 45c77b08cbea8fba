pub mod common;

mod aggregation_tests;
mod job_record_tests;
mod run_log_tests;
mod source_tests;
