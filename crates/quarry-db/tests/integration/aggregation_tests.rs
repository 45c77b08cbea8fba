use std::sync::Arc;

use quarry_core::models::{NewSource, RawPosting, RunStatus};
use quarry_core::source::SourceType;
use quarry_core::testutil::MockAdapter;
use quarry_core::{AdapterRegistry, Aggregator, AggregatorConfig, TracingRunObserver};
use quarry_db::JobFilter;

use crate::integration::common::setup_test_db;

fn posting(url: &str) -> RawPosting {
    let mut raw = RawPosting::new("Platform Engineer", url);
    raw.description_full = Some("Salary $140k - $170k. Rust and Kubernetes.".into());
    raw
}

#[tokio::test]
async fn run_against_postgres_is_idempotent() {
    let (db, _container) = setup_test_db().await;
    db.sources()
        .add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();
    db.sources()
        .add(&NewSource::new("Globex", "https://boards.greenhouse.io/globex"))
        .await
        .unwrap();

    let registry = AdapterRegistry::new()
        .with(Arc::new(MockAdapter::new(SourceType::Lever).with_board(
            "https://jobs.lever.co/acme",
            vec![
                posting("https://jobs.lever.co/acme/1"),
                posting("https://jobs.lever.co/acme/2"),
            ],
        )))
        .with(Arc::new(
            MockAdapter::new(SourceType::Greenhouse)
                .with_failure("https://boards.greenhouse.io/globex", "HTTP 503"),
        ));

    let aggregator = Aggregator::new(db.clone(), registry, AggregatorConfig::default());

    let first = aggregator.run(&TracingRunObserver).await;
    assert_eq!(first.status, RunStatus::Success);
    assert_eq!(first.sources_processed, 2);
    assert_eq!(first.sources_failed, 1);
    assert_eq!(first.new_records_added, 2);

    let second = aggregator.run(&TracingRunObserver).await;
    assert_eq!(second.status, RunStatus::Success);
    assert_eq!(second.new_records_added, 0);
    assert_eq!(second.duplicates_skipped, 2);

    let records = db.job_records().list(&JobFilter::default()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.salary.as_deref() == Some("$140k - $170k")));
    assert!(records.iter().all(|r| r.source_type == "lever"));

    let history = db.run_log().history(10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].summary.duplicates_skipped, 2);

    let acme = db.sources().get_by_name("Acme").await.unwrap().unwrap();
    assert!(acme.last_scraped_at.is_some());
    let globex = db.sources().get_by_name("Globex").await.unwrap().unwrap();
    assert!(globex.last_scraped_at.is_none());
}
