use chrono::Duration;
use quarry_core::models::{RunStatus, RunSummary};

use crate::integration::common::{at, setup_test_db};

#[tokio::test]
async fn history_is_newest_first() {
    let (db, _container) = setup_test_db().await;
    let repo = db.run_log();

    let success = RunSummary {
        total_fetched: 14,
        new_records_added: 9,
        duplicates_skipped: 4,
        postings_dropped: 1,
        sources_processed: 5,
        sources_failed: 1,
        timestamp: at(9),
        status: RunStatus::Success,
        error_message: None,
    };
    let mut failed = RunSummary::failed("Database error: connection refused");
    failed.timestamp = at(9) + Duration::hours(1);

    repo.record(&success).await.unwrap();
    repo.record(&failed).await.unwrap();

    let history = repo.history(10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].summary.status, RunStatus::Failed);
    assert_eq!(
        history[0].summary.error_message.as_deref(),
        Some("Database error: connection refused")
    );
    assert_eq!(history[0].summary.new_records_added, 0);
    assert_eq!(history[1].summary, success);

    assert_eq!(repo.history(1).await.unwrap().len(), 1);
}
