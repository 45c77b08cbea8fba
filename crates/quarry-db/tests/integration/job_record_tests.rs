use chrono::NaiveDate;
use quarry_core::models::{InsertOutcome, NewSource};
use quarry_db::JobFilter;

use crate::integration::common::{record, setup_test_db};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[tokio::test]
async fn insert_is_idempotent_per_identity() {
    let (db, _container) = setup_test_db().await;
    let source = db
        .sources()
        .add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();
    let repo = db.job_records();

    let rec = record(source.id, "https://jobs.lever.co/acme/1", day(10), 9);
    assert!(!repo.exists_by_hash(&rec.identity_hash).await.unwrap());

    let first = repo.insert(&rec).await.unwrap();
    assert!(matches!(first, InsertOutcome::Inserted(_)));
    assert!(repo.exists_by_hash(&rec.identity_hash).await.unwrap());

    // Same URL under a different title still collides.
    let mut again = rec.clone();
    again.title = "Renamed".into();
    assert_eq!(repo.insert(&again).await.unwrap(), InsertOutcome::Duplicate);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn stored_record_reads_back() {
    let (db, _container) = setup_test_db().await;
    let source = db
        .sources()
        .add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();
    let repo = db.job_records();

    let rec = record(source.id, "https://jobs.lever.co/acme/1", day(10), 9);
    repo.insert(&rec).await.unwrap();

    let listed = repo.list(&JobFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    let stored = &listed[0];
    assert_eq!(stored.identity_hash, rec.identity_hash);
    assert_eq!(stored.identity_hash.len(), 32);
    assert_eq!(stored.source_id, Some(source.id));
    assert_eq!(stored.skills, vec!["rust", "sql"]);
    assert_eq!(stored.source_type, "lever");
    assert_eq!(stored.posted_date, day(10));
    assert_eq!(stored.scraped_at, rec.scraped_at);
    assert_eq!(stored.salary.as_deref(), Some("$120k - $150k"));
}

#[tokio::test]
async fn list_orders_newest_first_and_filters() {
    let (db, _container) = setup_test_db().await;
    let source = db
        .sources()
        .add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();
    let repo = db.job_records();

    let older = record(source.id, "https://jobs.lever.co/acme/old", day(1), 9);
    let newer_early = record(source.id, "https://jobs.lever.co/acme/a", day(5), 8);
    let mut newer_late = record(source.id, "https://jobs.lever.co/acme/b", day(5), 11);
    newer_late.title = "Growth Marketer".into();
    newer_late.sector = "marketing".into();

    for rec in [&older, &newer_early, &newer_late] {
        repo.insert(rec).await.unwrap();
    }

    let all = repo.list(&JobFilter::default()).await.unwrap();
    let urls: Vec<_> = all.iter().map(|r| r.job_url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://jobs.lever.co/acme/b",
            "https://jobs.lever.co/acme/a",
            "https://jobs.lever.co/acme/old",
        ]
    );

    let marketing = repo
        .list(&JobFilter {
            sector: Some("Marketing".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(marketing.len(), 1);

    let matched = repo
        .list(&JobFilter {
            query: Some("growth".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Growth Marketer");

    let limited = repo
        .list(&JobFilter {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}
