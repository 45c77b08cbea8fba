use quarry_core::AppError;
use quarry_core::models::{NewSource, SourceStatus, SourceUpdate};
use quarry_core::source::SourceType;

use crate::integration::common::setup_test_db;

#[tokio::test]
async fn add_and_list_sources() {
    let (db, _container) = setup_test_db().await;
    let repo = db.sources();

    let acme = repo
        .add(
            &NewSource::new("Acme", "https://jobs.lever.co/acme")
                .with_website("https://acme.example")
                .with_description("Payments"),
        )
        .await
        .unwrap();
    assert_eq!(acme.status, SourceStatus::Active);
    assert_eq!(acme.declared_type, None);
    assert!(acme.last_scraped_at.is_none());

    let globex = repo
        .add(
            &NewSource::new("Globex", "https://careers.globex.example/jobs")
                .with_declared_type(SourceType::Greenhouse),
        )
        .await
        .unwrap();
    assert_eq!(globex.declared_type, Some(SourceType::Greenhouse));

    let active = repo.list_active().await.unwrap();
    let names: Vec<_> = active.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Acme", "Globex"]);
}

#[tokio::test]
async fn duplicate_name_or_url_is_conflict() {
    let (db, _container) = setup_test_db().await;
    let repo = db.sources();

    repo.add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();

    let err = repo
        .add(&NewSource::new("Acme", "https://jobs.lever.co/other"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m.contains("name")), "{err}");

    let err = repo
        .add(&NewSource::new("Acme Two", "https://jobs.lever.co/acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m.contains("board URL")), "{err}");
}

#[tokio::test]
async fn deactivated_sources_are_not_listed_as_active() {
    let (db, _container) = setup_test_db().await;
    let repo = db.sources();

    repo.add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();
    repo.add(&NewSource::new("Initech", "https://initech.breezy.hr"))
        .await
        .unwrap();

    let inactive = repo.deactivate("Initech").await.unwrap();
    assert_eq!(inactive.status, SourceStatus::Inactive);

    let active = repo.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Acme");
    assert_eq!(repo.list_all().await.unwrap().len(), 2);

    repo.activate("Initech").await.unwrap();
    assert_eq!(repo.list_active().await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let (db, _container) = setup_test_db().await;
    let repo = db.sources();

    repo.add(&NewSource::new("Acme", "https://jobs.lever.co/acme").with_description("Payments"))
        .await
        .unwrap();

    let updated = repo
        .update(
            "Acme",
            &SourceUpdate {
                board_url: Some("https://jobs.ashbyhq.com/acme".into()),
                declared_type: Some(SourceType::Ashby),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.board_url, "https://jobs.ashbyhq.com/acme");
    assert_eq!(updated.declared_type, Some(SourceType::Ashby));
    assert_eq!(updated.description.as_deref(), Some("Payments"));
    assert!(updated.updated_at >= updated.created_at);
}

#[tokio::test]
async fn unknown_source_is_not_found() {
    let (db, _container) = setup_test_db().await;
    let repo = db.sources();

    assert!(repo.get_by_name("Nope").await.unwrap().is_none());
    assert!(matches!(
        repo.deactivate("Nope").await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        repo.update("Nope", &SourceUpdate::default()).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn touch_sets_last_scraped() {
    let (db, _container) = setup_test_db().await;
    let repo = db.sources();

    let source = repo
        .add(&NewSource::new("Acme", "https://jobs.lever.co/acme"))
        .await
        .unwrap();
    repo.touch_last_scraped(source.id).await.unwrap();

    let reloaded = repo.get_by_name("Acme").await.unwrap().unwrap();
    assert!(reloaded.last_scraped_at.is_some());
}
