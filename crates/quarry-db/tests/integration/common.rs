use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use quarry_core::models::{NewJobRecord, compute_identity_hash};
use quarry_core::source::SourceType;
use quarry_db::Database;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use uuid::Uuid;

/// Starts PostgreSQL in a container and returns a migrated [`Database`].
///
/// Keep the container handle alive for the whole test; dropping it stops
/// the database.
pub async fn setup_test_db() -> (Database, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "quarry_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/quarry_test");

    // The server restarts once after init, so the first connects can fail.
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");

    (db, container)
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
}

/// A normalized record for `job_url`, attributed to `source_id`.
pub fn record(source_id: Uuid, job_url: &str, posted: NaiveDate, scraped_hour: u32) -> NewJobRecord {
    NewJobRecord {
        identity_hash: compute_identity_hash(job_url),
        title: "Backend Engineer".into(),
        source_id,
        source_name: "Acme".into(),
        location: "Remote".into(),
        salary: Some("$120k - $150k".into()),
        sector: "engineering".into(),
        description_short: "Build APIs".into(),
        description_full: "Build APIs in Rust.".into(),
        requirements: "Rust\nSQL".into(),
        skills: ["rust".to_string(), "sql".to_string()].into_iter().collect(),
        job_url: job_url.into(),
        source_type: SourceType::Lever,
        posted_date: posted,
        scraped_at: at(scraped_hour),
    }
}
