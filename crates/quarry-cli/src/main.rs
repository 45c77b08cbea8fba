mod seed;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use quarry_client::fetcher::DEFAULT_USER_AGENT;
use quarry_client::{HtmdCleaner, ReqwestFetcher, default_registry};
use quarry_core::models::{JobRecord, NewSource, RunSummary, SourceUpdate};
use quarry_core::source::SourceType;
use quarry_core::throttle::{ThrottleConfig, ThrottledFetcher};
use quarry_core::{AppError, Aggregator, AggregatorConfig, TracingRunObserver};
use quarry_db::{Database, DatabaseConfig, JobFilter};

#[derive(Parser)]
#[command(name = "quarry", version, about = "Job board aggregator for hosted ATS platforms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every active source once and record the run
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Run repeatedly until interrupted with Ctrl-C
    Watch {
        /// Seconds between the end of one run and the start of the next
        #[arg(long, env = "QUARRY_INTERVAL_SECS", default_value_t = 86_400)]
        interval_secs: u64,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Manage registered job boards
    Sources {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Browse stored job records
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Show recent run summaries
    History {
        /// Number of runs to show
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
}

#[derive(Args)]
struct ScrapeArgs {
    /// Per-source fetch timeout
    #[arg(long, env = "QUARRY_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Minimum delay between requests to the same ATS host
    #[arg(long, env = "QUARRY_THROTTLE_MS", default_value_t = 1000)]
    throttle_ms: u64,

    /// User-Agent sent to job board APIs
    #[arg(long, env = "QUARRY_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[derive(Subcommand)]
enum SourceCommands {
    /// Register a new job board
    Add {
        #[arg(short, long)]
        name: String,

        /// Public job board URL, e.g. https://jobs.lever.co/acme
        #[arg(short, long)]
        url: String,

        /// ATS family; detected from the URL when omitted
        #[arg(short = 't', long = "type")]
        source_type: Option<SourceType>,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        logo: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List sources (active only unless --all)
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Change fields of an existing source
    Update {
        /// Current source name
        name: String,

        #[arg(long)]
        rename: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(short = 't', long = "type")]
        source_type: Option<SourceType>,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        logo: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Stop scraping a source; its job records are kept
    Deactivate { name: String },

    /// Resume scraping a deactivated source
    Activate { name: String },

    /// Register one sample board per supported ATS
    Seed,
}

#[derive(Subcommand)]
enum JobCommands {
    /// List job records, newest first
    List {
        #[arg(short, long)]
        sector: Option<String>,

        /// Case-insensitive match on title, company, or summary
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long, default_value_t = 50)]
        limit: i64,

        /// Write CSV to stdout
        #[arg(long, default_value_t = false, conflicts_with = "json")]
        csv: bool,

        /// Write JSON to stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quarry=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scrape } => {
            let summary = match connect_db().await {
                Ok(db) => build_aggregator(&db, &scrape)?.run(&TracingRunObserver).await,
                Err(e) => unstarted_run_summary(&e),
            };
            print_summary(&summary);
            if !summary.is_success() {
                anyhow::bail!(
                    "Run failed: {}",
                    summary.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }
        Commands::Watch {
            interval_secs,
            scrape,
        } => {
            let db = match connect_db().await {
                Ok(db) => db,
                Err(e) => {
                    print_summary(&unstarted_run_summary(&e));
                    return Err(e);
                }
            };
            let aggregator = build_aggregator(&db, &scrape)?;
            let cancel = CancellationToken::new();
            spawn_ctrl_c_handler(cancel.clone());
            cmd_watch(&aggregator, Duration::from_secs(interval_secs), cancel).await;
        }
        Commands::Sources { command } => cmd_sources(&connect_db().await?, command).await?,
        Commands::Jobs {
            command:
                JobCommands::List {
                    sector,
                    query,
                    limit,
                    csv,
                    json,
                },
        } => {
            let filter = JobFilter {
                sector,
                query,
                limit: Some(limit),
            };
            let db = connect_db().await?;
            let records = db.job_records().list(&filter).await.map_err(anyhow::Error::new)?;
            if csv {
                write_csv(&records)?;
            } else if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_jobs(&records);
            }
        }
        Commands::History { limit } => {
            let db = connect_db().await?;
            let history = db.run_log().history(limit).await.map_err(anyhow::Error::new)?;
            if history.is_empty() {
                println!("No runs recorded yet");
            }
            for entry in &history {
                print_summary(&entry.summary);
            }
        }
    }

    Ok(())
}

/// Connect using `DATABASE_URL` and bring the schema up to date.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().map_err(anyhow::Error::new)?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(anyhow::Error::new)?;
    Ok(db)
}

/// Summary for a run that never reached the store (missing configuration or
/// database down). There is nowhere to record it, so it is only reported.
fn unstarted_run_summary(error: &anyhow::Error) -> RunSummary {
    tracing::warn!(error = %format!("{error:#}"), "Store unavailable, run summary not recorded");
    RunSummary::failed(format!("{error:#}"))
}

fn build_aggregator(db: &Database, args: &ScrapeArgs) -> Result<Aggregator<Database>> {
    let timeout = Duration::from_secs(args.fetch_timeout_secs.max(1));
    let fetcher = ReqwestFetcher::with_options(timeout, &args.user_agent)
        .context("Failed to create HTTP client")?;
    let throttle = ThrottleConfig::new(Duration::from_millis(args.throttle_ms))
        .with_jitter(Duration::from_millis(args.throttle_ms / 4));

    let registry = default_registry(ThrottledFetcher::new(fetcher, throttle), HtmdCleaner::new());
    let config = AggregatorConfig::default().with_fetch_timeout(timeout);

    Ok(Aggregator::new(db.clone(), registry, config))
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping after the current run");
            cancel.cancel();
        }
    });
}

async fn cmd_watch(aggregator: &Aggregator<Database>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Watching job boards");

    loop {
        let summary = aggregator.run(&TracingRunObserver).await;
        print_summary(&summary);

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = cancel.cancelled() => break,
        }
    }

    tracing::info!("Watch stopped");
}

async fn cmd_sources(db: &Database, command: SourceCommands) -> Result<()> {
    let repo = db.sources();

    match command {
        SourceCommands::Add {
            name,
            url,
            source_type,
            website,
            logo,
            description,
        } => {
            let detected = source_type.or_else(|| SourceType::detect(&url));
            if detected.is_none() {
                tracing::warn!(%url, "Could not detect ATS type; the source will be skipped until --type is set");
            }
            let new = NewSource {
                name,
                board_url: url,
                declared_type: source_type,
                website_url: website,
                logo_url: logo,
                description,
            };
            let source = repo.add(&new).await.map_err(anyhow::Error::new)?;
            println!("Added {} ({})", source.name, source.id);
        }
        SourceCommands::List { all } => {
            let sources = if all {
                repo.list_all().await
            } else {
                repo.list_active().await
            }
            .map_err(anyhow::Error::new)?;

            if sources.is_empty() {
                println!("No sources registered");
            }
            for source in &sources {
                let ats = SourceType::classify(source)
                    .map(|t| t.as_str())
                    .unwrap_or("unknown");
                let last = source
                    .last_scraped_at
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "  {:<24} {:<10} {:<8} last scraped: {:<20} {}",
                    source.name, ats, source.status, last, source.board_url
                );
            }
        }
        SourceCommands::Update {
            name,
            rename,
            url,
            source_type,
            website,
            logo,
            description,
        } => {
            let update = SourceUpdate {
                name: rename,
                board_url: url,
                declared_type: source_type,
                website_url: website,
                logo_url: logo,
                description,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update for {name}");
            }
            let source = repo.update(&name, &update).await.map_err(anyhow::Error::new)?;
            println!("Updated {}", source.name);
        }
        SourceCommands::Deactivate { name } => {
            repo.deactivate(&name).await.map_err(anyhow::Error::new)?;
            println!("Deactivated {name}");
        }
        SourceCommands::Activate { name } => {
            repo.activate(&name).await.map_err(anyhow::Error::new)?;
            println!("Activated {name}");
        }
        SourceCommands::Seed => {
            for sample in seed::sample_sources() {
                match repo.add(&sample).await {
                    Ok(source) => println!("Added {}", source.name),
                    Err(AppError::Conflict(_)) => println!("Exists {}", sample.name),
                    Err(e) => return Err(anyhow::Error::new(e)),
                }
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "[{}] {} | sources {} ({} failed) | fetched {} | new {} | duplicates {} | dropped {}",
        summary.status,
        summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.sources_processed,
        summary.sources_failed,
        summary.total_fetched,
        summary.new_records_added,
        summary.duplicates_skipped,
        summary.postings_dropped,
    );
    if let Some(message) = &summary.error_message {
        println!("    error: {message}");
    }
}

fn print_jobs(records: &[JobRecord]) {
    if records.is_empty() {
        println!("No job records found");
        return;
    }
    for record in records {
        println!(
            "  {} {:<40} {:<20} {:<12} {:<16} {}",
            record.posted_date,
            truncate(&record.title, 40),
            truncate(&record.source_name, 20),
            record.sector,
            record.salary.as_deref().unwrap_or("-"),
            record.job_url,
        );
    }
    println!("\nTotal: {} records", records.len());
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Flat CSV shape; skills are joined with `;`.
#[derive(Serialize)]
struct JobCsvRow<'a> {
    posted_date: String,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    salary: &'a str,
    sector: &'a str,
    source_type: &'a str,
    skills: String,
    job_url: &'a str,
    description_short: &'a str,
}

fn write_csv(records: &[JobRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    for record in records {
        writer.serialize(JobCsvRow {
            posted_date: record.posted_date.to_string(),
            title: &record.title,
            company: &record.source_name,
            location: &record.location,
            salary: record.salary.as_deref().unwrap_or_default(),
            sector: &record.sector,
            source_type: &record.source_type,
            skills: record.skills.join(";"),
            job_url: &record.job_url,
            description_short: &record.description_short,
        })?;
    }
    writer.flush()?;
    Ok(())
}
