use async_trait::async_trait;
use quarry_core::adapter::JobBoardAdapter;
use quarry_core::error::AppError;
use quarry_core::models::RawPosting;
use quarry_core::source::SourceType;
use quarry_core::traits::{Cleaner, Fetcher};
use serde::Deserialize;

use super::{board_slug, describe, fetch_json, non_empty, parse_board_url, parse_date, sector_from};

const API_BASE: &str = "https://api.ashbyhq.com/posting-api/job-board";

/// Ashby boards (`https://jobs.ashbyhq.com/<org>`) via the public posting API.
#[derive(Clone)]
pub struct AshbyAdapter<F, C> {
    fetcher: F,
    cleaner: C,
}

impl<F: Fetcher, C: Cleaner> AshbyAdapter<F, C> {
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self { fetcher, cleaner }
    }

    fn api_url(board_url: &str) -> Result<String, AppError> {
        let org = board_slug(&parse_board_url(board_url)?)?;
        Ok(format!("{API_BASE}/{org}?includeCompensation=true"))
    }

    fn to_raw(&self, job: AshbyJob) -> Result<RawPosting, AppError> {
        let location = match (non_empty(job.location), job.is_remote) {
            (Some(location), _) => Some(location),
            (None, Some(true)) => Some("Remote".to_string()),
            (None, _) => None,
        };

        let mut raw = RawPosting {
            title: non_empty(job.title),
            job_url: non_empty(job.job_url),
            location,
            salary: job
                .compensation
                .and_then(|c| non_empty(c.scrapeable_compensation_salary_summary)),
            sector: sector_from(
                [&job.department, &job.team]
                    .into_iter()
                    .flatten()
                    .map(String::as_str),
            ),
            posted_date: job.published_at.as_deref().and_then(parse_date),
            ..Default::default()
        };

        describe(
            &mut raw,
            &self.cleaner,
            job.description_html.as_deref(),
            job.description_plain.as_deref(),
        )?;
        Ok(raw)
    }
}

#[async_trait]
impl<F, C> JobBoardAdapter for AshbyAdapter<F, C>
where
    F: Fetcher + 'static,
    C: Cleaner + 'static,
{
    fn source_type(&self) -> SourceType {
        SourceType::Ashby
    }

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError> {
        let api_url = Self::api_url(board_url)?;
        let board: AshbyBoard = fetch_json(&self.fetcher, &api_url).await?;
        tracing::debug!(board = %board_url, count = board.jobs.len(), "Ashby jobs fetched");
        board
            .jobs
            .into_iter()
            // Unlisted jobs are reachable by link only.
            .filter(|job| job.is_listed.unwrap_or(true))
            .map(|job| self.to_raw(job))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AshbyBoard {
    jobs: Vec<AshbyJob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AshbyJob {
    title: Option<String>,
    location: Option<String>,
    department: Option<String>,
    team: Option<String>,
    is_listed: Option<bool>,
    is_remote: Option<bool>,
    description_html: Option<String>,
    description_plain: Option<String>,
    published_at: Option<String>,
    job_url: Option<String>,
    compensation: Option<AshbyCompensation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AshbyCompensation {
    scrapeable_compensation_salary_summary: Option<String>,
}
