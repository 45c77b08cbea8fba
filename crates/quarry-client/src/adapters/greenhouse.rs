use async_trait::async_trait;
use quarry_core::adapter::JobBoardAdapter;
use quarry_core::error::AppError;
use quarry_core::models::RawPosting;
use quarry_core::source::SourceType;
use quarry_core::traits::{Cleaner, Fetcher};
use serde::Deserialize;

use super::{board_slug, describe, fetch_json, non_empty, parse_board_url, parse_date, sector_from};
use crate::sections::unescape_html;

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

/// Greenhouse boards, read through the Job Board API with content inlined.
#[derive(Clone)]
pub struct GreenhouseAdapter<F, C> {
    fetcher: F,
    cleaner: C,
}

impl<F: Fetcher, C: Cleaner> GreenhouseAdapter<F, C> {
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self { fetcher, cleaner }
    }

    /// Board token from `boards.greenhouse.io/<token>`,
    /// `job-boards.greenhouse.io/<token>` or the embed form `...?for=<token>`.
    fn api_url(board_url: &str) -> Result<String, AppError> {
        let url = parse_board_url(board_url)?;
        let token = match url.query_pairs().find(|(k, _)| k == "for") {
            Some((_, token)) if !token.is_empty() => token.into_owned(),
            _ => board_slug(&url)?,
        };
        Ok(format!("{API_BASE}/{token}/jobs?content=true"))
    }

    fn to_raw(&self, job: GreenhouseJob) -> Result<RawPosting, AppError> {
        let mut raw = RawPosting {
            title: non_empty(job.title),
            job_url: non_empty(job.absolute_url),
            location: job.location.and_then(|l| non_empty(l.name)),
            sector: sector_from(job.departments.iter().map(|d| d.name.as_str())),
            posted_date: job
                .first_published
                .or(job.updated_at)
                .as_deref()
                .and_then(parse_date),
            ..Default::default()
        };

        let html = job.content.as_deref().map(unescape_html);
        describe(&mut raw, &self.cleaner, html.as_deref(), None)?;
        Ok(raw)
    }
}

#[async_trait]
impl<F, C> JobBoardAdapter for GreenhouseAdapter<F, C>
where
    F: Fetcher + 'static,
    C: Cleaner + 'static,
{
    fn source_type(&self) -> SourceType {
        SourceType::Greenhouse
    }

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError> {
        let api_url = Self::api_url(board_url)?;
        let board: GreenhouseBoard = fetch_json(&self.fetcher, &api_url).await?;
        tracing::debug!(board = %board_url, count = board.jobs.len(), "Greenhouse jobs fetched");
        board.jobs.into_iter().map(|job| self.to_raw(job)).collect()
    }
}

#[derive(Debug, Deserialize)]
struct GreenhouseBoard {
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    title: Option<String>,
    absolute_url: Option<String>,
    location: Option<GreenhouseLocation>,
    content: Option<String>,
    #[serde(default)]
    departments: Vec<GreenhouseDepartment>,
    first_published: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseDepartment {
    name: String,
}
