use async_trait::async_trait;
use quarry_core::adapter::JobBoardAdapter;
use quarry_core::error::AppError;
use quarry_core::models::RawPosting;
use quarry_core::source::SourceType;
use quarry_core::traits::{Cleaner, Fetcher};
use serde::Deserialize;
use url::Url;

use super::{absolute_url, describe, fetch_json, non_empty, parse_board_url, parse_date, sector_from};

/// Breezy HR portals (`https://<company>.breezy.hr`). The portal serves its
/// listing as JSON at `/json`; descriptions are not included.
#[derive(Clone)]
pub struct BreezyAdapter<F, C> {
    fetcher: F,
    cleaner: C,
}

impl<F: Fetcher, C: Cleaner> BreezyAdapter<F, C> {
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self { fetcher, cleaner }
    }

    fn portal(board_url: &str) -> Result<Url, AppError> {
        let url = parse_board_url(board_url)?;
        let host = url.host_str().unwrap_or_default();
        if !host.ends_with(".breezy.hr") {
            return Err(AppError::ParseError(format!(
                "Breezy board must be a <company>.breezy.hr portal, got {board_url}"
            )));
        }
        parse_board_url(&format!("{}://{host}/", url.scheme()))
    }

    fn to_raw(&self, portal: &Url, job: BreezyJob) -> Result<RawPosting, AppError> {
        let location = job.location.and_then(|l| match (non_empty(l.name), l.is_remote) {
            (Some(name), _) => Some(name),
            (None, Some(true)) => Some("Remote".to_string()),
            (None, _) => None,
        });

        let mut raw = RawPosting {
            title: non_empty(job.name),
            job_url: job.url.as_deref().and_then(|link| absolute_url(portal, link)),
            location,
            salary: non_empty(job.salary),
            sector: sector_from(job.department.as_deref()),
            posted_date: job.published_date.as_deref().and_then(parse_date),
            ..Default::default()
        };

        describe(&mut raw, &self.cleaner, job.description.as_deref(), None)?;
        Ok(raw)
    }
}

#[async_trait]
impl<F, C> JobBoardAdapter for BreezyAdapter<F, C>
where
    F: Fetcher + 'static,
    C: Cleaner + 'static,
{
    fn source_type(&self) -> SourceType {
        SourceType::Breezy
    }

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError> {
        let portal = Self::portal(board_url)?;
        let api_url = format!("{portal}json");
        let jobs: Vec<BreezyJob> = fetch_json(&self.fetcher, &api_url).await?;
        tracing::debug!(board = %board_url, count = jobs.len(), "Breezy positions fetched");
        jobs.into_iter().map(|job| self.to_raw(&portal, job)).collect()
    }
}

#[derive(Debug, Deserialize)]
struct BreezyJob {
    name: Option<String>,
    url: Option<String>,
    published_date: Option<String>,
    location: Option<BreezyLocation>,
    department: Option<String>,
    salary: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BreezyLocation {
    name: Option<String>,
    is_remote: Option<bool>,
}
