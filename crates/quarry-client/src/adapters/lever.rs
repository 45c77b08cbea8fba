use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quarry_core::adapter::JobBoardAdapter;
use quarry_core::error::AppError;
use quarry_core::models::RawPosting;
use quarry_core::source::SourceType;
use quarry_core::traits::{Cleaner, Fetcher};
use serde::Deserialize;

use super::{board_slug, describe, fetch_json, non_empty, parse_board_url, salary_range, sector_from};

const API_BASE: &str = "https://api.lever.co/v0/postings";

/// Lever boards (`https://jobs.lever.co/<company>`), read through the public
/// postings API.
#[derive(Clone)]
pub struct LeverAdapter<F, C> {
    fetcher: F,
    cleaner: C,
}

impl<F: Fetcher, C: Cleaner> LeverAdapter<F, C> {
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self { fetcher, cleaner }
    }

    fn api_url(board_url: &str) -> Result<String, AppError> {
        let slug = board_slug(&parse_board_url(board_url)?)?;
        Ok(format!("{API_BASE}/{slug}?mode=json"))
    }

    fn to_raw(&self, posting: LeverPosting) -> Result<RawPosting, AppError> {
        let mut raw = RawPosting {
            title: non_empty(posting.text),
            job_url: non_empty(posting.hosted_url),
            location: non_empty(posting.categories.location),
            sector: sector_from(
                [&posting.categories.department, &posting.categories.team]
                    .into_iter()
                    .flatten()
                    .map(String::as_str),
            ),
            salary: posting
                .salary_range
                .and_then(|r| salary_range(r.min, r.max, r.currency.as_deref())),
            skills: posting.tags,
            posted_date: posting
                .created_at
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.date_naive()),
            ..Default::default()
        };

        // Lever splits requirements etc. into titled lists next to the body.
        let mut html = posting.description.unwrap_or_default();
        for list in &posting.lists {
            html.push_str(&format!("<h3>{}</h3><ul>{}</ul>", list.text, list.content));
        }
        describe(&mut raw, &self.cleaner, Some(&html), None)?;
        Ok(raw)
    }
}

#[async_trait]
impl<F, C> JobBoardAdapter for LeverAdapter<F, C>
where
    F: Fetcher + 'static,
    C: Cleaner + 'static,
{
    fn source_type(&self) -> SourceType {
        SourceType::Lever
    }

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError> {
        let api_url = Self::api_url(board_url)?;
        let postings: Vec<LeverPosting> = fetch_json(&self.fetcher, &api_url).await?;
        tracing::debug!(board = %board_url, count = postings.len(), "Lever postings fetched");
        postings.into_iter().map(|p| self.to_raw(p)).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverPosting {
    text: Option<String>,
    hosted_url: Option<String>,
    #[serde(default)]
    categories: LeverCategories,
    description: Option<String>,
    #[serde(default)]
    lists: Vec<LeverList>,
    created_at: Option<i64>,
    salary_range: Option<LeverSalaryRange>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    location: Option<String>,
    team: Option<String>,
    department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeverList {
    #[serde(default)]
    text: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct LeverSalaryRange {
    min: f64,
    max: f64,
    currency: Option<String>,
}
