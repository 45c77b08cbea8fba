use async_trait::async_trait;
use quarry_core::adapter::JobBoardAdapter;
use quarry_core::error::AppError;
use quarry_core::models::RawPosting;
use quarry_core::source::SourceType;
use quarry_core::traits::{Cleaner, Fetcher};
use serde::Deserialize;

use super::{board_slug, describe, fetch_json, non_empty, parse_board_url, parse_date, sector_from};

const API_BASE: &str = "https://apply.workable.com/api/v1/widget/accounts";

/// Workable careers pages (`https://apply.workable.com/<account>`), read
/// through the embeddable widget API.
#[derive(Clone)]
pub struct WorkableAdapter<F, C> {
    fetcher: F,
    cleaner: C,
}

impl<F: Fetcher, C: Cleaner> WorkableAdapter<F, C> {
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self { fetcher, cleaner }
    }

    fn api_url(board_url: &str) -> Result<String, AppError> {
        let url = parse_board_url(board_url)?;
        // Legacy `<account>.workable.com` pages carry the account in the host.
        let account = match url.host_str().and_then(|h| h.strip_suffix(".workable.com")) {
            Some(sub) if sub != "apply" && sub != "www" => sub.to_string(),
            _ => board_slug(&url)?,
        };
        Ok(format!("{API_BASE}/{account}?details=true"))
    }

    fn to_raw(&self, job: WorkableJob) -> Result<RawPosting, AppError> {
        let place: Vec<String> = [job.city, job.state, job.country]
            .into_iter()
            .filter_map(non_empty)
            .collect();
        let location = match (place.is_empty(), job.telecommuting) {
            (false, _) => Some(place.join(", ")),
            (true, Some(true)) => Some("Remote".to_string()),
            (true, _) => None,
        };

        let mut raw = RawPosting {
            title: non_empty(job.title),
            job_url: non_empty(job.url).or_else(|| non_empty(job.shortlink)),
            location,
            sector: sector_from(
                [&job.department, &job.function]
                    .into_iter()
                    .flatten()
                    .map(String::as_str),
            ),
            posted_date: job
                .published_on
                .or(job.created_at)
                .as_deref()
                .and_then(parse_date),
            ..Default::default()
        };

        describe(&mut raw, &self.cleaner, job.description.as_deref(), None)?;
        Ok(raw)
    }
}

#[async_trait]
impl<F, C> JobBoardAdapter for WorkableAdapter<F, C>
where
    F: Fetcher + 'static,
    C: Cleaner + 'static,
{
    fn source_type(&self) -> SourceType {
        SourceType::Workable
    }

    async fn fetch(&self, board_url: &str) -> Result<Vec<RawPosting>, AppError> {
        let api_url = Self::api_url(board_url)?;
        let account: WorkableAccount = fetch_json(&self.fetcher, &api_url).await?;
        tracing::debug!(board = %board_url, count = account.jobs.len(), "Workable jobs fetched");
        account.jobs.into_iter().map(|job| self.to_raw(job)).collect()
    }
}

#[derive(Debug, Deserialize)]
struct WorkableAccount {
    jobs: Vec<WorkableJob>,
}

#[derive(Debug, Deserialize)]
struct WorkableJob {
    title: Option<String>,
    url: Option<String>,
    shortlink: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    telecommuting: Option<bool>,
    department: Option<String>,
    function: Option<String>,
    published_on: Option<String>,
    created_at: Option<String>,
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use quarry_core::testutil::MockFetcher;

    use super::*;
    use crate::cleaner::HtmdCleaner;

    type Adapter = WorkableAdapter<MockFetcher, HtmdCleaner>;

    const ACCOUNT: &str = r#"{
        "name": "Acme",
        "description": null,
        "jobs": [
            {
                "title": "Operations Lead",
                "shortcode": "A1B2C3",
                "employment_type": "Full-time",
                "telecommuting": false,
                "department": "Operations",
                "url": "https://apply.workable.com/j/A1B2C3",
                "shortlink": "https://apply.workable.com/j/A1B2C3",
                "published_on": "2024-01-15",
                "created_at": "2024-01-12",
                "country": "Portugal",
                "city": "Lisbon",
                "state": "",
                "description": "<p>Run the floor. Salary 45k - 60k.</p><p><strong>Requirements</strong></p><ul><li>Excel</li><li>Portuguese</li></ul>"
            },
            {
                "title": "Remote Analyst",
                "shortlink": "https://apply.workable.com/j/D4E5F6",
                "telecommuting": true,
                "function": "Finance"
            }
        ]
    }"#;

    #[test]
    fn api_url_variants() {
        assert_eq!(
            Adapter::api_url("https://apply.workable.com/acme/").unwrap(),
            "https://apply.workable.com/api/v1/widget/accounts/acme?details=true"
        );
        assert_eq!(
            Adapter::api_url("https://acme.workable.com").unwrap(),
            "https://apply.workable.com/api/v1/widget/accounts/acme?details=true"
        );
    }

    #[tokio::test]
    async fn parses_jobs() {
        let adapter = WorkableAdapter::new(MockFetcher::new(ACCOUNT), HtmdCleaner::new());
        let postings = adapter.fetch("https://apply.workable.com/acme").await.unwrap();

        assert_eq!(postings.len(), 2);
        let first = &postings[0];
        assert_eq!(first.location.as_deref(), Some("Lisbon, Portugal"));
        assert_eq!(first.sector.as_deref(), Some("operations"));
        assert_eq!(first.requirements.as_deref(), Some("Excel\nPortuguese"));
        assert_eq!(first.posted_date, NaiveDate::from_ymd_opt(2024, 1, 15));

        let second = &postings[1];
        assert_eq!(
            second.job_url.as_deref(),
            Some("https://apply.workable.com/j/D4E5F6")
        );
        assert_eq!(second.location.as_deref(), Some("Remote"));
        assert_eq!(second.sector.as_deref(), Some("operations"));
        assert_eq!(second.posted_date, None);
    }
}
