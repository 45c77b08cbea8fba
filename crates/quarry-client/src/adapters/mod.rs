//! Per-ATS adapters. Each one maps a board URL to the provider's public
//! JSON API and turns the response into [`RawPosting`]s.

mod ashby;
mod breezy;
mod greenhouse;
mod lever;
mod workable;

pub use ashby::AshbyAdapter;
pub use breezy::BreezyAdapter;
pub use greenhouse::GreenhouseAdapter;
pub use lever::LeverAdapter;
pub use workable::WorkableAdapter;

use chrono::{DateTime, NaiveDate};
use quarry_core::error::AppError;
use quarry_core::models::RawPosting;
use quarry_core::traits::{Cleaner, Fetcher};
use serde::de::DeserializeOwned;
use url::Url;

use crate::sections::{SHORT_DESCRIPTION_CHARS, requirement_items, summarize};
use crate::sector::sector_for;

/// Fetch `api_url` and decode the body as `T`.
///
/// A body that doesn't match the provider's shape is a parse failure, so
/// the whole source fails rather than yielding a partial list.
pub(crate) async fn fetch_json<F: Fetcher, T: DeserializeOwned>(
    fetcher: &F,
    api_url: &str,
) -> Result<T, AppError> {
    let body = fetcher.fetch(api_url).await?;
    serde_json::from_str(&body)
        .map_err(|e| AppError::ParseError(format!("Unexpected response from {api_url}: {e}")))
}

pub(crate) fn parse_board_url(board_url: &str) -> Result<Url, AppError> {
    Url::parse(board_url.trim())
        .map_err(|e| AppError::ParseError(format!("Invalid board URL '{board_url}': {e}")))
}

/// First non-empty path segment, e.g. `acme` in `https://jobs.lever.co/acme/`.
pub(crate) fn board_slug(url: &Url) -> Result<String, AppError> {
    url.path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| AppError::ParseError(format!("No board name in URL {url}")))
}

/// Resolve a possibly relative posting link against the board URL.
pub(crate) fn absolute_url(base: &Url, link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    base.join(link).ok().map(String::from)
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fill the description fields of `posting` from description HTML.
///
/// `plain` is used for the full text when the provider ships one;
/// otherwise the HTML is run through the cleaner.
pub(crate) fn describe<C: Cleaner>(
    posting: &mut RawPosting,
    cleaner: &C,
    html: Option<&str>,
    plain: Option<&str>,
) -> Result<(), AppError> {
    let full = match (plain.map(str::trim).filter(|p| !p.is_empty()), html) {
        (Some(plain), _) => Some(plain.to_string()),
        (None, Some(html)) if !html.trim().is_empty() => Some(cleaner.clean(html)?),
        _ => None,
    };

    posting.description_short = full
        .as_deref()
        .map(|text| summarize(text, SHORT_DESCRIPTION_CHARS))
        .filter(|s| !s.is_empty());
    posting.description_full = full;
    if posting.requirements.is_none() {
        posting.requirements = html.and_then(requirement_items);
    }
    Ok(())
}

/// Render a structured pay range in the same `"$<low>k - $<high>k"` shape
/// normalization infers from text. Non-USD ranges keep their currency code.
pub(crate) fn salary_range(min: f64, max: f64, currency: Option<&str>) -> Option<String> {
    if min <= 0.0 || max < min {
        return None;
    }
    let thousands = |v: f64| if v >= 1000.0 { (v / 1000.0).round() } else { v.round() };
    match currency.map(str::to_ascii_uppercase).as_deref() {
        None | Some("USD") => Some(format!("${}k - ${}k", thousands(min), thousands(max))),
        Some(code) => Some(format!("{}k - {}k {code}", thousands(min), thousands(max))),
    }
}

/// Sector from the first department name that maps to one.
pub(crate) fn sector_from<'a>(departments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    departments
        .into_iter()
        .find_map(sector_for)
        .map(str::to_string)
}
