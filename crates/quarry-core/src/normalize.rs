//! Raw posting → canonical job record.
//!
//! Normalization is a pure transformation: it computes the identity hash,
//! infers compensation from free text when the adapter did not supply any,
//! and fills defaults for the optional fields.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::AppError;
use crate::models::{NewJobRecord, RawPosting, Source, compute_identity_hash};
use crate::source::SourceType;

pub const DEFAULT_LOCATION: &str = "Remote";
pub const DEFAULT_SECTOR: &str = "other";

/// Compensation patterns, tried in this exact order. The first one that
/// matches anywhere in the text wins; changing the order changes output on
/// ambiguous text.
static COMPENSATION_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        // $150,000 - $220,000 / $150,000.00 to $220,000.00k
        r"(?i)\$\s*([0-9]{1,3}(?:,[0-9]{3})*(?:\.[0-9]{2})?)\s*(?:-|to)\s*\$?\s*([0-9]{1,3}(?:,[0-9]{3})*(?:\.[0-9]{2})?)\s*k?",
        // $150k - $220k
        r"(?i)\$\s*([0-9]{1,3})\s*k\s*(?:-|to)\s*\$?\s*([0-9]{1,3})\s*k",
        // 150k - 220k
        r"(?i)([0-9]{1,3})\s*k\s*(?:-|to)\s*([0-9]{1,3})\s*k",
        // $150,000 - $220,000 without a trailing unit
        r"(?i)\$\s*([0-9]{1,3}(?:,[0-9]{3})*)\s*(?:-|to)\s*\$?\s*([0-9]{1,3}(?:,[0-9]{3})*)",
    ]
    .map(|pattern| Regex::new(pattern).expect("valid compensation pattern"))
});

/// Identity hash of a posting URL. Deterministic and total.
pub fn stable_hash(job_url: &str) -> String {
    compute_identity_hash(job_url)
}

/// Infer a `"$<low>k - $<high>k"` salary range from free text.
///
/// The first pattern that matches decides the result. Returns `None` when no
/// pattern matches.
pub fn infer_compensation(text: &str) -> Option<String> {
    let caps = COMPENSATION_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))?;
    let low = to_thousands(caps.get(1)?.as_str());
    let high = to_thousands(caps.get(2)?.as_str());
    Some(format!("${low}k - ${high}k"))
}

/// Values with more than three integer digits are whole amounts and are
/// divided by 1000; shorter values are taken to be in thousands already.
/// Each value is converted on its own. Amounts beyond `u64` saturate.
fn to_thousands(raw: &str) -> u64 {
    let digits: String = raw
        .split('.')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    if digits.len() > 3 { value / 1000 } else { value }
}

/// Treat empty and whitespace-only strings as absent.
fn present(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Convert a raw posting into a canonical record.
///
/// Fails with [`AppError::MissingField`] when `job_url` or `title` is absent.
/// All other fields fall back to defaults.
pub fn normalize(
    raw: RawPosting,
    source: &Source,
    source_type: SourceType,
    scraped_at: DateTime<Utc>,
) -> Result<NewJobRecord, AppError> {
    let job_url = present(raw.job_url).ok_or(AppError::MissingField { field: "job_url" })?;
    let title = present(raw.title).ok_or(AppError::MissingField { field: "title" })?;

    let description_short = present(raw.description_short);
    let description_full = present(raw.description_full);

    let salary = present(raw.salary).or_else(|| {
        let body = description_full
            .as_deref()
            .or(description_short.as_deref())
            .unwrap_or_default();
        infer_compensation(&format!("{title} {body}"))
    });

    let skills = raw
        .skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(NewJobRecord {
        identity_hash: stable_hash(&job_url),
        title,
        source_id: source.id,
        source_name: source.name.clone(),
        location: present(raw.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        salary,
        sector: present(raw.sector).unwrap_or_else(|| DEFAULT_SECTOR.to_string()),
        description_short: description_short.unwrap_or_default(),
        description_full: description_full.unwrap_or_default(),
        requirements: present(raw.requirements).unwrap_or_default(),
        skills,
        job_url,
        source_type,
        posted_date: raw.posted_date.unwrap_or_else(|| scraped_at.date_naive()),
        scraped_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::testutil::make_source;

    fn scraped_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn infers_full_dollar_range() {
        assert_eq!(
            infer_compensation("Senior Engineer $150,000 - $220,000").as_deref(),
            Some("$150k - $220k")
        );
    }

    #[test]
    fn infers_bare_k_range() {
        assert_eq!(
            infer_compensation("pay: 80k-120k").as_deref(),
            Some("$80k - $120k")
        );
    }

    #[test]
    fn infers_dollar_k_shorthand() {
        assert_eq!(
            infer_compensation("Comp: $90K to $110K plus equity").as_deref(),
            Some("$90k - $110k")
        );
    }

    #[test]
    fn infers_range_with_cents() {
        assert_eq!(
            infer_compensation("Base $120,000.00 - $140,000.00").as_deref(),
            Some("$120k - $140k")
        );
    }

    #[test]
    fn infers_to_separator() {
        assert_eq!(
            infer_compensation("$95,000 to $130,000 annually").as_deref(),
            Some("$95k - $130k")
        );
    }

    #[test]
    fn no_numeric_range_yields_none() {
        assert_eq!(infer_compensation("Competitive salary and benefits"), None);
        assert_eq!(infer_compensation("Founded in 2019, 50 people"), None);
        assert_eq!(infer_compensation(""), None);
    }

    #[test]
    fn pattern_priority_is_fixed() {
        // A bare "k" range appears earlier in the text than the dollar range,
        // but the dollar-range pattern is tried first and wins.
        let text = "Team of 10k-20k users. Salary $100,000 - $150,000";
        assert_eq!(infer_compensation(text).as_deref(), Some("$100k - $150k"));
    }

    #[test]
    fn short_values_are_thousands() {
        assert_eq!(
            infer_compensation("$120 - $160 (in thousands)").as_deref(),
            Some("$120k - $160k")
        );
    }

    #[test]
    fn mixed_magnitudes_convert_per_value() {
        assert_eq!(
            infer_compensation("Base $90 - $120,000").as_deref(),
            Some("$90k - $120k")
        );
        assert_eq!(
            infer_compensation("$95,000 - $130 DOE").as_deref(),
            Some("$95k - $130k")
        );
    }

    #[test]
    fn oversized_amounts_saturate_instead_of_skipping_pattern() {
        let text = "$99,999,999,999,999,999,999 - $99,999,999,999,999,999,999";
        let expected = format!("${0}k - ${0}k", u64::MAX / 1000);
        assert_eq!(infer_compensation(text), Some(expected));
    }

    #[test]
    fn stable_hash_is_deterministic() {
        let url = "https://jobs.lever.co/crypto/abc";
        assert_eq!(stable_hash(url), stable_hash(url));
        assert_ne!(stable_hash(url), stable_hash("https://jobs.lever.co/crypto/abd"));
    }

    #[test]
    fn normalize_fills_defaults() {
        let source = make_source("Crypto.com", "https://jobs.lever.co/crypto");
        let raw = RawPosting::new("Backend Engineer", "https://jobs.lever.co/crypto/1");

        let record = normalize(raw, &source, SourceType::Lever, scraped_at()).unwrap();

        assert_eq!(record.identity_hash, stable_hash("https://jobs.lever.co/crypto/1"));
        assert_eq!(record.location, "Remote");
        assert_eq!(record.sector, "other");
        assert_eq!(record.salary, None);
        assert_eq!(record.source_type, SourceType::Lever);
        assert_eq!(record.source_id, source.id);
        assert_eq!(record.source_name, "Crypto.com");
        assert_eq!(record.posted_date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(record.scraped_at, scraped_at());
        assert!(record.description_full.is_empty());
    }

    #[test]
    fn normalize_keeps_supplied_values() {
        let source = make_source("Fireblocks", "https://boards.greenhouse.io/fireblocks");
        let raw = RawPosting {
            location: Some("Tel Aviv".into()),
            salary: Some("$200k - $250k".into()),
            sector: Some("engineering".into()),
            posted_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            skills: vec!["Rust".into(), " Go ".into(), "Rust".into(), "".into()],
            description_full: Some("Pays $1 - $2".into()),
            ..RawPosting::new("Engineer", "https://boards.greenhouse.io/fireblocks/jobs/9")
        };

        let record = normalize(raw, &source, SourceType::Greenhouse, scraped_at()).unwrap();

        assert_eq!(record.location, "Tel Aviv");
        assert_eq!(record.salary.as_deref(), Some("$200k - $250k"));
        assert_eq!(record.sector, "engineering");
        assert_eq!(record.posted_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(
            record.skills.into_iter().collect::<Vec<_>>(),
            vec!["Go".to_string(), "Rust".to_string()]
        );
    }

    #[test]
    fn normalize_infers_salary_from_title_and_description() {
        let source = make_source("Chainalysis", "https://jobs.ashbyhq.com/chainalysis");
        let raw = RawPosting {
            description_full: Some("The range for this role is $140,000 - $180,000.".into()),
            ..RawPosting::new("Data Engineer", "https://jobs.ashbyhq.com/chainalysis/1")
        };

        let record = normalize(raw, &source, SourceType::Ashby, scraped_at()).unwrap();
        assert_eq!(record.salary.as_deref(), Some("$140k - $180k"));
    }

    #[test]
    fn normalize_falls_back_to_short_description_for_inference() {
        let source = make_source("Zero Hash", "https://zero-hash.breezy.hr/");
        let raw = RawPosting {
            description_short: Some("Salary 90k-110k".into()),
            ..RawPosting::new("Analyst", "https://zero-hash.breezy.hr/p/1")
        };

        let record = normalize(raw, &source, SourceType::Breezy, scraped_at()).unwrap();
        assert_eq!(record.salary.as_deref(), Some("$90k - $110k"));
    }

    #[test]
    fn blank_salary_counts_as_missing() {
        let source = make_source("Acme", "https://jobs.lever.co/acme");
        let raw = RawPosting {
            salary: Some("   ".into()),
            ..RawPosting::new("Engineer $100k - $120k", "https://jobs.lever.co/acme/1")
        };

        let record = normalize(raw, &source, SourceType::Lever, scraped_at()).unwrap();
        assert_eq!(record.salary.as_deref(), Some("$100k - $120k"));
    }

    #[test]
    fn missing_job_url_is_rejected() {
        let source = make_source("Acme", "https://jobs.lever.co/acme");
        let raw = RawPosting {
            title: Some("Engineer".into()),
            ..Default::default()
        };

        let err = normalize(raw, &source, SourceType::Lever, scraped_at()).unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "job_url" }));
    }

    #[test]
    fn missing_title_is_rejected() {
        let source = make_source("Acme", "https://jobs.lever.co/acme");
        let raw = RawPosting {
            title: Some("  ".into()),
            job_url: Some("https://jobs.lever.co/acme/1".into()),
            ..Default::default()
        };

        let err = normalize(raw, &source, SourceType::Lever, scraped_at()).unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "title" }));
    }
}
