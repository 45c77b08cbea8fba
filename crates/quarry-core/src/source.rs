//! ATS family detection for job-board sources.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Source;

/// The hosted ATS families Quarry knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Lever,
    Greenhouse,
    Ashby,
    Breezy,
    Workable,
}

/// URL patterns in match priority order. First match wins.
static BOARD_PATTERNS: LazyLock<Vec<(SourceType, Regex)>> = LazyLock::new(|| {
    [
        (SourceType::Lever, r"(?i)jobs\.lever\.co"),
        (SourceType::Greenhouse, r"(?i)greenhouse\.io"),
        (SourceType::Ashby, r"(?i)ashbyhq\.com"),
        (SourceType::Breezy, r"(?i)breezy\.hr"),
        (SourceType::Workable, r"(?i)workable\.com"),
    ]
    .into_iter()
    .map(|(ty, pattern)| (ty, Regex::new(pattern).expect("valid board pattern")))
    .collect()
});

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        SourceType::Lever,
        SourceType::Greenhouse,
        SourceType::Ashby,
        SourceType::Breezy,
        SourceType::Workable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Lever => "lever",
            SourceType::Greenhouse => "greenhouse",
            SourceType::Ashby => "ashby",
            SourceType::Breezy => "breezy",
            SourceType::Workable => "workable",
        }
    }

    /// Detect the ATS family from a job-board URL.
    ///
    /// Returns `None` when no known pattern matches.
    pub fn detect(board_url: &str) -> Option<SourceType> {
        BOARD_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(board_url))
            .map(|(ty, _)| *ty)
    }

    /// Classify a source. A declared type is authoritative; otherwise the
    /// board URL is matched against the known patterns.
    ///
    /// `None` means unknown. Callers skip the source rather than aborting.
    pub fn classify(source: &Source) -> Option<SourceType> {
        source
            .declared_type
            .or_else(|| Self::detect(&source.board_url))
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lever" => Ok(SourceType::Lever),
            "greenhouse" => Ok(SourceType::Greenhouse),
            "ashby" => Ok(SourceType::Ashby),
            "breezy" => Ok(SourceType::Breezy),
            "workable" => Ok(SourceType::Workable),
            _ => Err(format!("Unknown ATS type: {}", s)),
        }
    }
}
