//! Matching a query against a single subject's display text.
//!
//! A query written as a `/pattern/flags` literal is matched as a regular
//! expression; anything else is a case-insensitive fuzzy match. Both matchers
//! are pure and cheap enough to call for every frame and span of a profile.

mod fuzzy;
mod query;
mod regex_match;

pub use fuzzy::{FuzzyMatch, FuzzyPattern, fuzzy_match};
pub use query::{QueryKind, classify_query};
pub use regex_match::{best_regex_match, compile_regex};

use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Errors from building a matcher. These never escape a scan: an invalid
/// query simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(String),

    #[error("Unsupported regex flag: '{0}'")]
    UnsupportedFlag(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Fuzzy,
    Regex,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Fuzzy => write!(f, "fuzzy"),
            SearchMode::Regex => write!(f, "regex"),
        }
    }
}

/// A successful match of one subject
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    /// Fuzzy score, or the matched length in regex mode
    pub score: f64,
    /// Sorted, non-overlapping character ranges to highlight
    pub ranges: Vec<Range<usize>>,
}

/// A query prepared once per scan
#[derive(Debug, Clone)]
pub enum CompiledQuery {
    Fuzzy(FuzzyPattern),
    Regex(Regex),
    /// A regex literal that failed to build
    Invalid(MatchError),
}

impl CompiledQuery {
    pub fn compile(query: &str) -> Self {
        match classify_query(query) {
            QueryKind::Fuzzy(text) => CompiledQuery::Fuzzy(FuzzyPattern::new(text)),
            QueryKind::Regex { pattern, flags } => match compile_regex(pattern, flags) {
                Ok(regex) => CompiledQuery::Regex(regex),
                Err(e) => CompiledQuery::Invalid(e),
            },
        }
    }

    pub fn mode(&self) -> SearchMode {
        match self {
            CompiledQuery::Fuzzy(_) => SearchMode::Fuzzy,
            CompiledQuery::Regex(_) | CompiledQuery::Invalid(_) => SearchMode::Regex,
        }
    }

    pub fn error(&self) -> Option<&MatchError> {
        match self {
            CompiledQuery::Invalid(e) => Some(e),
            _ => None,
        }
    }

    /// Match one subject's text
    pub fn match_text(&self, text: &str) -> Option<TextMatch> {
        match self {
            CompiledQuery::Fuzzy(pattern) => {
                let m = fuzzy_match(text, pattern)?;
                (m.score > 0.0).then_some(TextMatch {
                    score: m.score,
                    ranges: m.ranges,
                })
            }
            CompiledQuery::Regex(regex) => {
                let range = best_regex_match(text, regex)?;
                Some(TextMatch {
                    score: range.len() as f64,
                    ranges: vec![range],
                })
            }
            CompiledQuery::Invalid(_) => None,
        }
    }
}
