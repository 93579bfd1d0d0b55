//! Ordered failure signature tables.
//!
//! Each table is matched first-match-wins in declared order, so more specific
//! signatures must come before broader ones. Both tables end with a catch-all
//! entry tagged `unknown` that matches any non-empty text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ParserError, Result};

/// Tag carried by the catch-all entry of every table.
pub const UNKNOWN_TAG: &str = "unknown";

/// Tag that triggers the secondary results lookup.
pub const NON_TEST_TAG: &str = "non-test";

/// Classification outcome posted to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Inconclusive,
}

/// A single failure signature.
#[derive(Debug)]
pub struct PatternEntry {
    pub regex: Regex,
    pub tags: &'static [&'static str],
    pub conclusion: Conclusion,
}

impl PatternEntry {
    fn new(pattern: &str, tags: &'static [&'static str], conclusion: Conclusion) -> Self {
        Self {
            // Table sources are literals checked by the tests below.
            regex: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {pattern}: {e}")),
            tags,
            conclusion,
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| (*t).to_string()).collect()
    }

    pub fn is_catch_all(&self) -> bool {
        self.tags.first() == Some(&UNKNOWN_TAG)
    }
}

/// Named, ordered list of pattern entries.
pub struct PatternTable {
    pub name: &'static str,
    pub entries: Vec<PatternEntry>,
}

/// Result of matching a table against a text blob.
#[derive(Debug, Clone)]
pub struct PatternMatch<'a> {
    pub entry: &'a PatternEntry,
    pub matched: String,
}

impl PatternTable {
    /// Returns the first entry whose regex finds a match, with the matched substring.
    pub fn find_match(&self, text: &str) -> Option<PatternMatch<'_>> {
        self.entries.iter().find_map(|entry| {
            entry.regex.find(text).map(|m| PatternMatch {
                entry,
                matched: m.as_str().to_string(),
            })
        })
    }

    /// Like [`find_match`](Self::find_match), but a miss is an error.
    ///
    /// Only empty text (or text made solely of line breaks) can miss, because
    /// the last entry matches anything else.
    pub fn require_match(&self, text: &str) -> Result<PatternMatch<'_>> {
        let found = self.find_match(text).ok_or_else(|| ParserError::NoPatternMatch {
            table: self.name,
            text: text.to_string(),
        })?;
        log::info!(
            "Found {} failure match for pattern: {}",
            self.name,
            found.entry.regex.as_str()
        );
        Ok(found)
    }

    pub fn ends_with_catch_all(&self) -> bool {
        self.entries.last().is_some_and(|entry| {
            entry.is_catch_all() && entry.regex.is_match("x") && !entry.regex.is_match("")
        })
    }
}

/// Signatures matched against a failing command's output.
pub static EXECUTION_LOG_PATTERNS: Lazy<PatternTable> = Lazy::new(|| PatternTable {
    name: "execution log",
    entries: vec![
        PatternEntry::new(
            r"(packet_write_poll: Connection to)(.+)(Operation not permitted)",
            &["instability"],
            Conclusion::Inconclusive,
        ),
        // Already reported by the CI system; commands carrying this are skipped.
        PatternEntry::new(
            r"Reason\(s\): One or more tests have failed.",
            &["tests"],
            Conclusion::Failure,
        ),
        PatternEntry::new(
            r"Reason\(s\): One or more non-test related errors or failures occurred.",
            &[NON_TEST_TAG],
            Conclusion::Failure,
        ),
        PatternEntry::new(r"(command not found)", &["failure"], Conclusion::Failure),
        // Must stay last.
        PatternEntry::new(r".+", &[UNKNOWN_TAG], Conclusion::Failure),
    ],
});

/// Signatures matched against failure reasons read from the test results file.
pub static SECONDARY_PATTERNS: Lazy<PatternTable> = Lazy::new(|| PatternTable {
    name: "test results",
    entries: vec![
        PatternEntry::new(
            r"System.TimeoutException: Timeout while waiting for a first message",
            &["System.TimeoutException"],
            Conclusion::Failure,
        ),
        // Must stay last.
        PatternEntry::new(r".+", &[UNKNOWN_TAG], Conclusion::Failure),
    ],
});
