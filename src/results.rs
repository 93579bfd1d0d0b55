//! Readers for the test runner's results files under `<artifacts>/test-results`.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{ParserError, Result};
use crate::patterns::{Conclusion, SECONDARY_PATTERNS};

/// Which results file layout to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResultsFormat {
    /// JSON document with a `suites[0].failureReasons` list.
    #[default]
    Hoarder,
    /// JS-assignment-wrapped JSON array whose last record has an `errors` list.
    ResultsLog,
}

/// Failure reason pulled from a results file, with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryFailure {
    pub reason: String,
    pub tags: Vec<String>,
    pub conclusion: Conclusion,
}

#[derive(Debug, Default, Deserialize)]
struct HoarderData {
    #[serde(default)]
    suites: Vec<Suite>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suite {
    failure_reasons: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultRecord {
    errors: Option<Vec<String>>,
}

/// Reads `path` in the given layout and classifies its failure reason.
pub fn read_failure(path: &Path, format: ResultsFormat) -> Result<SecondaryFailure> {
    info!("Reading test results: {}", path.display());
    let text = fs::read_to_string(path)?;
    let reason = match format {
        ResultsFormat::Hoarder => hoarder_failure_reason(&text)?,
        ResultsFormat::ResultsLog => results_log_failure_reason(&text)?,
    };
    classify_reason(reason)
}

fn classify_reason(reason: String) -> Result<SecondaryFailure> {
    let found = SECONDARY_PATTERNS.require_match(&reason)?;
    Ok(SecondaryFailure {
        tags: found.entry.tags(),
        conclusion: found.entry.conclusion,
        reason,
    })
}

fn join_or_empty(reasons: Option<Vec<String>>) -> String {
    reasons.unwrap_or_else(|| vec![String::new()]).join(" ")
}

/// Joins `suites[0].failureReasons` with spaces.
pub fn hoarder_failure_reason(text: &str) -> Result<String> {
    let data: HoarderData = serde_json::from_str(text)?;
    let suite = data.suites.into_iter().next().unwrap_or_default();
    Ok(join_or_empty(suite.failure_reasons))
}

/// Joins the `errors` of the last record with spaces.
pub fn results_log_failure_reason(text: &str) -> Result<String> {
    let body = strip_js_assignment(text)?;
    let records: Vec<ResultRecord> = serde_json::from_str(body)?;
    debug!("Results log has {} records", records.len());
    let last = records.into_iter().last().unwrap_or_default();
    Ok(join_or_empty(last.errors))
}

/// Strips `var name =` from the first line and the closing `;` from the last.
///
/// The results log is written as a JS statement, e.g.
/// `var results = [ ... ];`, so the JSON body sits between the first `=` of
/// the first line and the trailing semicolon.
pub fn strip_js_assignment(text: &str) -> Result<&str> {
    let first_line_end = text.find('\n').unwrap_or(text.len());
    let eq = text[..first_line_end].find('=').ok_or_else(|| {
        ParserError::ResultsWrapper(format!(
            "no assignment on first line: {:?}",
            &text[..first_line_end]
        ))
    })?;

    text[eq + 1..]
        .trim_end()
        .strip_suffix(';')
        .map(str::trim)
        .ok_or_else(|| ParserError::ResultsWrapper("missing trailing ';'".to_string()))
}
