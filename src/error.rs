use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Execution log has no 'Commands finished with result:' line")]
    MissingSummaryLine,

    #[error("Malformed summary line: {0}")]
    MalformedSummaryLine(String),

    #[error("Command block {command_index} has no closing banner")]
    MissingEndBanner { command_index: usize },

    #[error("No execution log found matching: {0}")]
    ExecutionLogNotFound(PathBuf),

    #[error("No --artifacts_path=...test-results found in command: {0}")]
    MissingArtifactsPath(String),

    #[error("Malformed results file wrapper: {0}")]
    ResultsWrapper(String),

    #[error("No {table} pattern matched text: {text:?}")]
    NoPatternMatch { table: &'static str, text: String },

    #[error("Error: Got {status}")]
    Reporting { status: u16 },

    #[error("Reporting server URL is not set (use --server-url or YAMATO_REPORTING_SERVER)")]
    MissingServerUrl,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ParserError>;
