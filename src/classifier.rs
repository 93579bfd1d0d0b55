use std::path::PathBuf;

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{ParserError, Result};
use crate::execution_log::{CommandStatus, ExecutionLog};
use crate::patterns::{Conclusion, EXECUTION_LOG_PATTERNS, NON_TEST_TAG};
use crate::results::{self, ResultsFormat};

/// Output marker for test failures the CI system already reports on its own.
pub const TESTS_FAILED_MARKER: &str = "Reason(s): One or more tests have failed.";

pub const UNKNOWN_FAILURE_SUMMARY: &str = "Unknown failure: check logs for more details.";

static ARTIFACTS_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(--artifacts_path=)(.+)(test-results)")
        .unwrap_or_else(|e| panic!("invalid artifacts path pattern: {e}"))
});

/// Payload posted to the reporting server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub summary: String,
    pub conclusion: Conclusion,
    pub tags: Vec<String>,
}

/// Where to find the secondary results file for non-test failures.
#[derive(Debug, Clone)]
pub struct ResultsLookup {
    pub format: ResultsFormat,
    pub file_name: String,
}

/// Classifies the first failed command that is not a plain test failure.
///
/// Returns `None` when every failure was a test failure or no command failed.
/// Only the first qualifying command is classified, even if several failed.
pub fn classify(log: &ExecutionLog, lookup: &ResultsLookup) -> Result<Option<Report>> {
    for (command, entry) in &log.commands {
        if entry.status == CommandStatus::Success || entry.contains(TESTS_FAILED_MARKER) {
            info!("Skipping: {command}");
            continue;
        }

        let output = entry.joined_output();
        let found = EXECUTION_LOG_PATTERNS.require_match(&output)?;
        info!("Classified failing command: {command}");

        let mut report = Report {
            title: command.clone(),
            summary: if found.entry.is_catch_all() {
                UNKNOWN_FAILURE_SUMMARY.to_string()
            } else {
                found.matched
            },
            conclusion: found.entry.conclusion,
            tags: found.entry.tags(),
        };

        if report.tags.iter().any(|tag| tag == NON_TEST_TAG) {
            let path = artifacts_test_results_path(command)?.join(&lookup.file_name);
            let secondary = results::read_failure(&path, lookup.format)?;
            report.summary.push_str(&secondary.reason);
            report.tags.extend(secondary.tags);
            report.conclusion = secondary.conclusion;
        }

        return Ok(Some(report));
    }

    info!("No failing command left to classify");
    Ok(None)
}

/// Extracts `<path>test-results` from a `--artifacts_path=<path>test-results` argument.
pub fn artifacts_test_results_path(command: &str) -> Result<PathBuf> {
    let caps = ARTIFACTS_PATH
        .captures(command)
        .ok_or_else(|| ParserError::MissingArtifactsPath(command.to_string()))?;
    Ok(PathBuf::from(format!("{}{}", &caps[2], &caps[3])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution_log::tests::{build_log, command_block, FAILED_SUMMARY};
    use crate::patterns::UNKNOWN_TAG;
    use std::fs;

    const NON_TEST_REASON: &str =
        "Reason(s): One or more non-test related errors or failures occurred.";
    const TIMEOUT: &str = "System.TimeoutException: Timeout while waiting for a first message";

    fn hoarder_lookup() -> ResultsLookup {
        ResultsLookup {
            format: ResultsFormat::Hoarder,
            file_name: "HoarderData.json".to_string(),
        }
    }

    fn classify_text(log: &str) -> Result<Option<Report>> {
        let parsed = ExecutionLog::parse(log)?;
        classify(&parsed, &hoarder_lookup())
    }

    #[test]
    fn test_command_not_found() {
        let log = build_log(
            &[command_block("./build.sh", &["bash: ./tool: command not found"], true)],
            FAILED_SUMMARY,
        );
        let report = classify_text(&log).unwrap().unwrap();
        assert_eq!(report.title, "./build.sh");
        assert_eq!(report.summary, "command not found");
        assert_eq!(report.conclusion, Conclusion::Failure);
        assert_eq!(report.tags, vec!["failure"]);
    }

    #[test]
    fn test_crlf_log_title_has_no_carriage_return() {
        let log = build_log(
            &[command_block("./build.sh", &["bash: x: command not found"], true)],
            FAILED_SUMMARY,
        )
        .replace('\n', "\r\n");

        let report = classify_text(&log).unwrap().unwrap();
        assert_eq!(report.title, "./build.sh");
        assert_eq!(report.summary, "command not found");
        assert_eq!(report.tags, vec!["failure"]);
    }

    #[test]
    fn test_instability_is_inconclusive() {
        let log = build_log(
            &[command_block(
                "scp build.zip agent:",
                &["packet_write_poll: Connection to 10.1.2.3 port 22: Operation not permitted"],
                true,
            )],
            FAILED_SUMMARY,
        );
        let report = classify_text(&log).unwrap().unwrap();
        assert_eq!(report.conclusion, Conclusion::Inconclusive);
        assert_eq!(report.tags, vec!["instability"]);
    }

    #[test]
    fn test_unmatched_output_falls_back_to_unknown() {
        let log = build_log(
            &[command_block("make", &["segmentation fault"], true)],
            FAILED_SUMMARY,
        );
        let report = classify_text(&log).unwrap().unwrap();
        assert_eq!(report.summary, UNKNOWN_FAILURE_SUMMARY);
        assert_eq!(report.tags, vec![UNKNOWN_TAG]);
        assert_eq!(report.conclusion, Conclusion::Failure);
    }

    #[test]
    fn test_test_failures_are_skipped() {
        let log = build_log(
            &[command_block("utr --suite=playmode", &[TESTS_FAILED_MARKER], true)],
            FAILED_SUMMARY,
        );
        assert!(classify_text(&log).unwrap().is_none());
    }

    #[test]
    fn test_all_commands_succeeded() {
        let log = build_log(&[command_block("echo hi", &["hi"], false)], FAILED_SUMMARY);
        assert!(classify_text(&log).unwrap().is_none());
    }

    #[test]
    fn test_only_first_failure_is_reported() {
        let log = build_log(
            &[
                command_block("echo ok", &["ok"], false),
                command_block("utr --suite=editmode", &[TESTS_FAILED_MARKER], true),
                command_block("first", &["x: command not found"], true),
                command_block("second", &["weird"], true),
            ],
            FAILED_SUMMARY,
        );
        let report = classify_text(&log).unwrap().unwrap();
        assert_eq!(report.title, "first");
    }

    #[test]
    fn test_non_test_failure_merges_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let results_dir = dir.path().join("test-results");
        fs::create_dir_all(&results_dir).unwrap();
        fs::write(
            results_dir.join("HoarderData.json"),
            format!(r#"{{"suites": [{{"failureReasons": ["{TIMEOUT}"]}}]}}"#),
        )
        .unwrap();

        let command = format!(
            "utr --suite=playmode --artifacts_path={}/test-results --timeout=3600",
            dir.path().display()
        );
        let log = build_log(&[command_block(&command, &[NON_TEST_REASON], true)], FAILED_SUMMARY);

        let report = classify_text(&log).unwrap().unwrap();
        assert_eq!(report.title, command);
        assert_eq!(report.tags, vec![NON_TEST_TAG, "System.TimeoutException"]);
        assert_eq!(report.conclusion, Conclusion::Failure);
        assert_eq!(report.summary, format!("{NON_TEST_REASON}{TIMEOUT}"));
    }

    #[test]
    fn test_non_test_failure_with_results_log_format() {
        let dir = tempfile::tempdir().unwrap();
        let results_dir = dir.path().join("test-results");
        fs::create_dir_all(&results_dir).unwrap();
        fs::write(
            results_dir.join("TestResults.json"),
            "var results = [\n{\"errors\": []},\n{\"errors\": [\"Editor crashed\"]}\n];\n",
        )
        .unwrap();

        let command = format!("utr --artifacts_path={}/test-results", dir.path().display());
        let log = build_log(&[command_block(&command, &[NON_TEST_REASON], true)], FAILED_SUMMARY);
        let parsed = ExecutionLog::parse(&log).unwrap();
        let lookup = ResultsLookup {
            format: ResultsFormat::ResultsLog,
            file_name: "TestResults.json".to_string(),
        };

        let report = classify(&parsed, &lookup).unwrap().unwrap();
        assert_eq!(report.tags, vec![NON_TEST_TAG, UNKNOWN_TAG]);
        assert!(report.summary.ends_with("Editor crashed"));
    }

    #[test]
    fn test_non_test_failure_without_results_file() {
        let log = build_log(
            &[command_block(
                "utr --artifacts_path=/nonexistent/test-results",
                &[NON_TEST_REASON],
                true,
            )],
            FAILED_SUMMARY,
        );
        assert!(matches!(classify_text(&log), Err(ParserError::Io(_))));
    }

    #[test]
    fn test_non_test_failure_without_artifacts_path() {
        let log = build_log(&[command_block("utr", &[NON_TEST_REASON], true)], FAILED_SUMMARY);
        assert!(matches!(
            classify_text(&log),
            Err(ParserError::MissingArtifactsPath(_))
        ));
    }

    #[test]
    fn test_artifacts_path_extraction() {
        let path =
            artifacts_test_results_path("utr --artifacts_path=build/test-results --suite=editor")
                .unwrap();
        assert_eq!(path, PathBuf::from("build/test-results"));
    }

    #[test]
    fn test_classification_is_repeatable() {
        let log = build_log(
            &[command_block("./build.sh", &["bash: x: command not found"], true)],
            FAILED_SUMMARY,
        );
        let first = serde_json::to_string(&classify_text(&log).unwrap()).unwrap();
        let second = serde_json::to_string(&classify_text(&log).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
