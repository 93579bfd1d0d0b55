//! Execution log discovery and segmentation.
//!
//! The CI runner writes every command as a block:
//!
//! ```text
//! <start banner>
//! <echoed command, one or more lines>
//! <end banner>
//! <output lines...>
//! <one footer line>
//! <start banner of the next command>
//! ```
//!
//! The block offsets (output starts three lines after the start banner and
//! stops one line before the next one) are fixed by the runner's format.

use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;
use indexmap::IndexMap;
use log::{debug, info};

use crate::error::{ParserError, Result};

pub const START_BANNER: &str =
    "################################### Running next command ###################################";
pub const END_BANNER: &str =
    "############################################################################################";

const SUMMARY_MARKER: &str = "Commands finished with result:";
const COMMAND_FAILED_MARKER: &str = "Command failed";
const OUTPUT_OFFSET: usize = 3;
const FOOTER_LINES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failed,
}

/// Output and outcome of one executed command.
#[derive(Debug, Clone)]
pub struct CommandLog {
    pub output: Vec<String>,
    pub status: CommandStatus,
}

impl CommandLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.output.iter().any(|line| line.contains(needle))
    }

    pub fn joined_output(&self) -> String {
        self.output.join("\n")
    }
}

/// A segmented execution log.
#[derive(Debug, Clone)]
pub struct ExecutionLog {
    /// Commands keyed by their echoed text, in first-seen order. A repeated
    /// command line replaces the earlier record.
    pub commands: IndexMap<String, CommandLog>,
    /// Status phrase from the summary line, e.g. `Success` or `Failed (exit code 1)`.
    pub overall_status: String,
}

impl ExecutionLog {
    pub fn read(path: &Path) -> Result<Self> {
        info!("Reading log: {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        // `lines` strips both `\n` and `\r\n`; blank lines do not count towards offsets.
        let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();

        let mut starts: Vec<usize> = indices_containing(&lines, START_BANNER);
        let ends: Vec<usize> = indices_containing(&lines, END_BANNER);
        starts.push(lines.len());

        let mut commands = IndexMap::new();
        for (i, window) in starts.windows(2).enumerate() {
            let (start, next) = (window[0], window[1]);
            let end = *ends
                .get(i)
                .ok_or(ParserError::MissingEndBanner { command_index: i })?;

            let command = slice(&lines, start + 1, end).join("\n");
            let output: Vec<String> = slice(
                &lines,
                start + OUTPUT_OFFSET,
                next.saturating_sub(FOOTER_LINES),
            )
            .iter()
            .map(|line| (*line).to_string())
            .collect();

            let status = if output.iter().any(|line| line.contains(COMMAND_FAILED_MARKER)) {
                CommandStatus::Failed
            } else {
                CommandStatus::Success
            };

            debug!("Command {i}: {status:?}, {} output lines", output.len());
            commands.insert(command, CommandLog { output, status });
        }

        let overall_status = parse_overall_status(&lines)?;
        info!("Commands finished with result: {overall_status}");

        Ok(Self {
            commands,
            overall_status,
        })
    }

    pub fn job_failed(&self) -> bool {
        self.overall_status.contains("Failed")
    }
}

fn indices_containing(lines: &[&str], needle: &str) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(needle))
        .map(|(i, _)| i)
        .collect()
}

/// `lines[from..to]`, empty when the bounds are inverted or past the end.
fn slice<'a>(lines: &'a [&'a str], from: usize, to: usize) -> &'a [&'a str] {
    let to = to.min(lines.len());
    if from >= to {
        &[]
    } else {
        &lines[from..to]
    }
}

/// Takes the text after the first `]`, then the part after the first `: `.
fn parse_overall_status(lines: &[&str]) -> Result<String> {
    let line = lines
        .iter()
        .find(|line| line.contains(SUMMARY_MARKER))
        .ok_or(ParserError::MissingSummaryLine)?;

    line.split(']')
        .nth(1)
        .and_then(|rest| rest.split(": ").nth(1))
        .map(str::to_string)
        .ok_or_else(|| ParserError::MalformedSummaryLine((*line).to_string()))
}

/// Returns the first file in `dir` matching the `<prefix>*<suffix>` glob, by name order.
pub fn find_execution_log(dir: &Path, prefix: &str, suffix: &str) -> Result<PathBuf> {
    let file_glob = format!("{prefix}*{suffix}");
    let pattern = dir.join(&file_glob);
    info!("Searching for logs in: {}", pattern.display());

    let matcher = Glob::new(&file_glob)
        .map_err(|e| ParserError::Config(format!("invalid execution log pattern '{file_glob}': {e}")))?
        .compile_matcher();

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|_| ParserError::ExecutionLogNotFound(pattern.clone()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.file_name().is_some_and(|name| matcher.is_match(name)))
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or(ParserError::ExecutionLogNotFound(pattern))
}
