use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use crate::classifier::{self, ResultsLookup};
use crate::config::Config;
use crate::execution_log::{find_execution_log, ExecutionLog};
use crate::output;
use crate::reporter::{Reporter, ReporterConfig};
use crate::results::ResultsFormat;

#[derive(Parser, Debug)]
#[command(name = "yamato-log-parser")]
#[command(author, version, about = "Classifies CI job failures from execution logs", long_about = None)]
pub struct Cli {
    /// Path to execution log file. If not specified, ../../Execution-*.log is used.
    #[arg(long)]
    execution_log: Option<PathBuf>,

    /// Print the result instead of posting it to the reporting server
    #[arg(long, default_value_t = false)]
    local: bool,

    /// Reporting server base URL
    #[arg(long, env = "YAMATO_REPORTING_SERVER")]
    server_url: Option<String>,

    /// Configuration file (default: ./yamato-log-parser.toml and friends)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Layout of the test results file read for non-test failures
    #[arg(long, value_enum)]
    results_format: Option<ResultsFormat>,

    /// Do not print the command status table
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let log_path = match &self.execution_log {
            Some(path) => path.clone(),
            None => {
                let dir = match &config.execution_log.search_dir {
                    Some(dir) => dir.clone(),
                    None => default_search_dir()?,
                };
                find_execution_log(
                    &dir,
                    &config.execution_log.file_prefix,
                    &config.execution_log.file_suffix,
                )?
            }
        };

        let log = ExecutionLog::read(&log_path)
            .with_context(|| format!("Failed to parse execution log: {}", log_path.display()))?;

        if !self.quiet {
            output::print_command_table(&log);
        }

        if !log.job_failed() {
            info!("Job succeeded, nothing to classify");
            return Ok(());
        }

        let format = self.results_format.unwrap_or(config.results.format);
        let lookup = ResultsLookup {
            format,
            file_name: config.results.file_name(format).to_string(),
        };

        let Some(report) = classifier::classify(&log, &lookup)? else {
            return Ok(());
        };

        let reporter = Reporter::new(ReporterConfig {
            server_url: self
                .server_url
                .clone()
                .or_else(|| config.reporting.server_url.clone()),
            endpoint: config.reporting.endpoint.clone(),
            local: self.local,
        })?;
        reporter.post(&report).await?;

        Ok(())
    }
}

/// Two directories above the working directory, where the runner drops its log.
fn default_search_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let dir = cwd
        .ancestors()
        .nth(2)
        .or_else(|| cwd.ancestors().last())
        .unwrap_or(Path::new("/"));
    Ok(dir.to_path_buf())
}
