use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::results::ResultsFormat;

const CONFIG_NAMES: [&str; 4] = [
    "yamato-log-parser.toml",
    "yamato-log-parser.json",
    "yamato-log-parser.yaml",
    "yamato-log-parser.yml",
];

/// Configuration file structure.
///
/// Every field has a default, so a missing file or a partial one is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub reporting: ReportingConfig,

    #[serde(default)]
    pub execution_log: ExecutionLogConfig,

    #[serde(default)]
    pub results: ResultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportingConfig {
    /// Reporting server base URL
    pub server_url: Option<String>,

    /// Path posted to under the base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExecutionLogConfig {
    /// Directory searched for the execution log (default: two levels above cwd)
    pub search_dir: Option<PathBuf>,

    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_log_suffix")]
    pub file_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultsConfig {
    #[serde(default)]
    pub format: ResultsFormat,

    #[serde(default = "default_hoarder_file")]
    pub hoarder_file: String,

    #[serde(default = "default_results_log_file")]
    pub results_log_file: String,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            endpoint: default_endpoint(),
        }
    }
}

impl Default for ExecutionLogConfig {
    fn default() -> Self {
        Self {
            search_dir: None,
            file_prefix: default_log_prefix(),
            file_suffix: default_log_suffix(),
        }
    }
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            format: ResultsFormat::default(),
            hoarder_file: default_hoarder_file(),
            results_log_file: default_results_log_file(),
        }
    }
}

fn default_endpoint() -> String {
    "result".to_string()
}

fn default_log_prefix() -> String {
    "Execution-".to_string()
}

fn default_log_suffix() -> String {
    ".log".to_string()
}

fn default_hoarder_file() -> String {
    "HoarderData.json".to_string()
}

fn default_results_log_file() -> String {
    "TestResults.json".to_string()
}

impl ResultsConfig {
    /// File name read for the given format.
    pub fn file_name(&self, format: ResultsFormat) -> &str {
        match format {
            ResultsFormat::Hoarder => &self.hoarder_file,
            ResultsFormat::ResultsLog => &self.results_log_file,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. `./yamato-log-parser.{toml,json,yaml,yml}`
    /// 3. The same names under `<config dir>/yamato-log-parser/`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_dir = dirs::config_dir().map(|dir| dir.join("yamato-log-parser"));
        let search_dirs = std::iter::once(PathBuf::from(".")).chain(user_dir);

        for dir in search_dirs {
            for name in &CONFIG_NAMES {
                let candidate = dir.join(name);
                if candidate.exists() {
                    log::debug!("Using config file: {}", candidate.display());
                    return Self::load_from_path(&candidate);
                }
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
