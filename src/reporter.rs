use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::classifier::Report;
use crate::error::{ParserError, Result};
use crate::output::Spinner;

/// Settings for posting results. Built from CLI, environment and config file
/// by the caller; the reporter never reads the environment itself.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Reporting server base URL. Only required when `local` is false.
    pub server_url: Option<String>,
    /// Path appended to the base URL.
    pub endpoint: String,
    /// Print the payload without posting it.
    pub local: bool,
}

pub struct Reporter {
    client: Client,
    config: ReporterConfig,
}

impl Reporter {
    pub fn new(config: ReporterConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("yamato-log-parser/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ParserError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// `<base>/<endpoint>`, ignoring a trailing slash on the base.
    pub fn result_url(&self) -> Result<Url> {
        let base = self
            .config
            .server_url
            .as_deref()
            .ok_or(ParserError::MissingServerUrl)?;

        Url::parse(&format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.config.endpoint.trim_start_matches('/')
        ))
        .map_err(|e| ParserError::Config(format!("Invalid reporting server URL: {e}")))
    }

    /// Prints the payload, then posts it unless running locally.
    pub async fn post(&self, report: &Report) -> Result<()> {
        println!("\nPosting: {}", serde_json::to_string_pretty(report)?);

        if self.config.local {
            info!("Local run, skipping result upload");
            return Ok(());
        }

        let url = self.result_url()?;
        debug!("POST {url}");

        let spinner = Spinner::start("Posting result");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(report)
            .send()
            .await;

        let status = match response {
            Ok(response) => response.status(),
            Err(e) => {
                spinner.fail("Posting result failed");
                return Err(e.into());
            }
        };

        if status != StatusCode::OK {
            spinner.fail(&format!("Posting result failed ({status})"));
            return Err(ParserError::Reporting {
                status: status.as_u16(),
            });
        }

        spinner.finish("Result posted");
        Ok(())
    }
}
