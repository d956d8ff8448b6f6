use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::file_config::FileConfig;
use crate::retry::RetryPolicy;

/// Secrets and endpoint location, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pixelplus_api_key: String,
    pub pixelplus_api_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            pixelplus_api_key: std::env::var("PIXELPLUS_API_KEY")
                .context("PIXELPLUS_API_KEY environment variable is required")?,
            pixelplus_api_url: std::env::var("PIXELPLUS_API_URL")
                .unwrap_or_else(|_| pixelplus_client::DEFAULT_BASE_URL.to_string()),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(5).map(char::len_utf8).sum();
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  PIXELPLUS_API_KEY: {}", preview(&self.pixelplus_api_key));
        tracing::info!("  PIXELPLUS_API_URL: {}", self.pixelplus_api_url);
    }
}

/// Everything a rank-check run needs, passed into components at construction.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub handoff_path: PathBuf,
    pub region_code: u32,
    pub search_engine: String,
    /// Pause between urls (and between submitting and polling a url).
    pub request_delay: Duration,
    /// Pause between the submission and polling phases of a two-phase run.
    pub phase_delay: Duration,
    pub retry_delay: Duration,
    pub retry_budget_submit: u32,
    pub retry_budget_poll: u32,
}

impl RunConfig {
    pub fn new(app: AppConfig, file: FileConfig) -> Self {
        Self {
            api_key: app.pixelplus_api_key,
            api_base_url: app.pixelplus_api_url,
            input_path: file.input_path,
            output_path: file.output_path,
            handoff_path: file.handoff_path,
            region_code: file.region_code,
            search_engine: file.search_engine,
            request_delay: Duration::from_secs(file.request_delay_secs),
            phase_delay: Duration::from_secs(file.phase_delay_secs),
            retry_delay: Duration::from_secs(file.retry_delay_secs),
            retry_budget_submit: file.retry_budget_submit,
            retry_budget_poll: file.retry_budget_poll,
        }
    }

    pub fn submit_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_budget_submit, self.retry_delay)
    }

    pub fn poll_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_budget_poll, self.retry_delay)
    }
}
