use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Engine;

/// TOML-backed run settings. Secrets (the API key) stay as env vars.
/// Every field has a default, so an absent file means "use defaults".
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub engine: Engine,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub handoff_path: PathBuf,
    pub summary_input_path: PathBuf,
    pub summary_output_path: PathBuf,
    pub region_code: u32,
    pub search_engine: String,
    pub request_delay_secs: u64,
    pub retry_delay_secs: u64,
    pub phase_delay_secs: u64,
    pub retry_budget_submit: u32,
    pub retry_budget_poll: u32,
    pub decimal_separator: char,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Google,
            input_path: PathBuf::from("input.csv"),
            output_path: PathBuf::from("output.csv"),
            handoff_path: PathBuf::from("report_ids.csv"),
            summary_input_path: PathBuf::from("panda_input.csv"),
            summary_output_path: PathBuf::from("panda_output.csv"),
            region_code: 213,
            search_engine: "google.ru".to_string(),
            request_delay_secs: 10,
            retry_delay_secs: 60,
            phase_delay_secs: 60,
            retry_budget_submit: 3,
            retry_budget_poll: 5,
            decimal_separator: ',',
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Load `path` if given, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(FileConfig::default()),
    }
}
