use crate::constants::{ARANJUEZ_DUTY_URL, DEFAULT_CALENDAR_FILE, DEFAULT_REGISTRY_FILE};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the on-duty schedule page
    pub source_url: String,
    /// Path to the pharmacy registry JSON
    pub registry_file: String,
    /// Path the duty calendar JSON is written to
    pub calendar_file: String,
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Additional fetch attempts after a failed HTTP request
    pub fetch_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: ARANJUEZ_DUTY_URL.to_string(),
            registry_file: DEFAULT_REGISTRY_FILE.to_string(),
            calendar_file: DEFAULT_CALENDAR_FILE.to_string(),
            timeout_seconds: 30,
            fetch_retries: 2,
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, falling back to the
    /// built-in defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
