//! The configuration model and its validation rules.

use crate::settings::FetchSettings;
use porygo_core::{Error, Result};
use porygo_utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Output format for fetched results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(Error::configuration(format!(
                "format must be either 'json' or 'text', got '{other}'"
            ))),
        }
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Initial delay between retries
    #[serde(with = "serde_duration")]
    pub base_delay: Duration,
    /// Whether to randomise each delay
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            jitter: true,
        }
    }
}

/// CSS selectors and regex patterns applied to each fetched body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorsConfig {
    /// CSS selectors; `selector@attr` extracts an attribute instead of text
    pub select: Vec<String>,
    /// Regex patterns
    pub pattern: Vec<String>,
}

/// Cache database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// How long a fetched body stays valid in the cache
    #[serde(with = "serde_duration")]
    pub expiration: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// All configuration options for the porygo tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent fetches
    pub concurrency: usize,
    /// Deadline for each individual attempt
    #[serde(with = "serde_duration")]
    pub timeout: Duration,
    /// Output format for the fetched data
    pub format: OutputFormat,
    /// Attempts per resource, including the first
    pub retry: usize,
    /// Ignore the cache and always fetch
    pub force: bool,
    /// Print only the extracted data
    pub quiet: bool,
    /// Include response metadata in text output
    pub headers: bool,
    pub backoff: BackoffConfig,
    pub selectors: SelectorsConfig,
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout: Duration::from_secs(10),
            format: OutputFormat::Json,
            retry: 3,
            force: false,
            quiet: false,
            headers: false,
            backoff: BackoffConfig::default(),
            selectors: SelectorsConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Values the user set explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub retry: Option<usize>,
    pub base_delay: Option<Duration>,
    pub jitter: Option<bool>,
    pub force: Option<bool>,
    pub format: Option<OutputFormat>,
    pub quiet: Option<bool>,
    pub select: Vec<String>,
    pub pattern: Vec<String>,
}

impl Config {
    /// Check every value and report all violations at once
    pub fn validate(&self) -> Result<()> {
        let mut errs = Vec::new();

        if self.concurrency == 0 {
            errs.push("concurrency must be greater than 0");
        }
        if self.timeout.is_zero() {
            errs.push("timeout must be greater than 0");
        }
        if self.retry == 0 {
            errs.push("retry must be at least 1");
        }
        if self.backoff.base_delay.is_zero() {
            errs.push("backoff base_delay must be greater than 0");
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(Error::configuration(format!(
                "configuration validation failed: {}",
                errs.join(", ")
            )))
        }
    }

    /// Apply flags that were passed explicitly; they win over the file
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(retry) = overrides.retry {
            self.retry = retry;
        }
        if let Some(base_delay) = overrides.base_delay {
            self.backoff.base_delay = base_delay;
        }
        if let Some(jitter) = overrides.jitter {
            self.backoff.jitter = jitter;
        }
        if let Some(force) = overrides.force {
            self.force = force;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(quiet) = overrides.quiet {
            self.quiet = quiet;
        }
        if !overrides.select.is_empty() {
            self.selectors.select = overrides.select;
        }
        if !overrides.pattern.is_empty() {
            self.selectors.pattern = overrides.pattern;
        }
    }

    /// The part of the configuration the orchestrator runs with
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            concurrency: self.concurrency,
            per_request_timeout: self.timeout,
            max_attempts: self.retry,
            base_delay: self.backoff.base_delay,
            jitter_enabled: self.backoff.jitter,
            cache_ttl: self.database.expiration,
            force_refresh: self.force,
        }
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("failed to encode config to TOML: {e}")))
    }
}
