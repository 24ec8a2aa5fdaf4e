//! Loading and saving configuration files.

use crate::config::Config;
use porygo_core::{Error, Result, ResultExt, CONFIG_FILE_NAME};
use porygo_utils::write_atomic_string;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and writes the TOML configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    /// `config.toml` in the current directory
    fn default() -> Self {
        Self::new(CONFIG_FILE_NAME)
    }
}

impl ConfigManager {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load_defaults(&self) -> Config {
        Config::default()
    }

    /// Parse a TOML file; keys it leaves out keep their defaults
    pub fn load_from_file(&self, file_path: &Path) -> Result<Config> {
        let data = fs::read_to_string(file_path)
            .map_err(|e| Error::file_system(file_path, "read config file", e))?;

        let config: Config = toml::from_str(&data).map_err(|e| {
            Error::configuration(format!(
                "failed to parse config file {}: {e}",
                file_path.display()
            ))
        })?;

        tracing::debug!(path = %file_path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load the managed file, falling back to defaults when it does not exist
    pub fn load(&self) -> Result<Config> {
        if self.config_path.exists() {
            self.load_from_file(&self.config_path)
        } else {
            tracing::debug!(
                path = %self.config_path.display(),
                "no configuration file, using defaults"
            );
            Ok(self.load_defaults())
        }
    }

    /// Write `config` to the managed path, creating parent directories
    pub fn save(&self, config: &Config) -> Result<()> {
        let encoded = config.to_toml_string()?;
        write_atomic_string(&self.config_path, &encoded)
            .with_context(|| format!("failed to save {}", self.config_path.display()))
    }

    /// Create the file with default values; an existing file is kept unless `force`
    pub fn init_defaults(&self, force: bool) -> Result<()> {
        if self.config_path.exists() && !force {
            return Err(Error::configuration(format!(
                "{} already exists, use --force to overwrite it",
                self.config_path.display()
            )));
        }
        self.save(&Config::default())
    }
}
