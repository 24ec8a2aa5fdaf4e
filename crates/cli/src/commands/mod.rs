use clap::Subcommand;
use porygo_config::{Config, ConfigManager};
use porygo_core::Result;
use std::path::Path;

pub mod cache;
pub mod config;
pub mod scrape;

use self::cache::CacheCommands;
use self::config::ConfigCommands;

pub use self::scrape::ScrapeArgs;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Create or show the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    pub fn execute(self, config_path: Option<&Path>) -> eyre::Result<()> {
        match self {
            Commands::Cache { command } => command.execute(),
            Commands::Config { command } => command.execute(config_path),
        }
    }
}

/// The manager for `--config`, or for `./config.toml` when it is not given
pub fn config_manager(config_path: Option<&Path>) -> ConfigManager {
    config_path.map(ConfigManager::new).unwrap_or_default()
}

/// Load the configuration. An explicit `--config` file must exist.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let manager = config_manager(config_path);
    match config_path {
        Some(path) => manager.load_from_file(path),
        None => manager.load(),
    }
}
