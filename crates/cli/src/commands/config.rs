use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration as TOML
    Show,
}

impl ConfigCommands {
    pub fn execute(self, config_path: Option<&Path>) -> eyre::Result<()> {
        match self {
            ConfigCommands::Init { force } => {
                let manager = super::config_manager(config_path);
                manager.init_defaults(force)?;
                println!("✓ Created {} with default settings", manager.path().display());
                println!("Edit it directly or override values with command-line flags");
            }
            ConfigCommands::Show => {
                let config = super::load_config(config_path)?;
                print!("{}", config.to_toml_string()?);
            }
        }
        Ok(())
    }
}
