use clap::Parser;
use porygo_utils::tracing::LogOptions;
use std::path::PathBuf;

mod commands;
mod input;
mod presenter;

use commands::{Commands, ScrapeArgs};

#[derive(Parser, Debug)]
#[command(name = "porygo")]
#[command(about = "Fetch one or more URLs concurrently, with caching and retries", long_about = None)]
#[command(version)]
struct Cli {
    /// File path to write logs to
    #[arg(short = 'l', long = "log", global = true, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Show logs for each step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output debug messages
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file to load instead of ./config.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    scrape: ScrapeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    porygo_utils::tracing::init(&LogOptions {
        verbose: cli.verbose,
        debug: cli.debug,
        log_file: cli.log.clone(),
    })
    .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    match cli.command {
        Some(command) => command.execute(cli.config.as_deref()),
        None => commands::scrape::execute(cli.scrape, cli.config.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_root_flags_parse() {
        let cli = Cli::try_parse_from([
            "porygo",
            "-c",
            "8",
            "-t",
            "500ms",
            "-r",
            "5",
            "-b",
            "2s",
            "--no-jitter",
            "-s",
            "title",
            "-s",
            "a@href",
            "-p",
            r"\d+",
            "--format",
            "text",
            "https://example.com",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        let overrides = cli.scrape.overrides();
        assert_eq!(overrides.concurrency, Some(8));
        assert_eq!(overrides.timeout, Some(Duration::from_millis(500)));
        assert_eq!(overrides.retry, Some(5));
        assert_eq!(overrides.base_delay, Some(Duration::from_secs(2)));
        assert_eq!(overrides.jitter, Some(false));
        assert_eq!(overrides.select, vec!["title", "a@href"]);
        assert_eq!(overrides.pattern, vec![r"\d+"]);
        assert_eq!(cli.scrape.urls, vec!["https://example.com"]);
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let cli = Cli::try_parse_from(["porygo", "https://example.com"]).unwrap();
        let overrides = cli.scrape.overrides();

        assert!(overrides.concurrency.is_none());
        assert!(overrides.force.is_none());
        assert!(overrides.jitter.is_none());
        assert!(overrides.format.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::try_parse_from(["porygo", "-v", "cache", "stats"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Cache { .. })));

        let cli = Cli::try_parse_from(["porygo", "config", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config { .. })));
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(Cli::try_parse_from(["porygo", "-t", "soon"]).is_err());
    }
}
