use porygo_core::PORYGO_LOG_VAR;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// How much the CLI should log and where
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Show per-step progress (`info`)
    pub verbose: bool,
    /// Show debugging detail (`debug`), wins over `verbose`
    pub debug: bool,
    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl LogOptions {
    fn default_directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

/// Initialize the tracing system
///
/// `PORYGO_LOG` and then `RUST_LOG` override the level picked from the flags.
/// Logs go to stderr, with ANSI colours only when stderr is a terminal, or to
/// `log_file` without colours.
pub fn init(options: &LogOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_env(PORYGO_LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(options.default_directive()))?;

    match &options.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let fmt_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_level(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
        None => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(is_tty())
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one batch run
pub fn batch_span(total_keys: usize, concurrency: usize) -> Span {
    span!(Level::INFO, "batch", total_keys = %total_keys, concurrency = %concurrency)
}

/// Create a span covering the fetch of one resource key
pub fn fetch_span(key: &str) -> Span {
    span!(Level::INFO, "fetch", key = %key)
}

/// Emit a structured event for cache lookups
pub fn cache_event(key: &str, hit: bool, operation: &str) {
    if hit {
        debug!(key = %key, operation = %operation, "cache_hit");
    } else {
        debug!(key = %key, operation = %operation, "cache_miss");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_from_flags() {
        assert_eq!(LogOptions::default().default_directive(), "warn");
        let verbose = LogOptions {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(verbose.default_directive(), "info");
        let both = LogOptions {
            verbose: true,
            debug: true,
            log_file: None,
        };
        assert_eq!(both.default_directive(), "debug");
    }
}
