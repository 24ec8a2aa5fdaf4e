use chrono::{DateTime, Local};
use clap::Subcommand;
use porygo_cache::{inspect, CacheManager, CacheStats, CacheStorage};
use std::time::SystemTime;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List cached entries with their expiry and size
    List,
    /// Show cache statistics
    Stats,
    /// Remove every cache entry
    Clear,
}

impl CacheCommands {
    pub fn execute(self) -> eyre::Result<()> {
        let manager = CacheManager::with_default_path();
        let store = manager.get_or_create()?;

        match self {
            CacheCommands::List => {
                let listing = inspect(&store, SystemTime::now())?;
                if listing.is_empty() {
                    println!("Cache is empty");
                }
                for row in listing {
                    let expires = row
                        .expires_at
                        .map(format_time)
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<8} {:<19} {:>10}  {}",
                        row.state,
                        expires,
                        format_bytes(row.size as u64),
                        row.key
                    );
                }
            }
            CacheCommands::Stats => {
                let stats = CacheStats::collect(&store)?;
                println!("Cache Statistics:");
                println!("  Location: {}", stats.path.display());
                println!("  Entries:  {}", stats.entries);
                println!("  Valid:    {} ({:.1}%)", stats.valid, stats.valid_ratio());
                println!("  Expired:  {}", stats.expired);
                println!("  Corrupt:  {}", stats.corrupt);
                println!("  Payload:  {}", format_bytes(stats.payload_bytes));
                println!("  On disk:  {}", format_bytes(stats.file_size));
            }
            CacheCommands::Clear => {
                let removed = store.len()?;
                store.clear()?;
                println!("✓ Removed {removed} cache entries");
            }
        }

        manager.close()?;
        Ok(())
    }
}

fn format_time(at: SystemTime) -> String {
    DateTime::<Local>::from(at)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
