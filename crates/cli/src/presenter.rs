//! Rendering of fetched resources on stdout

use porygo_config::{Config, OutputFormat};
use porygo_core::ScrapedData;
use std::collections::BTreeMap;
use std::io::{self, Write};

pub trait Presenter {
    fn write(&self, out: &mut dyn Write, data: &ScrapedData) -> io::Result<()>;
}

/// Pick the presenter the configuration asks for
pub fn for_config(config: &Config) -> Box<dyn Presenter> {
    match config.format {
        OutputFormat::Json => Box::new(JsonPresenter {
            quiet: config.quiet,
        }),
        OutputFormat::Text => Box::new(TextPresenter {
            quiet: config.quiet,
            headers: config.headers,
        }),
    }
}

/// Pretty JSON, one document per resource
pub struct JsonPresenter {
    pub quiet: bool,
}

impl Presenter for JsonPresenter {
    fn write(&self, out: &mut dyn Write, data: &ScrapedData) -> io::Result<()> {
        let rendered = if self.quiet {
            serde_json::to_string_pretty(&serde_json::json!({
                "url": data.url,
                "extracted": data.extracted,
                "matches": data.matches,
            }))
        } else {
            serde_json::to_string_pretty(data)
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(out, "{rendered}")
    }
}

/// Human-readable sections: metadata, selector results, pattern matches
pub struct TextPresenter {
    pub quiet: bool,
    /// Include origin and cache expiry in the metadata
    pub headers: bool,
}

impl Presenter for TextPresenter {
    fn write(&self, out: &mut dyn Write, data: &ScrapedData) -> io::Result<()> {
        if !self.quiet {
            writeln!(out, "--- Metadata ---")?;
            writeln!(out, "URL:        {}", data.url)?;
            writeln!(out, "Size:       {} bytes", data.size)?;
            writeln!(out, "Fetched at: {}", data.timestamp.to_rfc3339())?;
            if self.headers {
                writeln!(out, "Source:     {:?}", data.origin)?;
                if let Some(expires_at) = data.expires_at {
                    writeln!(out, "Expires at: {}", expires_at.to_rfc3339())?;
                }
            }
        }

        write_section(out, "Extracted by CSS Selectors", "Selector", "(No results found)", &data.extracted)?;
        write_section(out, "Matched by Regex Patterns", "Pattern", "(No matches found)", &data.matches)?;
        writeln!(out)
    }
}

fn write_section(
    out: &mut dyn Write,
    title: &str,
    label: &str,
    empty: &str,
    items: &BTreeMap<String, Vec<String>>,
) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n--- {title} ---")?;
    for (name, values) in items {
        writeln!(out, "{label}: {name}")?;
        if values.is_empty() {
            writeln!(out, "  {empty}")?;
        }
        for value in values {
            writeln!(out, "  - {}", value.replace('\n', "\n    "))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use porygo_core::Origin;

    fn sample() -> ScrapedData {
        let mut extracted = BTreeMap::new();
        extracted.insert("title".to_string(), vec!["Hello".to_string()]);
        extracted.insert("h2".to_string(), Vec::new());
        ScrapedData {
            url: "https://example.com".to_string(),
            origin: Origin::Network,
            size: 42,
            timestamp: Utc::now(),
            expires_at: None,
            extracted,
            matches: BTreeMap::new(),
        }
    }

    fn render(presenter: &dyn Presenter) -> String {
        let mut buf = Vec::new();
        presenter.write(&mut buf, &sample()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_json_full_and_quiet() {
        let full: serde_json::Value =
            serde_json::from_str(&render(&JsonPresenter { quiet: false })).unwrap();
        assert_eq!(full["url"], "https://example.com");
        assert_eq!(full["origin"], "network");
        assert_eq!(full["size"], 42);
        assert!(full.get("matches").is_none());

        let quiet: serde_json::Value =
            serde_json::from_str(&render(&JsonPresenter { quiet: true })).unwrap();
        assert!(quiet.get("size").is_none());
        assert_eq!(quiet["extracted"]["title"][0], "Hello");
    }

    #[test]
    fn test_text_sections() {
        let text = render(&TextPresenter {
            quiet: false,
            headers: false,
        });
        assert!(text.contains("--- Metadata ---"));
        assert!(text.contains("URL:        https://example.com"));
        assert!(text.contains("Selector: title\n  - Hello"));
        assert!(text.contains("Selector: h2\n  (No results found)"));
        assert!(!text.contains("Regex"));

        let quiet = render(&TextPresenter {
            quiet: true,
            headers: false,
        });
        assert!(!quiet.contains("Metadata"));
        assert!(quiet.contains("Hello"));
    }
}
