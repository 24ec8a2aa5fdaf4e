//! Turns a fetched body into [`ScrapedData`]
//!
//! Pass 1 applies CSS selectors (`selector@attr` reads an attribute instead
//! of the element text). Pass 2 runs regex patterns over the selector output,
//! or over the whole body when no selectors are configured.

use chrono::{DateTime, Utc};
use porygo_core::{Payload, ScrapedData};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::warn;

/// A compiled set of selectors and patterns
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    selectors: Vec<SelectorSpec>,
    patterns: Vec<Regex>,
}

#[derive(Debug, Clone)]
struct SelectorSpec {
    raw: String,
    selector: Selector,
    attr: Option<String>,
}

impl Extractor {
    /// Compile `selectors` and `patterns`; invalid ones are logged and skipped
    pub fn new(selectors: &[String], patterns: &[String]) -> Self {
        let selectors = selectors
            .iter()
            .filter_map(|raw| {
                let (css, attr) = split_attribute(raw);
                match Selector::parse(css) {
                    Ok(selector) => Some(SelectorSpec {
                        raw: raw.clone(),
                        selector,
                        attr,
                    }),
                    Err(e) => {
                        warn!(selector = %raw, error = %e, "invalid CSS selector, skipping");
                        None
                    }
                }
            })
            .collect();

        let patterns = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "invalid regex pattern, skipping");
                    None
                }
            })
            .collect();

        Self {
            selectors,
            patterns,
        }
    }

    /// True when there is nothing to extract
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty() && self.patterns.is_empty()
    }

    /// Selector results and pattern matches for `body`
    pub fn apply(
        &self,
        body: &[u8],
    ) -> (BTreeMap<String, Vec<String>>, BTreeMap<String, Vec<String>>) {
        let text = String::from_utf8_lossy(body);
        let mut extracted = BTreeMap::new();

        let texts: Vec<String> = if self.selectors.is_empty() {
            vec![text.into_owned()]
        } else {
            let document = Html::parse_document(&text);
            let mut all = Vec::new();
            for target in &self.selectors {
                let values: Vec<String> = document
                    .select(&target.selector)
                    .map(|element| match &target.attr {
                        Some(attr) => element.value().attr(attr).unwrap_or_default().to_string(),
                        None => element.text().collect::<String>().trim().to_string(),
                    })
                    .collect();
                all.extend(values.iter().cloned());
                extracted.insert(target.raw.clone(), values);
            }
            all
        };

        let matches = self
            .patterns
            .iter()
            .map(|re| {
                let found = texts
                    .iter()
                    .flat_map(|t| re.find_iter(t).map(|m| m.as_str().to_string()))
                    .collect();
                (re.as_str().to_string(), found)
            })
            .collect();

        (extracted, matches)
    }

    /// Build the structured view of one fetched or cached payload
    pub fn scrape(&self, key: &str, payload: &Payload) -> ScrapedData {
        let body = match payload {
            Payload::Extracted(data) => return data.clone(),
            Payload::Fetched(bytes) => bytes.as_slice(),
            Payload::Cached(entry) => entry.value.as_slice(),
        };
        let expires_at = match payload {
            Payload::Cached(entry) => Some(DateTime::<Utc>::from(entry.expires_at)),
            _ => None,
        };
        let (extracted, matches) = self.apply(body);

        ScrapedData {
            url: key.to_string(),
            origin: payload.origin(),
            size: body.len(),
            timestamp: Utc::now(),
            expires_at,
            extracted,
            matches,
        }
    }
}

/// Split a trailing `@attr` off a selector.
///
/// Only a suffix that is a plain attribute name counts, so an `@` inside an
/// attribute value stays part of the selector.
fn split_attribute(raw: &str) -> (&str, Option<String>) {
    match raw.rsplit_once('@') {
        Some((css, attr)) if !css.is_empty() && is_attribute_name(attr) => {
            (css, Some(attr.to_string()))
        }
        _ => (raw, None),
    }
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}
