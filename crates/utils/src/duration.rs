//! Human-readable durations such as `500ms`, `10s`, `5m`, `24h` or `1d`.

use porygo_core::{Error, Result};
use std::time::Duration;

/// Parse a duration like `1.5s` or `24h`
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let invalid = || Error::configuration(format!("invalid duration '{s}'"));

    let num_end = s
        .chars()
        .position(|c| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num_str, unit) = s.split_at(num_end);

    let nanos_per_unit: u128 = match unit.trim() {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 60 * 60 * 1_000_000_000,
        "d" => 24 * 60 * 60 * 1_000_000_000,
        _ => return Err(invalid()),
    };

    // Integer arithmetic keeps values like "0.3s" exact
    let (whole, fraction) = num_str.split_once('.').unwrap_or((num_str, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let mut nanos = whole.checked_mul(nanos_per_unit).ok_or_else(invalid)?;
    if !fraction.is_empty() {
        let digits = u32::try_from(fraction.len()).map_err(|_| invalid())?;
        let scale = 10u128.checked_pow(digits).ok_or_else(invalid)?;
        let fraction: u128 = fraction.parse().map_err(|_| invalid())?;
        nanos += fraction.checked_mul(nanos_per_unit).ok_or_else(invalid)? / scale;
    }

    let secs = u64::try_from(nanos / 1_000_000_000).map_err(|_| invalid())?;
    // Remainder of a division by 1e9 always fits in u32
    let subsec = (nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec))
}

/// Render a duration in the largest unit that represents it exactly
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(&str, u128); 5] = [
        ("d", 24 * 60 * 60 * 1_000),
        ("h", 60 * 60 * 1_000),
        ("m", 60 * 1_000),
        ("s", 1_000),
        ("ms", 1),
    ];

    let millis = duration.as_millis();
    if millis == 0 || duration.subsec_nanos() % 1_000_000 != 0 {
        return format!("{}ns", duration.as_nanos());
    }

    for (unit, size) in UNITS {
        if millis % size == 0 {
            return format!("{}{unit}", millis / size);
        }
    }
    format!("{millis}ms")
}

/// `serde(with = ...)` adapter storing durations as strings
pub mod serde_duration {
    use super::{format_duration, parse_duration};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
