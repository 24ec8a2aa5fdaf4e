//! On-disk layout of the cache file
//!
//! All integers are little endian.
//!
//! ```text
//! file   := MAGIC "PRYC" | u16 file version | frame*
//! frame  := u32 key_len | key | u32 body_len | body
//!         | u32 key_len | key | u32 0xFFFF_FFFF          (tombstone)
//! body   := u8 record version | i64 secs | u32 nanos | u32 value_len | value | u32 crc32c
//! ```
//!
//! The file is a log: writes append one frame and a later frame for a key
//! supersedes earlier ones. Compaction rewrites the file with one frame per
//! live key.
//!
//! `secs`/`nanos` locate `expires_at` relative to the unix epoch with the
//! nanosecond part always positive. The checksum covers every body byte that
//! precedes it. Bodies are decoded lazily so one damaged record only affects
//! lookups of its own key.

use crate::errors::{CacheError, RecoveryHint, Result};
use crc32c::crc32c;
use porygo_core::CacheEntry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Magic bytes at the start of every cache file
pub const FILE_MAGIC: [u8; 4] = *b"PRYC";

/// Current file framing version
pub const FILE_VERSION: u16 = 1;

/// Current record body version
pub const RECORD_VERSION: u8 = 1;

/// Length of the file header
pub const HEADER_LEN: usize = FILE_MAGIC.len() + 2;

/// `body_len` value marking a deleted key
const TOMBSTONE: u32 = u32::MAX;
const BODY_FIXED_LEN: usize = 1 + 8 + 4 + 4 + 4;
const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Encoded record bodies by key; bodies are shared between snapshots
pub type Records = HashMap<String, Arc<[u8]>>;

/// Live records recovered from a cache file
#[derive(Debug, Default)]
pub struct DecodedLog {
    pub records: Records,
    /// Frames in the file, superseded ones and tombstones included
    pub frames: usize,
    /// Length of the cleanly framed prefix, shorter than the input when the
    /// final append was cut off
    pub clean_len: usize,
}

/// Encode one entry into a self-checking record body
pub fn encode_entry(key: &str, entry: &CacheEntry) -> Result<Vec<u8>> {
    let (secs, nanos) = split_timestamp(entry.expires_at).ok_or_else(|| CacheError::Encoding {
        key: key.to_string(),
        reason: "expiration time is out of range".to_string(),
        recovery_hint: RecoveryHint::Manual {
            instructions: "Use a shorter cache expiration".to_string(),
        },
    })?;
    let value_len = u32::try_from(entry.value.len()).map_err(|_| CacheError::Encoding {
        key: key.to_string(),
        reason: format!("value of {} bytes is too large", entry.value.len()),
        recovery_hint: RecoveryHint::Manual {
            instructions: "Values must be smaller than 4 GiB".to_string(),
        },
    })?;

    let mut body = Vec::with_capacity(BODY_FIXED_LEN + entry.value.len());
    body.push(RECORD_VERSION);
    body.extend_from_slice(&secs.to_le_bytes());
    body.extend_from_slice(&nanos.to_le_bytes());
    body.extend_from_slice(&value_len.to_le_bytes());
    body.extend_from_slice(&entry.value);
    let crc = crc32c(&body);
    body.extend_from_slice(&crc.to_le_bytes());
    Ok(body)
}

/// Decode a record body written by [`encode_entry`]
pub fn decode_entry(key: &str, body: &[u8]) -> Result<CacheEntry> {
    let corrupt = |reason: String| CacheError::corruption(key, reason);

    if body.len() < BODY_FIXED_LEN {
        return Err(corrupt(format!(
            "record is {} bytes, shorter than the {BODY_FIXED_LEN}-byte minimum",
            body.len()
        )));
    }

    let (payload, crc_bytes) = body.split_at(body.len() - 4);
    let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let actual_crc = crc32c(payload);
    if stored_crc != actual_crc {
        return Err(corrupt(format!(
            "checksum mismatch: expected {stored_crc:08x}, got {actual_crc:08x}"
        )));
    }

    let mut reader = Reader::new(payload);
    let version = reader.u8().ok_or_else(|| corrupt("missing record version".into()))?;
    if version != RECORD_VERSION {
        return Err(corrupt(format!("unsupported record version {version}")));
    }
    let secs = reader.i64().ok_or_else(|| corrupt("truncated expiration".into()))?;
    let nanos = reader.u32().ok_or_else(|| corrupt("truncated expiration".into()))?;
    let value_len = reader.u32().ok_or_else(|| corrupt("truncated value length".into()))?;
    let value = reader
        .bytes(value_len as usize)
        .ok_or_else(|| corrupt(format!("value length {value_len} exceeds record")))?;
    if !reader.is_empty() {
        return Err(corrupt(format!("{} trailing bytes", reader.remaining())));
    }

    let expires_at = join_timestamp(secs, nanos)
        .ok_or_else(|| corrupt(format!("invalid expiration {secs}s {nanos}ns")))?;

    Ok(CacheEntry::new(value.to_vec(), expires_at))
}

/// The header every cache file starts with
pub fn file_header() -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    out.extend_from_slice(&FILE_MAGIC);
    out.extend_from_slice(&FILE_VERSION.to_le_bytes());
    out
}

/// Encode one log frame; `None` writes a tombstone for `key`
pub fn encode_frame(key: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + key.len() + body.map_or(0, <[u8]>::len));
    push_frame(&mut out, key, body)?;
    Ok(out)
}

/// Frame a set of encoded records as a compacted file, keys in sorted order
pub fn encode_file<V: AsRef<[u8]>>(records: &HashMap<String, V>) -> Result<Vec<u8>> {
    let payload: usize = records
        .iter()
        .map(|(k, v)| 8 + k.len() + v.as_ref().len())
        .sum();
    let mut out = file_header();
    out.reserve(payload);

    let mut keys: Vec<&String> = records.keys().collect();
    keys.sort();
    for key in keys {
        push_frame(&mut out, key, Some(records[key].as_ref()))?;
    }
    Ok(out)
}

/// Split a file into its still-encoded records.
///
/// An empty file is a fresh store. Any framing damage fails the whole file.
pub fn decode_file(bytes: &[u8]) -> Result<Records> {
    let log = decode_log(bytes)?;
    if log.clean_len < bytes.len() {
        return Err(CacheError::corruption(
            "",
            format!("truncated frame at offset {}", log.clean_len),
        ));
    }
    Ok(log.records)
}

/// Replay the frames of a file.
///
/// A frame that runs past the end of the input stops the replay and is
/// reported through [`DecodedLog::clean_len`]. Any other damage fails.
pub fn decode_log(bytes: &[u8]) -> Result<DecodedLog> {
    let mut log = DecodedLog::default();
    if bytes.is_empty() {
        return Ok(log);
    }

    let file_corrupt = |reason: String| CacheError::corruption("", reason);

    let mut reader = Reader::new(bytes);
    let magic = reader
        .bytes(FILE_MAGIC.len())
        .ok_or_else(|| file_corrupt("file is shorter than its header".into()))?;
    if magic != FILE_MAGIC {
        return Err(file_corrupt(format!(
            "invalid magic bytes {magic:02x?}, expected {FILE_MAGIC:02x?}"
        )));
    }
    let version = reader
        .u16()
        .ok_or_else(|| file_corrupt("file is shorter than its header".into()))?;
    if version != FILE_VERSION {
        return Err(CacheError::Corruption {
            key: String::new(),
            reason: format!("unsupported file version {version}"),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Remove the cache file or upgrade porygo".to_string(),
            },
        });
    }

    loop {
        log.clean_len = bytes.len() - reader.remaining();
        if reader.is_empty() {
            break;
        }
        let Some(key_len) = reader.u32() else { break };
        let Some(key) = reader.bytes(key_len as usize) else { break };
        let key = std::str::from_utf8(key)
            .map_err(|e| file_corrupt(format!("key is not valid UTF-8: {e}")))?
            .to_string();
        let Some(body_len) = reader.u32() else { break };
        if body_len == TOMBSTONE {
            log.records.remove(&key);
        } else {
            let Some(body) = reader.bytes(body_len as usize) else { break };
            log.records.insert(key, Arc::from(body));
        }
        log.frames += 1;
    }

    Ok(log)
}

fn push_frame(out: &mut Vec<u8>, key: &str, body: Option<&[u8]>) -> Result<()> {
    out.extend_from_slice(&frame_len(key, key.len())?.to_le_bytes());
    out.extend_from_slice(key.as_bytes());
    match body {
        Some(body) => {
            let len = frame_len(key, body.len())?;
            if len == TOMBSTONE {
                return Err(CacheError::Encoding {
                    key: key.to_string(),
                    reason: "record length collides with the tombstone marker".to_string(),
                    recovery_hint: RecoveryHint::ClearAndRetry,
                });
            }
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(body);
        }
        None => out.extend_from_slice(&TOMBSTONE.to_le_bytes()),
    }
    Ok(())
}

fn frame_len(key: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CacheError::Encoding {
        key: key.to_string(),
        reason: format!("frame of {len} bytes is too large"),
        recovery_hint: RecoveryHint::ClearAndRetry,
    })
}

fn split_timestamp(at: SystemTime) -> Option<(i64, u32)> {
    match at.duration_since(UNIX_EPOCH) {
        Ok(after) => Some((i64::try_from(after.as_secs()).ok()?, after.subsec_nanos())),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => Some((-secs, 0)),
                n => Some((-secs.checked_add(1)?, NANOS_PER_SEC - n)),
            }
        }
    }
}

fn join_timestamp(secs: i64, nanos: u32) -> Option<SystemTime> {
    if nanos >= NANOS_PER_SEC {
        return None;
    }
    let nanos = Duration::from_nanos(u64::from(nanos));
    if secs >= 0 {
        UNIX_EPOCH
            .checked_add(Duration::from_secs(secs.unsigned_abs()))?
            .checked_add(nanos)
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(secs.unsigned_abs()))?
            .checked_add(nanos)
    }
}

/// Cursor over a byte slice
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Some(head)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.bytes(N)?.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn i64(&mut self) -> Option<i64> {
        self.array().map(i64::from_le_bytes)
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_entry_round_trip_is_exact() {
        let expires_at = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let entry = CacheEntry::new(b"<html>ok</html>".to_vec(), expires_at);

        let body = encode_entry("https://example.com", &entry).unwrap();
        let decoded = decode_entry("https://example.com", &body).unwrap();

        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_pre_epoch_expiration_round_trips() {
        let expires_at = UNIX_EPOCH - Duration::new(5, 250_000_000);
        let entry = CacheEntry::new(Vec::new(), expires_at);

        let body = encode_entry("k", &entry).unwrap();
        assert_eq!(decode_entry("k", &body).unwrap().expires_at, expires_at);
    }

    #[test]
    fn test_flipped_bit_is_corruption() {
        let entry = CacheEntry::new(b"payload".to_vec(), UNIX_EPOCH + Duration::from_secs(60));
        let mut body = encode_entry("k", &entry).unwrap();
        body[14] ^= 0x01;

        let err = decode_entry("k", &body).unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_short_record_is_corruption() {
        let err = decode_entry("k", &[RECORD_VERSION, 0, 0]).unwrap_err();
        assert!(err.is_corruption());
    }

    fn records(pairs: &[(&str, Vec<u8>)]) -> Records {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Arc::from(v.as_slice())))
            .collect()
    }

    #[test]
    fn test_file_framing() {
        let records = records(&[("b", vec![1, 2, 3]), ("a", vec![])]);

        let bytes = encode_file(&records).unwrap();
        assert_eq!(&bytes[..4], b"PRYC");
        assert_eq!(decode_file(&bytes).unwrap(), records);
    }

    #[test]
    fn test_later_frames_supersede_earlier_ones() {
        let mut bytes = encode_file(&records(&[("a", vec![1]), ("b", vec![2])])).unwrap();
        bytes.extend(encode_frame("a", Some(&[9u8, 9][..])).unwrap());
        bytes.extend(encode_frame("b", None).unwrap());

        let log = decode_log(&bytes).unwrap();
        assert_eq!(log.records, records(&[("a", vec![9, 9])]));
        assert_eq!(log.frames, 4);
        assert_eq!(log.clean_len, bytes.len());
    }

    #[test]
    fn test_cut_off_final_frame_is_reported() {
        let mut bytes = encode_file(&records(&[("a", vec![1])])).unwrap();
        let clean = bytes.len();
        let frame = encode_frame("b", Some(&[2u8; 8][..])).unwrap();
        bytes.extend_from_slice(&frame[..frame.len() - 3]);

        let log = decode_log(&bytes).unwrap();
        assert_eq!(log.clean_len, clean);
        assert_eq!(log.records, records(&[("a", vec![1])]));
        assert!(decode_file(&bytes).unwrap_err().is_corruption());
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        assert!(decode_file(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_bad_magic_and_truncation_fail() {
        assert!(decode_file(b"NOPE\x01\x00").unwrap_err().is_corruption());

        let bytes = encode_file(&records(&[("key", vec![9; 16])])).unwrap();
        let err = decode_file(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(err.is_corruption());
    }

    proptest! {
        #[test]
        fn prop_entry_round_trip(
            value in proptest::collection::vec(any::<u8>(), 0..512),
            secs in -1_000_000_000i64..4_000_000_000i64,
            nanos in 0u32..1_000_000_000u32,
        ) {
            let expires_at = join_timestamp(secs, nanos).unwrap();
            let entry = CacheEntry::new(value, expires_at);
            let body = encode_entry("key", &entry).unwrap();
            prop_assert_eq!(decode_entry("key", &body).unwrap(), entry);
        }

        #[test]
        fn prop_truncated_body_never_decodes(
            value in proptest::collection::vec(any::<u8>(), 0..64),
            cut in 1usize..16,
        ) {
            let entry = CacheEntry::new(value, UNIX_EPOCH + Duration::from_secs(1));
            let body = encode_entry("key", &entry).unwrap();
            let cut = cut.min(body.len());
            prop_assert!(decode_entry("key", &body[..body.len() - cut]).is_err());
        }
    }
}
