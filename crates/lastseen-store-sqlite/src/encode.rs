//! Encoding and decoding helpers between Rust values and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; blobs as compact JSON.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Blob values ─────────────────────────────────────────────────────────────

pub fn encode_value(key: &str, value: &Value) -> Result<String> {
  serde_json::to_string(value).map_err(|source| Error::Json {
    key: key.to_owned(),
    source,
  })
}

pub fn decode_value(key: &str, s: &str) -> Result<Value> {
  serde_json::from_str(s).map_err(|source| Error::Json {
    key: key.to_owned(),
    source,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from the metadata columns of a `blobs` row.
pub struct RawBlobMeta {
  pub key:        String,
  pub size:       i64,
  pub updated_at: String,
}

/// Key, size and write time of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
  pub key:        String,
  /// Length of the encoded JSON in bytes.
  pub size:       u64,
  pub updated_at: DateTime<Utc>,
}

impl RawBlobMeta {
  pub fn into_meta(self) -> Result<BlobMeta> {
    Ok(BlobMeta {
      key:        self.key,
      size:       u64::try_from(self.size).unwrap_or(0),
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
