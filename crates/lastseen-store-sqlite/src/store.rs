//! [`SqliteStore`] — the SQLite implementation of [`KeyValueStore`].

use std::path::Path;

use chrono::Utc;
use lastseen_core::kv::KeyValueStore;
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use crate::{
  Result,
  encode::{BlobMeta, RawBlobMeta, decode_value, encode_dt, encode_value},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A blob store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Key, size and last write time of every stored blob, ordered by key.
  pub async fn blobs(&self) -> Result<Vec<BlobMeta>> {
    let raws: Vec<RawBlobMeta> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT key, length(value_json), updated_at FROM blobs ORDER BY key",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBlobMeta {
              key:        row.get(0)?,
              size:       row.get(1)?,
              updated_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBlobMeta::into_meta).collect()
  }
}

// ─── KeyValueStore impl ──────────────────────────────────────────────────────

impl KeyValueStore for SqliteStore {
  type Error = crate::Error;

  async fn get<'a>(&'a self, key: &'a str) -> Result<Option<Value>> {
    let key_str = key.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value_json FROM blobs WHERE key = ?1",
              rusqlite::params![key_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|s| decode_value(key, &s)).transpose()
  }

  async fn set<'a>(&'a self, key: &'a str, value: Value) -> Result<()> {
    let key_str   = key.to_owned();
    let value_str = encode_value(key, &value)?;
    let at_str    = encode_dt(Utc::now());
    let size      = value_str.len();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO blobs (key, value_json, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value_json = excluded.value_json,
             updated_at = excluded.updated_at",
          rusqlite::params![key_str, value_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(key, size, "blob written");
    Ok(())
  }

  async fn contains<'a>(&'a self, key: &'a str) -> Result<bool> {
    let key_str = key.to_owned();

    let found: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM blobs WHERE key = ?1",
              rusqlite::params![key_str],
              |_| Ok(true),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(found.unwrap_or(false))
  }
}
