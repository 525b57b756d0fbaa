//! The `KeyValueStore` trait — the persistence seam.
//!
//! Records are persisted as a handful of coarse-grained JSON blobs, one per
//! top-level map. Backends only need to get, set and test keys; everything
//! above that lives in [`crate::records::Records`].

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
};

use serde_json::Value;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a blob-oriented key-value backend.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded runtime behind an HTTP server.
pub trait KeyValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the blob stored under `key`, or `None` if it was never set.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Replace the blob stored under `key`.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn contains<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A process-local backend. Used for tests and for running without a
/// database file.
#[derive(Debug, Default)]
pub struct MemoryStore {
  blobs:  Mutex<HashMap<String, Value>>,
  writes: AtomicUsize,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of `set` calls served so far.
  pub fn write_count(&self) -> usize { self.writes.load(Ordering::Relaxed) }

  fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
    self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl KeyValueStore for MemoryStore {
  type Error = Infallible;

  async fn get<'a>(&'a self, key: &'a str) -> Result<Option<Value>, Infallible> {
    Ok(self.blobs().get(key).cloned())
  }

  async fn set<'a>(&'a self, key: &'a str, value: Value) -> Result<(), Infallible> {
    self.blobs().insert(key.to_owned(), value);
    self.writes.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  async fn contains<'a>(&'a self, key: &'a str) -> Result<bool, Infallible> {
    Ok(self.blobs().contains_key(key))
  }
}
