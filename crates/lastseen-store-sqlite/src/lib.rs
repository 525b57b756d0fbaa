//! SQLite backend for the lastseen record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Records are kept as a few JSON blobs in
//! a single key-value table.

mod encode;
mod schema;
mod store;

pub mod error;

pub use encode::BlobMeta;
pub use error::{Error, Result};
pub use store::SqliteStore;
