//! Core types and trait definitions for the lastseen sighting store.
//!
//! This crate is deliberately free of HTTP, chat and database dependencies.
//! It holds the record model, alias resolution, the elapsed-time formatter and
//! the key-value abstraction that storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod humanize;
pub mod info;
pub mod kv;
pub mod records;
pub mod resolve;
pub mod sighting;

pub use error::{Error, Result};
