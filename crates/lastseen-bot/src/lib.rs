//! Chat command layer for lastseen.
//!
//! Turns a line of chat text into zero or more reply lines. The command
//! table in [`command`] maps each name to its argument shape, handler and
//! privilege requirement; [`Scout`] owns the record store and serialises
//! every command's read-modify-flush cycle.
//!
//! # Example
//!
//! ```rust,ignore
//! let scout = Scout::open(MemoryStore::new(), Anonymous, BotConfig::default()).await?;
//! let alice = scout.caller("alice");
//! scout.execute(&alice, "report server-1 \"pager, meeting room\"").await;
//! for line in scout.execute(&alice, "find server-1").await {
//!   println!("{line}");
//! }
//! ```

pub mod args;
pub mod command;
pub mod config;
pub mod error;
pub mod scout;
pub mod template;

pub use config::BotConfig;
pub use error::CommandError;
pub use scout::{Caller, Scout};
pub use template::Templates;
