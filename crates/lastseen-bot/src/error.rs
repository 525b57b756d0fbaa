//! Errors raised while interpreting a command.
//!
//! Every variant renders as the reply the user sees; none of them escape
//! [`crate::Scout::execute`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
  #[error("Unknown command '{0}'. Try 'help'.")]
  Unknown(String),

  #[error("{0} is restricted to admins.")]
  Restricted(&'static str),

  /// Malformed arguments; carries the text to show instead.
  #[error("{0}")]
  Usage(String),
}

impl From<clap::Error> for CommandError {
  fn from(e: clap::Error) -> Self { Self::Usage(e.render().to_string().trim_end().to_owned()) }
}

pub type Result<T, E = CommandError> = std::result::Result<T, E>;
