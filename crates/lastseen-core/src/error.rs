//! Error types for `lastseen-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The supplied info document could not be parsed or validated.
  #[error("{0}")]
  InfoParse(String),

  #[error("corrupt {key} blob: {source}")]
  CorruptBlob {
    key:    &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn backend<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
