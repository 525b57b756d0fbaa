//! Errors returned by the HTTP bridge, rendered as `{"error": ...}` bodies.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// Nothing has been reported under the resolved name.
  #[error("no sighting of {0}")]
  NoSighting(String),

  /// A command arrived without a usable sender.
  #[error("user must not be empty")]
  MissingUser,
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      Self::NoSighting(_) => StatusCode::NOT_FOUND,
      Self::MissingUser => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = match &self {
      Self::NoSighting(target) => json!({ "error": self.to_string(), "target": target }),
      Self::MissingUser => json!({ "error": self.to_string() }),
    };
    (self.status(), Json(body)).into_response()
  }
}
