//! Handler for `/commands` — the chat bridge entry point.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/commands` | Body: [`CommandBody`]; returns [`CommandReply`] |

use std::sync::Arc;

use axum::{Json, extract::State};
use lastseen_bot::Scout;
use lastseen_core::{kv::KeyValueStore, resolve::IdentityResolver};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// One chat message addressed to the bot.
#[derive(Debug, Deserialize)]
pub struct CommandBody {
  /// Username of the sender as known to the chat host.
  pub user: String,
  pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandReply {
  /// Reply lines, in order. Empty when the bot has nothing to say.
  pub lines: Vec<String>,
}

/// `POST /commands` — body: `{"user":"alice","text":"find lamp"}`
pub async fn run<K, R>(
  State(scout): State<Arc<Scout<K, R>>>,
  Json(body): Json<CommandBody>,
) -> Result<Json<CommandReply>, ApiError>
where
  K: KeyValueStore + 'static,
  R: IdentityResolver + 'static,
{
  if body.user.trim().trim_start_matches('@').is_empty() {
    return Err(ApiError::MissingUser);
  }
  let caller = scout.caller(&body.user);
  let lines = scout.execute(&caller, &body.text).await;
  Ok(Json(CommandReply { lines }))
}
