//! Read-only views over the record store.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sightings/{name}` | Name is resolved through aliases; 404 on a miss |
//! | `GET`  | `/aliases` | Ordered by source |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use lastseen_bot::Scout;
use lastseen_core::{kv::KeyValueStore, resolve::IdentityResolver, sighting::NamedSighting};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Sightings ────────────────────────────────────────────────────────────────

/// `GET /sightings/{name}`
pub async fn get_one<K, R>(
  State(scout): State<Arc<Scout<K, R>>>,
  Path(name): Path<String>,
) -> Result<Json<NamedSighting>, ApiError>
where
  K: KeyValueStore + 'static,
  R: IdentityResolver + 'static,
{
  match scout.sighting(&name).await {
    Some(sighting) => Ok(Json(sighting)),
    None => Err(ApiError::NoSighting(name)),
  }
}

// ─── Aliases ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasPair {
  pub source: String,
  pub target: String,
}

/// `GET /aliases`
pub async fn aliases<K, R>(State(scout): State<Arc<Scout<K, R>>>) -> Json<Vec<AliasPair>>
where
  K: KeyValueStore + 'static,
  R: IdentityResolver + 'static,
{
  let pairs = scout
    .aliases()
    .await
    .into_iter()
    .map(|(source, target)| AliasPair { source, target })
    .collect();
  Json(pairs)
}
