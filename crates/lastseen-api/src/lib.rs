//! HTTP bridge for lastseen.
//!
//! Exposes an axum [`Router`] over a [`Scout`]: a chat host forwards each
//! message to `POST /commands` and posts the returned lines back to the
//! channel. Auth and TLS are the deployer's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/bot", lastseen_api::api_router(scout.clone()))
//! ```

pub mod commands;
pub mod error;
pub mod sightings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  routing::{get, post},
};
use lastseen_bot::{BotConfig, Scout};
use lastseen_core::{kv::KeyValueStore, resolve::IdentityResolver};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `lastseen.toml` and
/// `LASTSEEN_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub bot:        BotConfig,
}

impl ServerConfig {
  /// Layer defaults, the optional TOML file at `file`, and `env` (usually
  /// [`environment`]), then deserialise.
  pub fn load(file: &Path, env: config::Environment) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8450)?
      .set_default("store_path", "~/.local/share/lastseen/lastseen.db")?
      .add_source(config::File::from(file).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }
}

/// `LASTSEEN_*` variables; `__` separates nested keys, as in
/// `LASTSEEN_BOT__PREFIX`.
pub fn environment() -> config::Environment {
  config::Environment::with_prefix("LASTSEEN")
    .prefix_separator("_")
    .separator("__")
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `scout`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<K, R>(scout: Arc<Scout<K, R>>) -> Router<()>
where
  K: KeyValueStore + 'static,
  R: IdentityResolver + 'static,
{
  Router::new()
    .route("/commands", post(commands::run::<K, R>))
    .route("/sightings/{name}", get(sightings::get_one::<K, R>))
    .route("/aliases", get(sightings::aliases::<K, R>))
    .with_state(scout)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use lastseen_core::{kv::MemoryStore, resolve::Anonymous};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;
  use crate::{commands::CommandReply, sightings::AliasPair};

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let vars = vars
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect::<config::Map<_, _>>();
    environment().source(Some(vars))
  }

  #[test]
  fn config_defaults_without_file_or_env() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/lastseen.toml"), env(&[])).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8450);
    assert!(cfg.bot.prefix.is_none());
  }

  #[test]
  fn config_reads_single_underscore_prefix() {
    let cfg = ServerConfig::load(
      Path::new("/nonexistent/lastseen.toml"),
      env(&[
        ("LASTSEEN_STORE_PATH", "/single/underscore.db"),
        ("LASTSEEN_PORT", "9999"),
        ("LASTSEEN_BOT__PREFIX", "!"),
      ]),
    )
    .unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("/single/underscore.db"));
    assert_eq!(cfg.port, 9999);
    assert_eq!(cfg.bot.prefix.as_deref(), Some("!"));
  }

  #[test]
  fn env_overrides_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::io::Write::write_all(
      &mut file,
      b"port = 7000\nstore_path = \"/from/file.db\"\n\n[bot]\nadmins = [\"root\"]\n",
    )
    .unwrap();

    let cfg = ServerConfig::load(file.path(), env(&[("LASTSEEN_PORT", "7100")])).unwrap();
    assert_eq!(cfg.port, 7100);
    assert_eq!(cfg.store_path, PathBuf::from("/from/file.db"));
    assert_eq!(cfg.bot.admins, ["root"]);
  }

  async fn router() -> Router {
    let config = BotConfig {
      admins: vec!["root".into()],
      ..BotConfig::default()
    };
    let scout = Scout::open(MemoryStore::new(), Anonymous, config)
      .await
      .unwrap();
    api_router(Arc::new(scout))
  }

  async fn post_command(app: &Router, user: &str, text: &str) -> Response {
    let body = json!({ "user": user, "text": text }).to_string();
    app
      .clone()
      .oneshot(
        Request::post("/commands")
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(body))
          .unwrap(),
      )
      .await
      .unwrap()
  }

  async fn get(app: &Router, uri: &str) -> Response {
    app
      .clone()
      .oneshot(Request::get(uri).body(Body::empty()).unwrap())
      .await
      .unwrap()
  }

  async fn json_body<T: serde::de::DeserializeOwned>(res: Response) -> T {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn command_round_trip() {
    let app = router().await;

    let res = post_command(&app, "alice", "report lamp attic").await;
    assert_eq!(res.status(), StatusCode::OK);
    let reply: CommandReply = json_body(res).await;
    assert_eq!(reply.lines, ["Sighting of lamp recorded."]);

    let reply: CommandReply = json_body(post_command(&app, "bob", "find lamp").await).await;
    assert_eq!(reply.lines.len(), 1);
    assert!(reply.lines[0].contains("attic"));
  }

  #[tokio::test]
  async fn empty_user_is_rejected() {
    let app = router().await;
    let res = post_command(&app, " @ ", "find lamp").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(res).await;
    assert_eq!(body["error"], "user must not be empty");
  }

  #[tokio::test]
  async fn sighting_lookup_resolves_aliases() {
    let app = router().await;
    post_command(&app, "alice", "report server-1 rack 4").await;
    post_command(&app, "alice", "alias srv;server-1").await;

    let res = get(&app, "/sightings/srv").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = json_body(res).await;
    assert_eq!(body["target"], "server-1");
    assert_eq!(body["location"], "rack 4");
    assert_eq!(body["reporter"], "@alice");
  }

  #[tokio::test]
  async fn missing_sighting_is_404() {
    let app = router().await;
    let res = get(&app, "/sightings/ghost").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(res).await;
    assert_eq!(body["error"], "no sighting of ghost");
    assert_eq!(body["target"], "ghost");
  }

  #[tokio::test]
  async fn aliases_are_listed() {
    let app = router().await;
    post_command(&app, "u", "alias b;2").await;
    post_command(&app, "u", "alias a;1").await;

    let pairs: Vec<AliasPair> = json_body(get(&app, "/aliases").await).await;
    assert_eq!(pairs, [
      AliasPair { source: "a".into(), target: "1".into() },
      AliasPair { source: "b".into(), target: "2".into() },
    ]);
  }
}
