//! lastseen server binary.
//!
//! Reads `lastseen.toml` (or the path given with `--config`), opens the
//! SQLite record store, and either serves the HTTP bridge or runs a local
//! line-per-command loop on stdin.
//!
//! ```
//! lastseen serve
//! lastseen repl --user alice
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lastseen_api::ServerConfig;
use lastseen_bot::Scout;
use lastseen_core::resolve::Directory;
use lastseen_store_sqlite::SqliteStore;
use tokio::{
  io::{AsyncBufReadExt, BufReader},
  net::TcpListener,
};
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sightings bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lastseen.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP bridge.
  Serve,
  /// Read commands from stdin, one per line, and print the replies.
  Repl {
    /// Username to issue commands as.
    #[arg(short, long, env = "USER")]
    user: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so repl replies stay clean on stdout.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config, lastseen_api::environment())
    .context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  for blob in store.blobs().await.context("failed to list blobs")? {
    tracing::debug!(key = %blob.key, size = blob.size, updated_at = %blob.updated_at, "stored blob");
  }

  let directory = Directory::new(server_cfg.bot.users.iter().cloned());
  let scout = Scout::open(store, directory, server_cfg.bot.clone())
    .await
    .context("failed to load records")?;
  let scout = Arc::new(scout);

  match cli.command {
    Command::Serve => serve(scout, &server_cfg).await,
    Command::Repl { user } => repl(&scout, &user).await,
  }
}

async fn serve(
  scout: Arc<Scout<SqliteStore, Directory>>,
  server_cfg: &ServerConfig,
) -> anyhow::Result<()> {
  let app = lastseen_api::api_router(scout).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn repl(scout: &Scout<SqliteStore, Directory>, user: &str) -> anyhow::Result<()> {
  let caller = scout.caller(user);
  tracing::info!(user = %caller.username, admin = caller.admin, "repl started");

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
    for reply in scout.execute(&caller, &line).await {
      println!("{reply}");
    }
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
