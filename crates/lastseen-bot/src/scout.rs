//! [`Scout`] — the service that owns the record store and runs commands.

use chrono::Utc;
use lastseen_core::{
  kv::KeyValueStore,
  records::Records,
  resolve::IdentityResolver,
  sighting::NamedSighting,
};
use tokio::sync::Mutex;

use crate::{
  command::{Context, dispatch},
  config::BotConfig,
};

/// Who is issuing a command, as reported by the chat host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  /// Bare username, without a leading `@`.
  pub username: String,
  pub admin:    bool,
}

impl Caller {
  pub fn new(username: impl Into<String>, admin: bool) -> Self {
    let username: String = username.into();
    Self {
      username: username.trim().trim_start_matches('@').to_owned(),
      admin,
    }
  }
}

/// A record store bound to a persistence backend and an identity resolver.
///
/// Every command holds the store lock for its whole read-modify-flush cycle,
/// so concurrent callers are serialised and never lose each other's writes.
pub struct Scout<K, R> {
  kv:         K,
  identities: R,
  config:     BotConfig,
  records:    Mutex<Records>,
}

impl<K, R> Scout<K, R>
where
  K: KeyValueStore,
  R: IdentityResolver,
{
  /// Load the records from `kv` and persist any missing top-level keys.
  pub async fn open(kv: K, identities: R, config: BotConfig) -> lastseen_core::Result<Self> {
    let mut records = Records::load(&kv).await?;
    records.flush(&kv).await?;
    tracing::info!(
      sightings = records.sightings().count(),
      aliases = records.aliases().count(),
      "records loaded"
    );
    Ok(Self {
      kv,
      identities,
      config,
      records: Mutex::new(records),
    })
  }

  pub fn store(&self) -> &K { &self.kv }

  pub fn config(&self) -> &BotConfig { &self.config }

  /// Describe `username` as a caller, granting admin rights per config.
  pub fn caller(&self, username: &str) -> Caller {
    Caller::new(username, self.config.is_admin(username))
  }

  /// Run one line of chat text and return the reply lines.
  ///
  /// Never fails: malformed input, refused privileges and storage failures
  /// all come back as reply text.
  pub async fn execute(&self, caller: &Caller, text: &str) -> Vec<String> {
    let line = match &self.config.prefix {
      Some(prefix) => match text.trim_start().strip_prefix(prefix.as_str()) {
        Some(rest) => rest,
        None => return Vec::new(),
      },
      None => text,
    };

    let mut records = self.records.lock().await;
    let outcome = dispatch(
      &mut Context {
        records:    &mut *records,
        identities: &self.identities,
        templates:  &self.config.templates,
        caller,
        now:        Utc::now(),
      },
      line,
    );
    let mut lines = outcome.unwrap_or_else(|e| vec![e.to_string()]);

    if records.is_dirty()
      && let Err(e) = records.flush(&self.kv).await
    {
      tracing::error!(error = %e, "failed to persist records");
      lines.push(format!("Storage error: {e}"));
    }
    lines
  }

  /// The sighting `name` resolves to, if any.
  pub async fn sighting(&self, name: &str) -> Option<NamedSighting> {
    let records = self.records.lock().await;
    let target = records.resolve(&self.identities, name);
    let sighting = records.find(&target)?.clone();
    Some(NamedSighting { target, sighting })
  }

  /// Every alias as `(source, target)`, ordered by source.
  pub async fn aliases(&self) -> Vec<(String, String)> {
    self
      .records
      .lock()
      .await
      .aliases()
      .map(|(s, t)| (s.to_owned(), t.to_owned()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use lastseen_core::{
    kv::MemoryStore,
    resolve::{Anonymous, Directory},
  };
  use serde_json::Value;

  use super::*;
  use crate::template::Templates;

  fn config() -> BotConfig {
    BotConfig {
      admins: vec!["root".into()],
      ..BotConfig::default()
    }
  }

  async fn scout() -> Scout<MemoryStore, Anonymous> {
    Scout::open(MemoryStore::new(), Anonymous, config()).await.unwrap()
  }

  async fn run<K: KeyValueStore, R: IdentityResolver>(
    scout: &Scout<K, R>,
    user: &str,
    line: &str,
  ) -> Vec<String> {
    scout.execute(&scout.caller(user), line).await
  }

  // ── Report / find ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn report_then_find_end_to_end() {
    let s = scout().await;
    assert_eq!(
      run(&s, "alice", r#"report server-1 "pager, meeting room""#).await,
      ["Sighting of server-1 recorded."]
    );
    assert_eq!(
      run(&s, "bob", "find server-1").await,
      ["server-1 was last seen just now at pager, meeting room, reported by @alice."]
    );
  }

  #[tokio::test]
  async fn find_several_names_with_miss() {
    let s = scout().await;
    run(&s, "alice", "report lamp attic").await;
    let lines = run(&s, "bob", "find lamp, ghost").await;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("lamp was last seen"));
    assert_eq!(lines[1], "No sightings of ghost reported.");
  }

  #[tokio::test]
  async fn legacy_spot_and_unquoted_location() {
    let s = scout().await;
    run(&s, "alice", "spot lamp the attic shelf").await;
    assert_eq!(s.sighting("lamp").await.unwrap().sighting.location, "the attic shelf");
  }

  #[tokio::test]
  async fn report_with_bad_info_still_records() {
    let s = scout().await;
    let lines = run(&s, "alice", "report lamp attic --info 'a: ['").await;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Failed to parse info for lamp: "));
    assert_eq!(lines[1], "Sighting of lamp recorded.");
    assert!(s.sighting("lamp").await.is_some());
  }

  #[tokio::test]
  async fn report_usage_on_missing_location() {
    let s = scout().await;
    let lines = run(&s, "alice", "report lamp").await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Usage"));
    assert!(s.sighting("lamp").await.is_none());
  }

  #[tokio::test]
  async fn identities_are_normalised() {
    let s = Scout::open(MemoryStore::new(), Directory::new(["carol"]), config())
      .await
      .unwrap();
    run(&s, "alice", "report Carol kitchen").await;
    let found = s.sighting("@carol").await.unwrap();
    assert_eq!(found.target, "@carol");
    assert_eq!(found.sighting.reporter, "@alice");
  }

  // ── Aliases ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn alias_lifecycle() {
    let s = scout().await;
    assert_eq!(run(&s, "u", "alias srv;server-1").await, [
      "Added alias srv to server-1."
    ]);
    assert_eq!(run(&s, "u", "alias srv;other").await, [
      "srv is already aliased to server-1; nothing changed."
    ]);
    assert_eq!(run(&s, "u", "alias only-one").await, [
      "Argument requires two arguments separated by a ;"
    ]);

    run(&s, "u", "report srv rack 4").await;
    assert!(s.sighting("server-1").await.is_some());
    assert_eq!(run(&s, "u", "list-aliases").await, ["srv maps to server-1"]);

    assert!(run(&s, "u", "unalias srv;missing").await.is_empty());
    assert_eq!(run(&s, "u", "lsalias").await, ["No aliases currently listed."]);
  }

  // ── Privileged commands ───────────────────────────────────────────────────

  #[tokio::test]
  async fn privileged_commands_are_refused_for_users() {
    let s = scout().await;
    run(&s, "alice", "report lamp attic").await;
    for line in ["remove lamp", "clear", "compact"] {
      let name = line.split(' ').next().unwrap();
      assert_eq!(run(&s, "alice", line).await, [format!(
        "{name} is restricted to admins."
      )]);
    }
    assert!(s.sighting("lamp").await.is_some());
  }

  #[tokio::test]
  async fn remove_reports_only_present_names() {
    let s = scout().await;
    run(&s, "alice", "report x here").await;
    run(&s, "alice", "report z there").await;
    assert_eq!(run(&s, "root", "remove x, y").await, ["Removed x"]);
    assert_eq!(run(&s, "root", "remove y").await, ["No sightings removed."]);
    assert!(s.sighting("z").await.is_some());
  }

  #[tokio::test]
  async fn clear_with_and_without_info() {
    let s = scout().await;
    run(&s, "alice", "report x here --info 'k: v'").await;
    assert_eq!(run(&s, "root", "clear").await, ["All sightings removed."]);
    assert!(s.sighting("x").await.is_none());
    assert_eq!(run(&s, "u", "info x").await, ["Information for x:\nk: v"]);

    run(&s, "root", "clear --info").await;
    assert_eq!(run(&s, "u", "info x").await, ["No information for x."]);
  }

  #[tokio::test]
  async fn compact_through_command() {
    let s = scout().await;
    run(&s, "alice", "report A desk").await;
    run(&s, "u", "alias A;B").await;
    let lines = run(&s, "root", "compact").await;
    assert!(lines[0].starts_with("Compacted: 1 sightings"));
    assert!(s.sighting("B").await.is_some());
    assert_eq!(run(&s, "root", "compact").await, ["Nothing to compact."]);
  }

  // ── Info ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn info_update_list_remove() {
    let s = scout().await;
    assert_eq!(run(&s, "u", "info lamp").await, ["No information for lamp."]);
    assert_eq!(run(&s, "u", "info lamp --update 'watts: 60'").await, [
      "Info updated for lamp"
    ]);
    assert_eq!(run(&s, "u", "info lamp --list").await, [
      "Information for lamp:\nwatts: 60"
    ]);
    let err = run(&s, "u", "info lamp -u 'watts: ['").await;
    assert!(err[0].starts_with("Error in updating lamp: "));
    assert_eq!(run(&s, "u", "info lamp --remove").await, [
      "Information removed for lamp"
    ]);
    assert_eq!(run(&s, "u", "info lamp -r").await, [
      "No information for lamp to remove"
    ]);
  }

  // ── Dispatch edges ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_and_empty_commands() {
    let s = scout().await;
    assert_eq!(run(&s, "u", "teleport lamp").await, [
      "Unknown command 'teleport'. Try 'help'."
    ]);
    assert!(run(&s, "u", "   ").await.is_empty());
  }

  #[tokio::test]
  async fn help_hides_admin_commands_from_users() {
    let s = scout().await;
    let user = run(&s, "u", "help").await;
    let admin = run(&s, "root", "help").await;
    assert!(user.iter().all(|l| !l.contains("(admin)")));
    assert_eq!(admin.len(), crate::command::COMMANDS.len());
  }

  #[tokio::test]
  async fn prefix_filters_chatter() {
    let config = BotConfig {
      prefix: Some("!scout ".into()),
      ..config()
    };
    let s = Scout::open(MemoryStore::new(), Anonymous, config).await.unwrap();
    assert!(run(&s, "u", "find lamp").await.is_empty());
    assert_eq!(run(&s, "u", "!scout find lamp").await, [
      "No sightings of lamp reported."
    ]);
  }

  #[tokio::test]
  async fn custom_templates_are_used() {
    let config = BotConfig {
      templates: Templates {
        miss: "?? {target}".into(),
        ..Templates::default()
      },
      ..config()
    };
    let s = Scout::open(MemoryStore::new(), Anonymous, config).await.unwrap();
    assert_eq!(run(&s, "u", "find lamp").await, ["?? lamp"]);
  }

  // ── Persistence ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn commands_flush_to_backend() {
    let s = scout().await;
    run(&s, "alice", "report lamp attic").await;
    let blob = s.store().get("sightings").await.unwrap().unwrap();
    assert_eq!(blob["lamp"]["location"], Value::from("attic"));
    assert_eq!(blob["lamp"]["reporter"], Value::from("@alice"));
  }

  /// A backend whose writes always fail.
  struct BrokenStore;

  #[derive(Debug, thiserror::Error)]
  #[error("disk on fire")]
  struct Fire;

  impl KeyValueStore for BrokenStore {
    type Error = Fire;

    async fn get<'a>(&'a self, _key: &'a str) -> Result<Option<Value>, Fire> {
      Ok(Some(Value::Object(Default::default())))
    }

    async fn set<'a>(&'a self, _key: &'a str, _value: Value) -> Result<(), Fire> {
      Err(Fire)
    }

    async fn contains<'a>(&'a self, _key: &'a str) -> Result<bool, Fire> { Ok(true) }
  }

  #[tokio::test]
  async fn storage_failure_is_reported_not_raised() {
    // Every key already exists and is empty, so open has nothing to flush.
    let s = Scout::open(BrokenStore, Anonymous, config()).await.unwrap();
    let lines = run(&s, "alice", "report lamp attic").await;
    assert_eq!(lines, [
      "Sighting of lamp recorded.",
      "Storage error: backend error: disk on fire"
    ]);
    // The in-memory state stays authoritative.
    assert!(s.sighting("lamp").await.is_some());
  }

  #[tokio::test]
  async fn concurrent_reports_are_not_lost() {
    let s = Arc::new(scout().await);
    let tasks: Vec<_> = (0..16)
      .map(|i| {
        let s = Arc::clone(&s);
        tokio::spawn(async move { run(&s, "u", &format!("report item-{i} shelf-{i}")).await })
      })
      .collect();
    for task in tasks {
      task.await.unwrap();
    }

    let blob = s.store().get("sightings").await.unwrap().unwrap();
    assert_eq!(blob.as_object().map(|m| m.len()), Some(16));
  }
}
