//! Bot configuration, usually nested under `[bot]` in the server config.

use lastseen_core::resolve::fold_username;
use serde::Deserialize;

use crate::template::Templates;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
  /// If set, only lines starting with this prefix are treated as commands;
  /// everything else is ignored silently.
  pub prefix:    Option<String>,
  /// Usernames allowed to run privileged commands.
  pub admins:    Vec<String>,
  /// Usernames known to the identity directory. Names matching one of these
  /// are stored as `@username`.
  pub users:     Vec<String>,
  pub templates: Templates,
}

impl BotConfig {
  pub fn is_admin(&self, username: &str) -> bool {
    let key = fold_username(username);
    self.admins.iter().any(|a| fold_username(a) == key)
  }
}
