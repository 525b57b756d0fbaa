//! Name resolution — turning raw user text into a canonical storage key.
//!
//! Resolution never fails: an alias is substituted if one exists (single
//! hop), a known chat identity is normalised to `@username`, and anything
//! else is used verbatim.

use std::collections::{BTreeMap, HashMap};

/// Answers "is this text a chat identity, and if so whose?".
///
/// The chat host owns the real identity service; implementations adapt it.
pub trait IdentityResolver: Send + Sync {
  /// Return the bare username (no `@`) if `text` names a known identity.
  fn resolve_identity(&self, text: &str) -> Option<String>;
}

/// Knows no identities; every name resolves to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityResolver for Anonymous {
  fn resolve_identity(&self, _text: &str) -> Option<String> { None }
}

/// A fixed set of known usernames, matched case-insensitively with or
/// without a leading `@`.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  /// lowercase → configured spelling
  users: HashMap<String, String>,
}

impl Directory {
  pub fn new<I, S>(users: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let users = users
      .into_iter()
      .map(Into::into)
      .map(|u| u.trim().trim_start_matches('@').to_owned())
      .filter(|u| !u.is_empty())
      .map(|u| (fold_username(&u), u))
      .collect();
    Self { users }
  }

  pub fn len(&self) -> usize { self.users.len() }

  pub fn is_empty(&self) -> bool { self.users.is_empty() }
}

impl IdentityResolver for Directory {
  fn resolve_identity(&self, text: &str) -> Option<String> {
    self.users.get(&fold_username(text)).cloned()
  }
}

/// Comparison key for usernames: trimmed, without a leading `@`, and
/// lowercased with full Unicode case mapping.
pub fn fold_username(username: &str) -> String {
  username.trim().trim_start_matches('@').to_lowercase()
}

/// Format a bare username the way reporters and identities are stored.
pub fn at_handle(username: &str) -> String {
  format!("@{}", username.trim_start_matches('@'))
}

/// Resolve `text` to the canonical name used as a storage key.
pub fn resolve_name<R>(
  aliases: &BTreeMap<String, String>,
  identities: &R,
  text: &str,
) -> String
where
  R: IdentityResolver + ?Sized,
{
  let text = text.trim();
  let name = aliases.get(text).map(String::as_str).unwrap_or(text);
  match identities.resolve_identity(name) {
    Some(username) => at_handle(&username),
    None => name.to_owned(),
  }
}
