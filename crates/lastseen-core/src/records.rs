//! [`Records`] — the in-process record store.
//!
//! Owns the three persisted maps (sightings, info, aliases). All mutations
//! are synchronous and in-memory; [`Records::load`] and [`Records::flush`]
//! are the only points where a [`KeyValueStore`] is touched. Each map is
//! written back as a whole blob, and only when it changed since the last
//! load or flush.

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::{
  Error, Result,
  info::{InfoRecord, parse_info},
  kv::KeyValueStore,
  resolve::{IdentityResolver, resolve_name},
  sighting::Sighting,
};

pub const SIGHTINGS_KEY: &str = "sightings";
pub const INFO_KEY: &str = "info";
pub const ALIASES_KEY: &str = "aliases";

/// Which maps have changed since they were last persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Dirty {
  sightings: bool,
  info:      bool,
  aliases:   bool,
}

/// Counts reported by [`Records::compact`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactSummary {
  /// Sightings relocated from an aliased name to its target.
  pub sightings_moved:     usize,
  /// Sightings dropped because the other side of a collision was newer.
  pub sightings_discarded: usize,
  pub info_moved:          usize,
  pub info_discarded:      usize,
}

impl CompactSummary {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Records {
  sightings: BTreeMap<String, Sighting>,
  info:      BTreeMap<String, InfoRecord>,
  aliases:   BTreeMap<String, String>,
  dirty:     Dirty,
}

impl Records {
  pub fn new() -> Self { Self::default() }

  // ── Persistence ───────────────────────────────────────────────────────────

  /// Load all three maps from `kv`. Keys that do not exist yet load as empty
  /// maps and are marked dirty so the next flush creates them.
  pub async fn load<K: KeyValueStore>(kv: &K) -> Result<Self> {
    let (sightings, fresh_sightings) = read_map(kv, SIGHTINGS_KEY).await?;
    let (info, fresh_info) = read_map(kv, INFO_KEY).await?;
    let (aliases, fresh_aliases) = read_map(kv, ALIASES_KEY).await?;

    Ok(Self {
      sightings,
      info,
      aliases,
      dirty: Dirty {
        sightings: fresh_sightings,
        info:      fresh_info,
        aliases:   fresh_aliases,
      },
    })
  }

  /// Write every dirty map back to `kv`. Returns the number of blobs
  /// written. A map stays dirty if its write fails.
  pub async fn flush<K: KeyValueStore>(&mut self, kv: &K) -> Result<usize> {
    let mut written = 0;

    if self.dirty.sightings {
      let blob = serde_json::to_value(&self.sightings)?;
      kv.set(SIGHTINGS_KEY, blob).await.map_err(Error::backend)?;
      self.dirty.sightings = false;
      written += 1;
    }
    if self.dirty.info {
      let blob = serde_json::to_value(&self.info)?;
      kv.set(INFO_KEY, blob).await.map_err(Error::backend)?;
      self.dirty.info = false;
      written += 1;
    }
    if self.dirty.aliases {
      let blob = serde_json::to_value(&self.aliases)?;
      kv.set(ALIASES_KEY, blob).await.map_err(Error::backend)?;
      self.dirty.aliases = false;
      written += 1;
    }

    Ok(written)
  }

  pub fn is_dirty(&self) -> bool { self.dirty != Dirty::default() }

  // ── Names ─────────────────────────────────────────────────────────────────

  /// Resolve raw text to a canonical name through the alias map and
  /// `identities`.
  pub fn resolve<R>(&self, identities: &R, text: &str) -> String
  where
    R: IdentityResolver + ?Sized,
  {
    resolve_name(&self.aliases, identities, text)
  }

  // ── Sightings ─────────────────────────────────────────────────────────────

  /// Record that `target` was seen at `location`. Returns the sighting it
  /// replaced, if any.
  pub fn report(
    &mut self,
    target: impl Into<String>,
    reporter: impl Into<String>,
    location: impl Into<String>,
    at: DateTime<Utc>,
  ) -> Option<Sighting> {
    self.dirty.sightings = true;
    self.sightings.insert(target.into(), Sighting {
      reporter:  reporter.into(),
      location:  location.into(),
      timestamp: at,
    })
  }

  pub fn find(&self, target: &str) -> Option<&Sighting> { self.sightings.get(target) }

  pub fn sightings(&self) -> impl Iterator<Item = (&str, &Sighting)> + '_ {
    self.sightings.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Delete the sighting and info for each name. Returns, in input order,
  /// the names whose sighting was actually removed.
  pub fn remove<'a, I>(&mut self, targets: I) -> Vec<String>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut removed = Vec::new();
    for target in targets {
      if self.sightings.remove(target).is_some() {
        self.dirty.sightings = true;
        removed.push(target.to_owned());
      }
      if self.info.remove(target).is_some() {
        self.dirty.info = true;
      }
    }
    removed
  }

  /// Delete every sighting, and every info document if `include_info`.
  pub fn clear(&mut self, include_info: bool) {
    if !self.sightings.is_empty() {
      self.sightings.clear();
      self.dirty.sightings = true;
    }
    if include_info && !self.info.is_empty() {
      self.info.clear();
      self.dirty.info = true;
    }
  }

  // ── Info ──────────────────────────────────────────────────────────────────

  /// Parse `text` and store it as the info document for `target`. On a parse
  /// failure nothing is changed.
  pub fn update_info(
    &mut self,
    target: impl Into<String>,
    text: &str,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let document = parse_info(text)?;
    self.info.insert(target.into(), InfoRecord { document, updated_at: at });
    self.dirty.info = true;
    Ok(())
  }

  pub fn info(&self, target: &str) -> Option<&InfoRecord> { self.info.get(target) }

  /// Returns `false` if there was nothing to remove.
  pub fn remove_info(&mut self, target: &str) -> bool {
    let removed = self.info.remove(target).is_some();
    self.dirty.info |= removed;
    removed
  }

  // ── Aliases ───────────────────────────────────────────────────────────────

  /// Map `source` to `target`. The first registration wins; returns `false`
  /// without changing anything if `source` already has an alias.
  pub fn add_alias(
    &mut self,
    source: impl Into<String>,
    target: impl Into<String>,
  ) -> bool {
    match self.aliases.entry(source.into()) {
      Entry::Occupied(_) => false,
      Entry::Vacant(slot) => {
        slot.insert(target.into());
        self.dirty.aliases = true;
        true
      }
    }
  }

  pub fn alias_of(&self, source: &str) -> Option<&str> {
    self.aliases.get(source).map(String::as_str)
  }

  /// Remove each alias that exists. Returns how many were removed.
  pub fn remove_aliases<'a, I>(&mut self, sources: I) -> usize
  where
    I: IntoIterator<Item = &'a str>,
  {
    let removed = sources
      .into_iter()
      .filter(|s| self.aliases.remove(*s).is_some())
      .count();
    self.dirty.aliases |= removed > 0;
    removed
  }

  /// `(source, target)` pairs ordered by source.
  pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    self.aliases.iter().map(|(s, t)| (s.as_str(), t.as_str()))
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  /// Move sightings and info stored under aliased names to the alias
  /// targets. Each record moves one hop. On collision the record with the
  /// later timestamp is kept; ties keep the record already at the target.
  pub fn compact(&mut self) -> CompactSummary {
    let (sightings_moved, sightings_discarded) =
      migrate(&mut self.sightings, &self.aliases, |s| s.timestamp);
    let (info_moved, info_discarded) =
      migrate(&mut self.info, &self.aliases, |i| i.updated_at);

    let summary = CompactSummary {
      sightings_moved,
      sightings_discarded,
      info_moved,
      info_discarded,
    };
    self.dirty.sightings |= sightings_moved + sightings_discarded > 0;
    self.dirty.info |= info_moved + info_discarded > 0;
    summary
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Returns the decoded map and whether the key was absent.
async fn read_map<K, T>(kv: &K, key: &'static str) -> Result<(BTreeMap<String, T>, bool)>
where
  K: KeyValueStore,
  T: DeserializeOwned,
{
  if !kv.contains(key).await.map_err(Error::backend)? {
    return Ok((BTreeMap::new(), true));
  }
  match kv.get(key).await.map_err(Error::backend)? {
    Some(blob) => {
      let map = serde_json::from_value(blob)
        .map_err(|source| Error::CorruptBlob { key, source })?;
      Ok((map, false))
    }
    None => Ok((BTreeMap::new(), true)),
  }
}

/// Returns `(moved, discarded)`.
fn migrate<T>(
  map: &mut BTreeMap<String, T>,
  aliases: &BTreeMap<String, String>,
  stamp: impl Fn(&T) -> DateTime<Utc>,
) -> (usize, usize) {
  // Lift every mover out first so a record never travels more than one hop.
  let movers: Vec<(String, String)> = map
    .keys()
    .filter_map(|source| {
      let target = aliases.get(source)?;
      (target != source).then(|| (source.clone(), target.clone()))
    })
    .collect();
  let lifted: Vec<(String, T)> = movers
    .into_iter()
    .filter_map(|(source, target)| map.remove(&source).map(|r| (target, r)))
    .collect();

  let (mut moved, mut discarded) = (0, 0);
  for (target, record) in lifted {
    match map.entry(target) {
      Entry::Vacant(slot) => {
        slot.insert(record);
        moved += 1;
      }
      Entry::Occupied(mut slot) => {
        if stamp(&record) > stamp(slot.get()) {
          slot.insert(record);
          moved += 1;
        }
        discarded += 1;
      }
    }
  }
  (moved, discarded)
}
