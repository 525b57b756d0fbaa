//! Info documents — free-form metadata attached to a target.
//!
//! Users supply YAML. It is parsed once at the boundary into a closed,
//! recursively-typed [`InfoValue`]; anything outside that model (nulls,
//! non-string keys, tagged values, non-finite floats) is rejected with
//! [`Error::InfoParse`] rather than stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Value as Yaml;

use crate::{Error, Result};

// ─── Document model ──────────────────────────────────────────────────────────

/// A validated info document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
  Bool(bool),
  Integer(i64),
  Float(f64),
  String(String),
  List(Vec<InfoValue>),
  Map(BTreeMap<String, InfoValue>),
}

/// An info document together with the instant it was last written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
  pub document:   InfoValue,
  pub updated_at: DateTime<Utc>,
}

// ─── Parse / render ──────────────────────────────────────────────────────────

/// Parse user-supplied YAML into a validated [`InfoValue`].
pub fn parse_info(text: &str) -> Result<InfoValue> {
  let raw: Yaml =
    serde_yaml::from_str(text).map_err(|e| Error::InfoParse(e.to_string()))?;
  if raw.is_null() {
    return Err(Error::InfoParse("document is empty".into()));
  }
  convert(raw, "document")
}

/// Render a document back to block-style YAML.
pub fn render_info(value: &InfoValue) -> Result<String> {
  serde_yaml::to_string(value).map_err(|e| Error::InfoParse(e.to_string()))
}

fn convert(raw: Yaml, path: &str) -> Result<InfoValue> {
  match raw {
    Yaml::Null => Err(Error::InfoParse(format!("empty value at {path}"))),
    Yaml::Bool(b) => Ok(InfoValue::Bool(b)),
    Yaml::Number(n) => {
      if let Some(i) = n.as_i64() {
        Ok(InfoValue::Integer(i))
      } else {
        match n.as_f64() {
          Some(f) if f.is_finite() => Ok(InfoValue::Float(f)),
          _ => Err(Error::InfoParse(format!("non-finite number at {path}"))),
        }
      }
    }
    Yaml::String(s) => Ok(InfoValue::String(s)),
    Yaml::Sequence(items) => items
      .into_iter()
      .enumerate()
      .map(|(i, item)| convert(item, &format!("{path}[{i}]")))
      .collect::<Result<Vec<_>>>()
      .map(InfoValue::List),
    Yaml::Mapping(entries) => {
      let mut map = BTreeMap::new();
      for (key, value) in entries {
        let Yaml::String(key) = key else {
          return Err(Error::InfoParse(format!(
            "map keys must be strings at {path}"
          )));
        };
        let child = convert(value, &format!("{path}.{key}"))?;
        map.insert(key, child);
      }
      Ok(InfoValue::Map(map))
    }
    Yaml::Tagged(tagged) => Err(Error::InfoParse(format!(
      "tagged value {} at {path} is not supported",
      tagged.tag
    ))),
  }
}
