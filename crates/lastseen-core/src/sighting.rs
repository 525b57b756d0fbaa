//! Sighting — the most recent report of where a target was seen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single report. The canonical target name is the key it is stored under
/// and is not repeated inside the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
  /// Normalised identity of the reporting user (`@username`).
  pub reporter:  String,
  pub location:  String,
  /// Server-assigned; set when the report is filed.
  pub timestamp: DateTime<Utc>,
}

/// A sighting paired with the name it is stored under, for outward-facing
/// views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSighting {
  pub target:   String,
  #[serde(flatten)]
  pub sighting: Sighting,
}
