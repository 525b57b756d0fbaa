//! Calendar-aware rendering of the time between two instants.
//!
//! The difference is decomposed the way a person reads a calendar: whole
//! months first (clamping to the end of shorter months), then fixed-length
//! days, hours, minutes and seconds for the remainder. "Jan 31 → Mar 1" is
//! therefore one month and a day or so, never "29 days".

use chrono::{DateTime, Datelike, Months, Utc};

const UNITS: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

/// A civil difference between two instants. All fields are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CivilDelta {
  pub years:   u64,
  pub months:  u64,
  pub days:    u64,
  pub hours:   u64,
  pub minutes: u64,
  pub seconds: u64,
}

impl CivilDelta {
  /// Components ordered from the largest unit to the smallest.
  pub fn components(&self) -> [u64; 6] {
    [
      self.years,
      self.months,
      self.days,
      self.hours,
      self.minutes,
      self.seconds,
    ]
  }

  pub fn is_zero(&self) -> bool { self.components().iter().all(|&n| n == 0) }
}

/// Compute the civil difference between two instants.
///
/// Argument order does not matter; the magnitudes are always non-negative.
/// Sub-second precision is discarded.
pub fn civil_delta(earlier: DateTime<Utc>, later: DateTime<Utc>) -> CivilDelta {
  let (earlier, later) = if later < earlier {
    (later, earlier)
  } else {
    (earlier, later)
  };

  let span = (later.year() - earlier.year()) * 12 + later.month() as i32
    - earlier.month() as i32;
  let mut months = u32::try_from(span).unwrap_or(0);

  // Step back until adding `months` to `earlier` no longer overshoots.
  let anchor = loop {
    match earlier.checked_add_months(Months::new(months)) {
      Some(anchor) if anchor <= later => break anchor,
      _ if months == 0 => break earlier,
      _ => months -= 1,
    }
  };

  let rest = u64::try_from((later - anchor).num_seconds()).unwrap_or(0);
  let months = u64::from(months);

  CivilDelta {
    years:   months / 12,
    months:  months % 12,
    days:    rest / 86_400,
    hours:   rest % 86_400 / 3_600,
    minutes: rest % 3_600 / 60,
    seconds: rest % 60,
  }
}

/// Render the civil difference as e.g. `"2 days, 3 hours, and 4 minutes"`.
///
/// Only non-zero components are emitted. A zero difference yields an empty
/// string; see [`elapsed_clause`] for a rendering that is never empty.
pub fn humanize(earlier: DateTime<Utc>, later: DateTime<Utc>) -> String {
  let delta = civil_delta(earlier, later);

  let mut parts: Vec<String> = delta
    .components()
    .into_iter()
    .zip(UNITS)
    .filter(|(n, _)| *n != 0)
    .map(|(n, unit)| {
      if n == 1 {
        format!("{n} {unit}")
      } else {
        format!("{n} {unit}s")
      }
    })
    .collect();

  if parts.len() > 1
    && let Some(last) = parts.last_mut()
  {
    *last = format!("and {last}");
  }

  parts.join(", ")
}

/// `"<duration> ago"`, or `"just now"` when the duration renders empty.
pub fn elapsed_clause(earlier: DateTime<Utc>, later: DateTime<Utc>) -> String {
  let duration = humanize(earlier, later);
  if duration.is_empty() {
    "just now".to_owned()
  } else {
    format!("{duration} ago")
  }
}
