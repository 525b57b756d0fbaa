//! Named reply templates with `{field}` substitution.

use serde::Deserialize;

/// The reply templates, overridable from configuration.
///
/// | Template    | Fields                                   |
/// |-------------|------------------------------------------|
/// | `report`    | `target`, `location`, `user`, `timestamp` |
/// | `miss`      | `target`                                 |
/// | `info`      | `target`, `info`                         |
/// | `miss_info` | `target`                                 |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Templates {
  pub report:    String,
  pub miss:      String,
  pub info:      String,
  pub miss_info: String,
}

impl Default for Templates {
  fn default() -> Self {
    Self {
      report:    "{target} was last seen {timestamp} at {location}, reported by {user}."
        .into(),
      miss:      "No sightings of {target} reported.".into(),
      info:      "Information for {target}:\n{info}".into(),
      miss_info: "No information for {target}.".into(),
    }
  }
}

/// Substitute `{field}` placeholders in a single pass. Placeholders with no
/// matching field are left as written, and substituted values are never
/// re-expanded.
pub fn render(template: &str, fields: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let Some(close) = after.find('}') else {
      out.push_str(&rest[open..]);
      rest = "";
      break;
    };

    let key = &after[..close];
    match fields.iter().find(|(k, _)| *k == key) {
      Some((_, value)) => out.push_str(value),
      None => {
        out.push('{');
        out.push_str(key);
        out.push('}');
      }
    }
    rest = &after[close + 1..];
  }

  out.push_str(rest);
  out
}
