//! The command table and its handlers.
//!
//! | Command        | Legacy    | Arguments                                         | Admin |
//! |----------------|-----------|---------------------------------------------------|-------|
//! | `find`         |           | `<name>[, <name>...]`                             |       |
//! | `report`       | `spot`    | `<name> <location> [--info <doc>]`                |       |
//! | `remove`       |           | `<name>[, <name>...]`                             | yes   |
//! | `clear`        |           | `[--info]`                                        | yes   |
//! | `alias`        |           | `<source>;<target>`                               |       |
//! | `unalias`      | `rmalias` | `<name>[;<name>...]`                              |       |
//! | `list-aliases` | `lsalias` |                                                   |       |
//! | `compact`      |           |                                                   | yes   |
//! | `info`         |           | `<name> [--list \| --update <doc> \| --remove]`   |       |
//! | `help`         |           |                                                   |       |

use chrono::{DateTime, Utc};
use lastseen_core::{
  humanize::elapsed_clause,
  info::render_info,
  records::Records,
  resolve::{IdentityResolver, at_handle},
};

use crate::{
  args::{ArgShape, Args, ClearArgs, InfoArgs, ReportArgs, parse_flags},
  error::{CommandError, Result},
  scout::Caller,
  template::{Templates, render},
};

/// Everything a handler may touch while it runs.
pub struct Context<'a> {
  pub records:    &'a mut Records,
  pub identities: &'a dyn IdentityResolver,
  pub templates:  &'a Templates,
  pub caller:     &'a Caller,
  pub now:        DateTime<Utc>,
}

impl Context<'_> {
  fn resolve(&self, text: &str) -> String { self.records.resolve(self.identities, text) }
}

pub type Handler = fn(&mut Context<'_>, Args) -> Result<Vec<String>>;

/// One row of the command table.
pub struct CommandSpec {
  pub name:       &'static str,
  /// Names the command was known by in earlier versions of the bot.
  pub legacy:     &'static [&'static str],
  pub usage:      &'static str,
  pub summary:    &'static str,
  pub args:       ArgShape,
  pub privileged: bool,
  pub handler:    Handler,
}

pub static COMMANDS: &[CommandSpec] = &[
  CommandSpec {
    name:       "find",
    legacy:     &[],
    usage:      "find <name>[, <name>...]",
    summary:    "Show where each target was last seen.",
    args:       ArgShape::List { sep: ',' },
    privileged: false,
    handler:    find,
  },
  CommandSpec {
    name:       "report",
    legacy:     &["spot"],
    usage:      "report <name> <location> [--info <yaml>]",
    summary:    "Record a sighting, optionally with an info document.",
    args:       ArgShape::Flags,
    privileged: false,
    handler:    report,
  },
  CommandSpec {
    name:       "remove",
    legacy:     &[],
    usage:      "remove <name>[, <name>...]",
    summary:    "Delete the sightings and info of the named targets.",
    args:       ArgShape::List { sep: ',' },
    privileged: true,
    handler:    remove,
  },
  CommandSpec {
    name:       "clear",
    legacy:     &[],
    usage:      "clear [--info]",
    summary:    "Delete every sighting, and every info document with --info.",
    args:       ArgShape::Flags,
    privileged: true,
    handler:    clear,
  },
  CommandSpec {
    name:       "alias",
    legacy:     &[],
    usage:      "alias <source>;<target>",
    summary:    "Make <source> resolve to <target>. The first alias wins.",
    args:       ArgShape::Pair { sep: ';' },
    privileged: false,
    handler:    alias,
  },
  CommandSpec {
    name:       "unalias",
    legacy:     &["rmalias"],
    usage:      "unalias <name>[;<name>...]",
    summary:    "Remove aliases.",
    args:       ArgShape::List { sep: ';' },
    privileged: false,
    handler:    unalias,
  },
  CommandSpec {
    name:       "list-aliases",
    legacy:     &["lsalias"],
    usage:      "list-aliases",
    summary:    "List every alias.",
    args:       ArgShape::Nothing,
    privileged: false,
    handler:    list_aliases,
  },
  CommandSpec {
    name:       "compact",
    legacy:     &[],
    usage:      "compact",
    summary:    "Move records stored under aliased names to their targets.",
    args:       ArgShape::Nothing,
    privileged: true,
    handler:    compact,
  },
  CommandSpec {
    name:       "info",
    legacy:     &[],
    usage:      "info <name> [--list | --update <yaml> | --remove]",
    summary:    "Show, replace or delete a target's info document.",
    args:       ArgShape::Flags,
    privileged: false,
    handler:    info,
  },
  CommandSpec {
    name:       "help",
    legacy:     &[],
    usage:      "help",
    summary:    "List the available commands.",
    args:       ArgShape::Nothing,
    privileged: false,
    handler:    help,
  },
];

/// Find a command by its current or legacy name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
  COMMANDS.iter().find(|spec| {
    spec.name.eq_ignore_ascii_case(name)
      || spec.legacy.iter().any(|l| l.eq_ignore_ascii_case(name))
  })
}

/// Interpret one line of command text (without any chat prefix).
///
/// An empty line yields no output.
pub fn dispatch(ctx: &mut Context<'_>, line: &str) -> Result<Vec<String>> {
  let line = line.trim();
  if line.is_empty() {
    return Ok(Vec::new());
  }
  let (name, rest) = line
    .split_once(char::is_whitespace)
    .unwrap_or((line, ""));

  let spec = lookup(name).ok_or_else(|| CommandError::Unknown(name.to_owned()))?;
  if spec.privileged && !ctx.caller.admin {
    tracing::info!(command = spec.name, user = %ctx.caller.username, "refused privileged command");
    return Err(CommandError::Restricted(spec.name));
  }

  let args = spec.args.split(rest)?;
  tracing::debug!(command = spec.name, user = %ctx.caller.username, "dispatching");
  (spec.handler)(ctx, args)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

fn expect_list(args: Args) -> Vec<String> {
  match args {
    Args::List(names) => names,
    _ => Vec::new(),
  }
}

fn expect_tokens(args: Args) -> Vec<String> {
  match args {
    Args::Tokens(tokens) => tokens,
    _ => Vec::new(),
  }
}

fn find(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let lines = expect_list(args)
    .iter()
    .map(|name| {
      let target = ctx.resolve(name);
      match ctx.records.find(&target) {
        Some(sighting) => render(&ctx.templates.report, &[
          ("target", target.as_str()),
          ("location", sighting.location.as_str()),
          ("user", sighting.reporter.as_str()),
          ("timestamp", elapsed_clause(sighting.timestamp, ctx.now).as_str()),
        ]),
        None => render(&ctx.templates.miss, &[("target", target.as_str())]),
      }
    })
    .collect();
  Ok(lines)
}

fn report(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let ReportArgs { name, location, info } = ReportArgs::parse(expect_tokens(args))?;
  let target = ctx.resolve(&name);
  let reporter = at_handle(&ctx.caller.username);

  let mut lines = Vec::new();
  ctx
    .records
    .report(target.clone(), reporter, location.join(" "), ctx.now);

  if let Some(document) = info
    && let Err(e) = ctx.records.update_info(target.clone(), &document, ctx.now)
  {
    lines.push(format!("Failed to parse info for {target}: {e}"));
  }

  tracing::info!(%target, user = %ctx.caller.username, "sighting recorded");
  lines.push(format!("Sighting of {target} recorded."));
  Ok(lines)
}

fn remove(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let names = expect_list(args);
  let removed = ctx.records.remove(names.iter().map(String::as_str));
  if removed.is_empty() {
    Ok(vec!["No sightings removed.".to_owned()])
  } else {
    Ok(vec![format!("Removed {}", removed.join(", "))])
  }
}

fn clear(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let ClearArgs { info } = parse_flags("clear", expect_tokens(args))?;
  ctx.records.clear(info);
  tracing::info!(info, user = %ctx.caller.username, "sightings cleared");
  Ok(vec!["All sightings removed.".to_owned()])
}

fn alias(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let Args::Pair(source, target) = args else {
    return Ok(Vec::new());
  };
  if ctx.records.add_alias(source.clone(), target.clone()) {
    return Ok(vec![format!("Added alias {source} to {target}.")]);
  }
  let existing = ctx.records.alias_of(&source).unwrap_or_default();
  Ok(vec![format!(
    "{source} is already aliased to {existing}; nothing changed."
  )])
}

fn unalias(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let names = expect_list(args);
  ctx.records.remove_aliases(names.iter().map(String::as_str));
  Ok(Vec::new())
}

fn list_aliases(ctx: &mut Context<'_>, _args: Args) -> Result<Vec<String>> {
  let lines: Vec<String> = ctx
    .records
    .aliases()
    .map(|(source, target)| format!("{source} maps to {target}"))
    .collect();
  if lines.is_empty() {
    Ok(vec!["No aliases currently listed.".to_owned()])
  } else {
    Ok(lines)
  }
}

fn compact(ctx: &mut Context<'_>, _args: Args) -> Result<Vec<String>> {
  let summary = ctx.records.compact();
  tracing::info!(?summary, "records compacted");
  if summary.is_empty() {
    return Ok(vec!["Nothing to compact.".to_owned()]);
  }
  Ok(vec![format!(
    "Compacted: {} sightings and {} info documents moved; {} sightings and {} info documents discarded as older duplicates.",
    summary.sightings_moved,
    summary.info_moved,
    summary.sightings_discarded,
    summary.info_discarded,
  )])
}

fn info(ctx: &mut Context<'_>, args: Args) -> Result<Vec<String>> {
  let InfoArgs { name, update, remove, .. } = parse_flags("info", expect_tokens(args))?;
  let target = ctx.resolve(&name);

  if let Some(document) = update {
    return Ok(vec![
      match ctx.records.update_info(target.clone(), &document, ctx.now) {
        Ok(()) => format!("Info updated for {target}"),
        Err(e) => format!("Error in updating {target}: {e}"),
      },
    ]);
  }

  if remove {
    return Ok(vec![if ctx.records.remove_info(&target) {
      format!("Information removed for {target}")
    } else {
      format!("No information for {target} to remove")
    }]);
  }

  let line = match ctx.records.info(&target) {
    Some(record) => match render_info(&record.document) {
      Ok(yaml) => render(&ctx.templates.info, &[
        ("target", target.as_str()),
        ("info", yaml.trim_end()),
      ]),
      Err(e) => format!("Error in rendering info for {target}: {e}"),
    },
    None => render(&ctx.templates.miss_info, &[("target", target.as_str())]),
  };
  Ok(vec![line])
}

fn help(ctx: &mut Context<'_>, _args: Args) -> Result<Vec<String>> {
  let lines = COMMANDS
    .iter()
    .filter(|spec| !spec.privileged || ctx.caller.admin)
    .map(|spec| {
      let admin = if spec.privileged { " (admin)" } else { "" };
      format!("{}{admin}: {}", spec.usage, spec.summary)
    })
    .collect();
  Ok(lines)
}
