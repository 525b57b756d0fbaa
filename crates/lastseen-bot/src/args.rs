//! Argument shapes and parsers.
//!
//! Simple commands take a separator-delimited list or pair. Commands with
//! flags are tokenised shell-style (single and double quotes, backslash
//! escapes) and handed to a `clap` parser.

use clap::Parser;

use crate::error::{CommandError, Result};

/// How a command's argument text is split before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
  /// Arguments are ignored.
  Nothing,
  /// One or more names separated by `sep`.
  List { sep: char },
  /// Exactly two parts separated by `sep`.
  Pair { sep: char },
  /// Quote-aware tokens for a `clap` parser.
  Flags,
}

/// Argument text after splitting according to an [`ArgShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
  Nothing,
  List(Vec<String>),
  Pair(String, String),
  Tokens(Vec<String>),
}

impl ArgShape {
  pub fn split(self, text: &str) -> Result<Args> {
    match self {
      Self::Nothing => Ok(Args::Nothing),
      Self::List { sep } => {
        let names = split_list(text, sep);
        if names.is_empty() {
          Err(CommandError::Usage(format!(
            "Expected one or more names separated by '{sep}'."
          )))
        } else {
          Ok(Args::List(names))
        }
      }
      Self::Pair { sep } => {
        let parts: Vec<&str> = text.split(sep).map(str::trim).collect();
        match parts.as_slice() {
          [a, b] if !a.is_empty() && !b.is_empty() => {
            Ok(Args::Pair((*a).to_owned(), (*b).to_owned()))
          }
          _ => Err(CommandError::Usage(format!(
            "Argument requires two arguments separated by a {sep}"
          ))),
        }
      }
      Self::Flags => tokenize(text).map(Args::Tokens),
    }
  }
}

/// Split on `sep`, trimming each part and dropping empty ones.
pub fn split_list(text: &str, sep: char) -> Vec<String> {
  text
    .split(sep)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Split `input` into shell-style words.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut in_token = false;
  let mut quote: Option<char> = None;
  let mut chars = input.chars();

  while let Some(c) = chars.next() {
    match (quote, c) {
      (Some(q), c) if c == q => quote = None,
      (Some('"'), '\\') => {
        if let Some(next) = chars.next() {
          current.push(next);
        }
      }
      (Some(_), c) => current.push(c),
      (None, '"' | '\'') => {
        quote = Some(c);
        in_token = true;
      }
      (None, '\\') => {
        if let Some(next) = chars.next() {
          current.push(next);
          in_token = true;
        }
      }
      (None, c) if c.is_whitespace() => {
        if in_token {
          tokens.push(std::mem::take(&mut current));
          in_token = false;
        }
      }
      (None, c) => {
        current.push(c);
        in_token = true;
      }
    }
  }

  if let Some(q) = quote {
    return Err(CommandError::Usage(format!("Unterminated {q} quote.")));
  }
  if in_token {
    tokens.push(current);
  }
  Ok(tokens)
}

/// Run a `clap` parser over pre-split tokens, using `command` as the program
/// name in usage output.
pub fn parse_flags<P: Parser>(command: &str, tokens: Vec<String>) -> Result<P> {
  Ok(P::try_parse_from(std::iter::once(command.to_owned()).chain(tokens))?)
}

/// Move each occurrence of the given long options, with their values, in
/// front of every other token. A trailing positional that accepts hyphenated
/// values would otherwise take them as plain words.
fn hoist_options(tokens: Vec<String>, options: &[&str]) -> Vec<String> {
  let mut hoisted = Vec::new();
  let mut rest = Vec::new();
  let mut tokens = tokens.into_iter();

  while let Some(token) = tokens.next() {
    if token == "--" {
      rest.push(token);
      rest.extend(tokens.by_ref());
      break;
    }
    let (flag, inline) = match token.split_once('=') {
      Some((flag, _)) => (flag, true),
      None => (token.as_str(), false),
    };
    if !options.contains(&flag) {
      rest.push(token);
      continue;
    }
    hoisted.push(token);
    if !inline && let Some(value) = tokens.next() {
      hoisted.push(value);
    }
  }

  hoisted.extend(rest);
  hoisted
}

// ─── Flag-style argument sets ────────────────────────────────────────────────

/// `report <name> <location...> [--info <document>]`
#[derive(Parser, Debug)]
#[command(name = "report", about = "Report where something was seen")]
pub struct ReportArgs {
  /// What was seen.
  pub name:     String,
  /// Where it was seen; several words are joined with spaces.
  #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
  pub location: Vec<String>,
  /// YAML document to store as the target's info.
  #[arg(long, allow_hyphen_values = true)]
  pub info:     Option<String>,
}

impl ReportArgs {
  /// Parse `report` tokens. `--info` may appear anywhere, even after a
  /// location that starts with `-`.
  pub fn parse(tokens: Vec<String>) -> Result<Self> {
    parse_flags("report", hoist_options(tokens, &["--info"]))
  }
}

/// `clear [--info]`
#[derive(Parser, Debug)]
#[command(name = "clear", about = "Remove every sighting")]
pub struct ClearArgs {
  /// Also remove every info document.
  #[arg(short, long)]
  pub info: bool,
}

/// `info <name> [--list | --update <document> | --remove]`
#[derive(Parser, Debug)]
#[command(name = "info", about = "Show or change a target's info")]
pub struct InfoArgs {
  pub name:   String,
  /// Show the info document (the default).
  #[arg(short, long, conflicts_with_all = ["update", "remove"])]
  pub list:   bool,
  /// Replace the info document with this YAML.
  #[arg(short, long, conflicts_with = "remove", allow_hyphen_values = true)]
  pub update: Option<String>,
  /// Delete the info document.
  #[arg(short, long)]
  pub remove: bool,
}
