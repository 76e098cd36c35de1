use crate::node::Json;
use crate::parse::parse_json;
use crate::path::{Namespace, Position};

use tracing::debug;

/// reserved namespace key: the walked path as a JSON array
pub const PATH_TOKEN: &str = "$PATH";
/// reserved namespace key: the walked path joined with `_`
pub const PATH_STR_TOKEN: &str = "$path";

/// Substitute `{key}` and `{{key}}` tokens from the namespace. `{key}`
/// strips the outer quotation marks of string values, `{{key}}` splices the
/// raw JSON text. Returns None when nothing was replaced.
fn substitute(template: &str, ns: &Namespace) -> Option<String> {
  let mut out = template.to_string();
  let mut replaced = false;
  for braces in [2usize, 1] {
    for (key, value) in ns {
      let token = format!("{}{}{}", "{".repeat(braces), key, "}".repeat(braces));
      if !out.contains(&token) {
        continue;
      }
      let mut text = value.to_string();
      if braces == 1 && value.is_string() {
        text = text[1..text.len() - 1].to_string();
      }
      out = out.replace(&token, &text);
      replaced = true;
    }
  }
  replaced.then_some(out)
}

/// Interpolate a template against a walked position: `$path` first, then
/// `$PATH`, then every namespace key (the empty key holds the current
/// value). The result is parsed back into a tree unless `parse` is off
/// (shell command assembly wants the raw string); a failed parse yields
/// `Neither`.
pub fn interpolate(template: &str, pos: &Position, parse: bool) -> Json {
  let mut work = template.to_string();

  let path_ns: Namespace = [(
    PATH_STR_TOKEN.to_string(),
    Json::String(pos.path_string()),
  )]
  .into_iter()
  .collect();
  if let Some(out) = substitute(&work, &path_ns) {
    work = out;
  }
  let path_ns: Namespace = [(PATH_TOKEN.to_string(), pos.path_json())]
    .into_iter()
    .collect();
  if let Some(out) = substitute(&work, &path_ns) {
    work = out;
  }
  if let Some(out) = substitute(&work, &pos.ns) {
    work = out;
  }

  if !parse {
    return Json::String(work);
  }
  match parse_json(&work) {
    Ok(json) => json,
    Err(err) => {
      debug!(%err, "template interpolation did not produce a tree");
      Json::Neither
    }
  }
}

/// Escape a shell command line: outside single/double-quoted spans every
/// character that is neither alphanumeric nor bash-benign gets a backslash;
/// quoted spans pass through; a backslash escapes the next character.
pub fn quote_cli(src: &str) -> String {
  const BENIGN: &str = "~`#$&*()\\|{};<>?!. \t";
  let mut quoted = String::new();
  let mut outside_literal = true;
  let mut backslash_seen = 0u8;
  for c in src.chars() {
    if backslash_seen == 0 && c == '\\' {
      backslash_seen = 1;
    }
    if c == '\'' || c == '"' {
      if backslash_seen == 0 {
        outside_literal = !outside_literal;
      }
    } else if outside_literal && !c.is_alphanumeric() && !BENIGN.contains(c) {
      quoted.push('\\');
    }
    quoted.push(c);
    if backslash_seen > 0 {
      backslash_seen += 1;
      if backslash_seen > 2 {
        backslash_seen = 0;
      }
    }
  }
  quoted
}
