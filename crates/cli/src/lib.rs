mod error;
mod exec;
mod guide;
mod output;
mod run;

use anyhow::Result;
use clap::{ArgAction, Parser};

use error::{exit_with_error, ErrorContext};

const ABOUT: &str = "\
Walk, query and reshape JSON from the command line using walk-paths.

A walk-path addresses or searches nodes of the input JSON; walked elements
can be printed, wrapped back into JSON, inserted, updated, merged, swapped,
purged, compared or piped through a shell command. Run with -g for the
walk-path guide.";

#[derive(Parser, Debug)]
#[clap(name = "jtw", version, about = ABOUT)]
pub struct App {
  /// process all JSONs of the input stream (default: only the first)
  #[clap(short = 'a', long)]
  pub all: bool,

  /// compare against a file, a JSON literal, or a walked element
  #[clap(short = 'c', long, value_name = "F|J|W", allow_hyphen_values = true)]
  pub compare: Vec<String>,

  /// raise debug verbosity (repeatable)
  #[clap(short = 'd', action = ArgAction::Count)]
  pub debug: u8,

  /// evaluate the -i/-u parameter as a shell command, terminated by \;
  #[clap(short = 'e', long)]
  pub exec: bool,

  /// rewrite the input file in place (ignored with -a or stdin input)
  #[clap(short = 'f', long)]
  pub force: bool,

  /// print the walk-path guide and exit
  #[clap(short = 'g', long)]
  pub guide: bool,

  /// insert a file, a JSON literal, or walked elements
  #[clap(short = 'i', long, value_name = "F|J|W", allow_hyphen_values = true)]
  pub insert: Vec<String>,

  /// wrap all processed JSONs into one array (implies -a)
  #[clap(short = 'J')]
  pub wrap_all: bool,

  /// wrap walked elements into an array (-jj: into an object)
  #[clap(short = 'j', action = ArgAction::Count)]
  pub jsonize: u8,

  /// print labels of walked elements; with -j group by label
  #[clap(short = 'l', long)]
  pub labels: bool,

  /// merge mode for -i and -u
  #[clap(short = 'm', long)]
  pub merge: bool,

  /// process walks sequentially instead of interleaved
  #[clap(short = 'n', long)]
  pub sequential: bool,

  /// purge all walked elements (-pp: purge everything else)
  #[clap(short = 'p', action = ArgAction::Count)]
  pub purge: u8,

  /// print solidus escaped (-qq: unquote an isolated string)
  #[clap(short = 'q', action = ArgAction::Count)]
  pub quote: u8,

  /// compact one-line output (-rr: stringify the result)
  #[clap(short = 'r', action = ArgAction::Count)]
  pub raw: u8,

  /// swap the elements of two walks (exactly two -w required)
  #[clap(short = 's', long)]
  pub swap: bool,

  /// template interpolated from walked entries (repeatable, cycling)
  #[clap(short = 'T', long, value_name = "TEMPLATE", allow_hyphen_values = true)]
  pub template: Vec<String>,

  /// indent width for pretty printing
  #[clap(short = 't', long, default_value = "3", value_name = "INDENT")]
  pub indent: usize,

  /// update from a file, a JSON literal, or walked elements
  #[clap(short = 'u', long, value_name = "F|J|W", allow_hyphen_values = true)]
  pub update: Vec<String>,

  /// walk-path (repeatable; see -g)
  #[clap(short = 'w', long, value_name = "WALKPATH", allow_hyphen_values = true)]
  pub walk: Vec<String>,

  /// common walk prefix, prepended to every following -y
  #[clap(short = 'x', value_name = "COMMON_WP", allow_hyphen_values = true)]
  pub common: Vec<String>,

  /// partial walk, appended to the last -x to form a -w
  #[clap(short = 'y', value_name = "PARTIAL_WP", allow_hyphen_values = true)]
  pub partial: Vec<String>,

  /// print the node count after the output (-zz: print the count only)
  #[clap(short = 'z', action = ArgAction::Count)]
  pub size: u8,

  /// input file; stdin when absent or `-`
  #[clap(value_name = "JSON_FILE")]
  pub file: Option<String>,
}

pub fn execute_main() -> Result<()> {
  match main_with_args(std::env::args()) {
    Err(error) => exit_with_error(error),
    Ok(code) => {
      if code != 0 {
        std::process::exit(code)
      }
      Ok(())
    }
  }
}

/// this wrapper function is for testing
pub fn main_with_args(args: impl Iterator<Item = String>) -> Result<i32> {
  let args: Vec<String> = args.collect();
  let args = rebuild_exec_args(args)?;
  let args = convert_xy(args);
  let app = App::try_parse_from(args)?;
  run::run(app)
}

/// flags that never take a value, for cluster scanning
const VALUELESS: &str = "adefgJjlmnpqrsz";

fn exec_flag_present(args: &[String]) -> bool {
  for arg in args.iter().skip(1) {
    if arg == "--exec" {
      return true;
    }
    if !arg.starts_with('-') || arg.starts_with("--") || arg.len() < 2 {
      continue;
    }
    for c in arg.chars().skip(1) {
      if c == 'e' {
        return true;
      }
      if !VALUELESS.contains(c) {
        break; // a value-taking option swallows the rest of the arg
      }
    }
  }
  false
}

/// With -e present, glue everything between `-i`/`-u` and the terminating
/// `;` argument into a single parameter value, so the shell command line
/// survives option parsing. Later `-i`/`-u` occurrences stay walk-paths.
fn rebuild_exec_args(args: Vec<String>) -> Result<Vec<String>> {
  if !exec_flag_present(&args) {
    return Ok(args);
  }
  let mut out: Vec<String> = Vec::new();
  let mut ui: Option<char> = None;
  let mut pieces: Vec<String> = Vec::new();
  let mut terminated = false;

  for arg in args {
    if terminated {
      out.push(arg);
      continue;
    }
    if let Some(option) = ui {
      let mut piece = arg;
      if let Some(stripped) = piece.strip_suffix(';') {
        terminated = true;
        piece = stripped.to_string();
      }
      if !piece.is_empty() {
        pieces.push(piece);
      }
      if terminated {
        out.push(format!("-{option}"));
        out.push(pieces.join(" "));
        pieces.clear();
      }
      continue;
    }
    if arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 1 {
      let chars: Vec<char> = arg.chars().collect();
      let mut idx = 1;
      let mut prefix = String::from("-");
      let mut found = None;
      while idx < chars.len() {
        let c = chars[idx];
        if c == 'i' || c == 'u' {
          found = Some(c);
          idx += 1;
          break;
        }
        if !VALUELESS.contains(c) {
          break;
        }
        prefix.push(c);
        idx += 1;
      }
      if let Some(option) = found {
        if prefix.len() > 1 {
          out.push(prefix);
        }
        ui = Some(option);
        let attached: String = chars[idx..].iter().collect();
        if !attached.is_empty() {
          let mut piece = attached;
          if let Some(stripped) = piece.strip_suffix(';') {
            terminated = true;
            piece = stripped.to_string();
          }
          if !piece.is_empty() {
            pieces.push(piece);
          }
          if terminated {
            out.push(format!("-{option}"));
            out.push(pieces.join(" "));
            pieces.clear();
          }
        }
        continue;
      }
    }
    out.push(arg);
  }

  if ui.is_some() && !terminated {
    return Err(
      anyhow::anyhow!("the -e command line never ends")
        .context(ErrorContext::MissingExecTerminator),
    );
  }
  Ok(out)
}

/// matches `-<letter>` and `-<letter>VALUE` forms
fn short_opt(arg: &str, letter: char) -> Option<Option<String>> {
  if arg.starts_with("--") {
    return None;
  }
  let rest = arg.strip_prefix('-')?;
  let mut chars = rest.chars();
  if chars.next()? != letter {
    return None;
  }
  let attached: String = chars.collect();
  Some((!attached.is_empty()).then_some(attached))
}

/// Convert -x/-y shorthands into -w walks: every -y is prepended with the
/// nearest preceding -x; a loose -x becomes a walk of its own. Converted
/// walks are appended after explicitly given -w options.
fn convert_xy(args: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  let mut new_walks: Vec<String> = Vec::new();
  let mut last_x: Option<String> = None;
  let mut x_used = false;

  let mut iter = args.into_iter().peekable();
  while let Some(arg) = iter.next() {
    if let Some(value) = short_opt(&arg, 'x') {
      let Some(value) = value.or_else(|| iter.next()) else {
        out.push(arg); // let clap report the missing value
        continue;
      };
      if let Some(prev) = last_x.take() {
        if !x_used {
          new_walks.push(prev);
        }
      }
      last_x = Some(value);
      x_used = false;
      continue;
    }
    if let Some(value) = short_opt(&arg, 'y') {
      let Some(value) = value.or_else(|| iter.next()) else {
        out.push(arg);
        continue;
      };
      new_walks.push(format!("{}{}", last_x.as_deref().unwrap_or(""), value));
      x_used = true;
      continue;
    }
    out.push(arg);
  }
  if let Some(prev) = last_x {
    if !x_used {
      new_walks.push(prev);
    }
  }
  for walk in new_walks {
    out.push("-w".to_string());
    out.push(walk);
  }
  out
}
