use crate::run::Opts;

use jtw_core::parse::stringify;
use jtw_core::{to_text, Json, Map, Position, PrintStyle};

use std::collections::HashSet;
use std::fs;

use anyhow::{Context, Result};
use tracing::debug;

pub fn print_style(opts: &Opts) -> PrintStyle {
  PrintStyle {
    indent: opts.indent,
    raw: opts.raw >= 1,
    quote_solidus: opts.quote % 2 == 1,
  }
}

/// Accumulates processed JSONs under `-J`.
pub struct Global {
  items: Vec<Json>,
  imposed_j: bool,
}

impl Global {
  pub fn new(imposed_j: bool) -> Self {
    Global {
      items: Vec::new(),
      imposed_j,
    }
  }

  pub fn push(&mut self, json: Json) {
    // an imposed -j produced a wrapper array; graft its elements instead
    if self.imposed_j && json.is_iterable() {
      self
        .items
        .extend(json.children().into_iter().map(|(_, v)| v.clone()));
    } else {
      self.items.push(json);
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn into_json(self) -> Json {
    Json::Array(self.items)
  }
}

/// Per-input output state: prints walked elements to the console or
/// accumulates them into the `-j`/`-jj` wrapper with relevance grouping.
pub struct Output {
  pub jout: Json,
  last_group: usize,
  convert_req: bool,
  converted: HashSet<String>,
}

impl Output {
  pub fn new(opts: &Opts) -> Self {
    Output {
      jout: if opts.jsonize >= 2 {
        Json::Object(Map::new())
      } else {
        Json::Array(Vec::new())
      },
      last_group: 0,
      convert_req: false,
      converted: HashSet::new(),
    }
  }

  /// Emit one walked element. `shaped` carries a template-interpolated (or
  /// otherwise derived) value standing in for the walked one; such values
  /// have no label of their own.
  pub fn emit(
    &mut self,
    opts: &Opts,
    root: &Json,
    pos: &Position,
    group: usize,
    shaped: Option<Json>,
  ) {
    if opts.jsonize > 0 {
      self.jsonized(opts, root, pos, group, shaped);
    } else {
      console(opts, root, pos, shaped);
    }
    self.last_group = group;
  }

  fn jsonized(&mut self, opts: &Opts, root: &Json, pos: &Position, group: usize, shaped: Option<Json>) {
    let label = if shaped.is_none() {
      pos.label().map(str::to_string)
    } else {
      None
    };
    let value =
      shaped.unwrap_or_else(|| pos.value(root).cloned().unwrap_or(Json::Null));
    if self.jout.is_object() {
      self.into_object(label, value);
    } else {
      self.into_array(opts, label, value, group);
    }
  }

  /// `-j` accumulation; with `-l`, labeled elements of one relevance group
  /// coalesce into a shared object.
  fn into_array(&mut self, opts: &Opts, label: Option<String>, value: Json, group: usize) {
    let items = self.jout.as_array_mut().expect("jout is an array");
    let (Some(label), true) = (label, opts.labels) else {
      items.push(value);
      return;
    };
    let new_cluster = if opts.sequential {
      group >= self.last_group
    } else {
      group > self.last_group
    };
    if new_cluster || items.is_empty() {
      items.push(Json::Object(Map::new()));
      self.convert_req = false;
    }
    if !items.last().expect("non-empty").is_object() {
      items.push(Json::Object(Map::new()));
    }
    let cluster = items
      .last_mut()
      .and_then(Json::as_object_mut)
      .expect("cluster is an object");
    match cluster.get_mut(&label) {
      None => {
        if value.is_array() {
          // remember to convert on a repeated label
          self.convert_req = true;
        }
        cluster.insert(label, value);
      }
      Some(slot) => {
        if self.convert_req || !slot.is_array() {
          let old = std::mem::take(slot);
          *slot = Json::Array(vec![old]);
          self.convert_req = false;
        }
        slot
          .as_array_mut()
          .expect("slot was just converted")
          .push(value);
      }
    }
  }

  /// `-jj` accumulation: unlabeled elements are dropped, repeated labels
  /// convert to arrays once.
  fn into_object(&mut self, label: Option<String>, value: Json) {
    let Some(label) = label else {
      return;
    };
    let map = self.jout.as_object_mut().expect("jout is an object");
    match map.get_mut(&label) {
      None => {
        map.insert(label, value);
      }
      Some(slot) => {
        if !self.converted.contains(&label) {
          let old = std::mem::take(slot);
          *slot = Json::Array(vec![old]);
          self.converted.insert(label);
        }
        slot
          .as_array_mut()
          .expect("slot was just converted")
          .push(value);
      }
    }
  }
}

fn console(opts: &Opts, root: &Json, pos: &Position, shaped: Option<Json>) {
  let walked = pos.value(root).cloned().unwrap_or(Json::Null);
  if opts.size >= 2 {
    println!("{}", walked.node_count());
    return;
  }
  let labeled = shaped.is_none();
  let value = shaped.unwrap_or(walked);
  let mut unquote = opts.quote >= 2;
  if opts.labels && labeled {
    if let Some(label) = pos.label() {
      print!("\"{label}\": ");
      unquote = false;
    }
  }
  if unquote && value.is_string() {
    println!("{}", value.as_str().expect("value is a string"));
  } else if opts.raw >= 2 {
    println!("{}", stringify(&value));
  } else {
    println!("{}", to_text(&value, &print_style(opts)));
  }
  if opts.size == 1 {
    println!("size: {}", value.node_count());
  }
}

/// Write a whole resulting tree: to stdout, back into the input file
/// (`-f`), or into the `-J` accumulator.
pub fn write_json(
  opts: &Opts,
  mut json: Json,
  jsonize: bool,
  global: Option<&mut Global>,
) -> Result<()> {
  if opts.size >= 2 {
    println!("{}", json.node_count());
    return Ok(());
  }
  if jsonize && opts.jsonize == 1 {
    json = Json::Array(vec![json]);
  }
  if let Some(global) = global {
    debug!("collecting output into the global array");
    global.push(json);
    return Ok(());
  }

  let unquote = opts.quote >= 2;
  let text = if unquote && json.is_string() {
    json.as_str().expect("json is a string").to_string()
  } else if opts.raw >= 2 {
    stringify(&json)
  } else {
    to_text(&json, &print_style(opts))
  };

  let target = opts.input_file().filter(|_| opts.force);
  match target {
    Some(file) => {
      debug!(file, "rewriting input file");
      fs::write(file, text + "\n").with_context(|| format!("cannot write to {file}"))?;
    }
    None => println!("{text}"),
  }
  if opts.size == 1 {
    println!("size: {}", json.node_count());
  }
  Ok(())
}
