use crate::error::{ErrorContext as EC, COMPARE_DIFFERS};
use crate::exec::execute_cli;
use crate::guide::print_guide;
use crate::output::{write_json, Global, Output};
use crate::App;

use jtw_core::interleave::deliver;
use jtw_core::mutate::{self, Source};
use jtw_core::template::interpolate;
use jtw_core::{
  parse_json, parse_stream, Json, Lexeme, MutationLog, Position, WalkPath, WalkPathError, Walker,
};

use std::collections::VecDeque;
use std::io::Read;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// The option surface distilled for the driver, after normalization.
#[derive(Debug, Clone)]
pub struct Opts {
  pub walks: Vec<String>,
  pub insert: Vec<String>,
  pub update: Vec<String>,
  pub compare: Vec<String>,
  pub templates: Vec<String>,
  pub exec: bool,
  pub swap: bool,
  pub merge: bool,
  pub sequential: bool,
  pub labels: bool,
  pub purge: u8,
  pub jsonize: u8,
  pub all: bool,
  pub wrap_all: bool,
  pub imposed_j: bool,
  pub quote: u8,
  pub raw: u8,
  pub size: u8,
  pub force: bool,
  pub indent: usize,
  pub file: Option<String>,
}

impl Opts {
  /// named input file; `-` and absence both mean stdin
  pub fn input_file(&self) -> Option<&str> {
    self.file.as_deref().filter(|f| *f != "-")
  }
}

fn normalize(app: App) -> Opts {
  let mut opts = Opts {
    walks: app.walk,
    insert: app.insert,
    update: app.update,
    compare: app.compare,
    templates: app.template,
    exec: app.exec,
    swap: app.swap,
    merge: app.merge,
    sequential: app.sequential,
    labels: app.labels,
    purge: app.purge,
    jsonize: app.jsonize,
    all: app.all || app.wrap_all,
    wrap_all: app.wrap_all,
    imposed_j: false,
    quote: app.quote,
    raw: app.raw,
    size: app.size,
    force: app.force,
    indent: app.indent,
    file: app.file,
  };
  if opts.wrap_all && opts.jsonize == 0 {
    opts.jsonize = 1;
    opts.imposed_j = true;
  }
  if opts.jsonize > 0 && opts.walks.is_empty() {
    opts.walks.push(String::new());
  }
  if opts.all && opts.force {
    debug!("ignoring -f because of multi-input processing");
    opts.force = false;
  }
  if opts.input_file().is_none() {
    opts.force = false;
  }
  opts
}

fn init_tracing(verbosity: u8) {
  use tracing_subscriber::EnvFilter;
  let level = match verbosity {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
    .with_writer(std::io::stderr)
    .try_init();
}

fn read_input(opts: &Opts) -> Result<String> {
  match opts.input_file() {
    Some(file) => {
      debug!(file, "reading json");
      std::fs::read_to_string(file).with_context(|| EC::ReadInput(file.to_string()))
    }
    None => {
      debug!("reading json from <stdin>");
      let mut buf = String::new();
      std::io::stdin()
        .read_to_string(&mut buf)
        .context(EC::ReadInput("<stdin>".to_string()))?;
      Ok(buf)
    }
  }
}

fn compile_walk(walk: &str) -> Result<WalkPath> {
  WalkPath::parse(walk).map_err(|e| {
    let ctx = if matches!(e, WalkPathError::BadRegex(_)) {
      EC::ParseRegex
    } else {
      EC::ParseWalk
    };
    anyhow::Error::new(e).context(ctx)
  })
}

/// Entry point behind the parsed options: read inputs, run one session per
/// top-level JSON, settle the exit code.
pub fn run(app: App) -> Result<i32> {
  init_tracing(app.debug);
  if app.guide {
    print_guide();
    return Ok(0);
  }
  let opts = normalize(app);
  let input = read_input(&opts)?;
  let mut global = opts.wrap_all.then(|| Global::new(opts.imposed_j));
  let mut main_rc = 0;
  let mut processed = 0usize;

  for item in parse_stream(&input) {
    let json = match item {
      Ok(json) => json,
      Err(err) => {
        eprintln!("{}", err.location_report());
        return Err(anyhow::Error::new(err).context(EC::ParseJson));
      }
    };
    let rc = Session::new(&opts, json, global.as_mut()).demux()?;
    if rc != 0 {
      main_rc = rc;
    }
    processed += 1;
    if !opts.all {
      break;
    }
  }
  if processed == 0 {
    return Err(anyhow!("input holds no JSON").context(EC::ParseJson));
  }

  if let Some(global) = global {
    if !global.is_empty() {
      // the final -J write disregards -j/-q/-r
      let neutral = Opts {
        jsonize: 0,
        quote: 0,
        raw: 0,
        wrap_all: false,
        force: false,
        ..opts.clone()
      };
      write_json(&neutral, global.into_json(), false, None)?;
    }
  }
  Ok(main_rc)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
  Insert,
  Update,
}

/// Insert/update operand pool, per the parameter resolution order.
enum SourcePool {
  /// static JSONs from files or literals (or pre-interpolated templates)
  Static(Vec<Source>),
  /// positions walked over the input tree, fetched live on use
  Walked { positions: Vec<Position> },
  /// `-e`: a shell command line, optionally fed by trailing source walks
  Exec {
    command: String,
    sources: Vec<Position>,
  },
}

impl SourcePool {
  fn len(&self) -> usize {
    match self {
      SourcePool::Static(s) => s.len(),
      SourcePool::Walked { positions } => positions.len(),
      SourcePool::Exec { sources, .. } => sources.len(),
    }
  }
}

/// One top-level JSON being processed against the full option set.
struct Session<'a, 'g> {
  opts: &'a Opts,
  walks: Vec<String>,
  json: Json,
  out: Output,
  global: Option<&'g mut Global>,
}

impl<'a, 'g> Session<'a, 'g> {
  fn new(opts: &'a Opts, json: Json, global: Option<&'g mut Global>) -> Self {
    let walks = if json.is_atomic() && !opts.walks.is_empty() {
      debug!("read json is an atomic value, ignoring all walk-paths");
      Vec::new()
    } else {
      opts.walks.clone()
    };
    Session {
      opts,
      walks,
      out: Output::new(opts),
      json,
      global,
    }
  }

  /// Demultiplex the functional options, first one in priority order wins.
  fn demux(mut self) -> Result<i32> {
    if !self.opts.compare.is_empty() {
      return self.compare_op();
    }
    if !self.opts.insert.is_empty() {
      self.mutate_op(OpKind::Insert)?;
    } else if !self.opts.update.is_empty() {
      self.mutate_op(OpKind::Update)?;
    } else if self.opts.swap {
      let rc = self.swap_op()?;
      if rc != 0 {
        return Ok(rc);
      }
    } else if self.opts.purge > 0 {
      self.purge_op()?;
    } else if !self.walks.is_empty() {
      return self.walk_op();
    }
    self.write_whole()?;
    Ok(0)
  }

  fn write_whole(&mut self) -> Result<()> {
    let json = std::mem::take(&mut self.json);
    write_json(self.opts, json, true, self.global.as_deref_mut())
  }

  fn collect_one(&self, walk: &str) -> Result<Vec<Position>> {
    let program = compile_walk(walk)?;
    Ok(Walker::new(&self.json, &program).collect())
  }

  /// Compile and enumerate the walks, then interleave them into one
  /// emission-ordered list.
  fn delivered(&self, walks: &[String]) -> Result<(Vec<WalkPath>, Vec<(Position, usize)>)> {
    let mut programs = Vec::new();
    let mut fifos: Vec<VecDeque<Position>> = Vec::new();
    for walk in walks {
      let program = compile_walk(walk)?;
      fifos.push(Walker::new(&self.json, &program).collect());
      programs.push(program);
    }
    let mut list = Vec::new();
    deliver(fifos, self.opts.sequential, |pos, group| {
      list.push((pos, group));
    });
    Ok((programs, list))
  }

  fn next_template(&self, idx: &mut usize, pos: &Position) -> Option<Json> {
    if self.opts.templates.is_empty() {
      return None;
    }
    let template = &self.opts.templates[*idx];
    *idx = (*idx + 1) % self.opts.templates.len();
    let shaped = interpolate(template, pos, true);
    (!shaped.is_neither()).then_some(shaped)
  }

  fn walk_op(mut self) -> Result<i32> {
    let walks = self.walks.clone();
    let (_, delivered) = self.delivered(&walks)?;
    let mut template_idx = 0;
    for (pos, group) in delivered {
      let shaped = self.next_template(&mut template_idx, &pos);
      self.out.emit(self.opts, &self.json, &pos, group, shaped);
    }
    if self.opts.jsonize > 0 {
      let jout = std::mem::take(&mut self.out.jout);
      write_json(self.opts, jout, false, self.global.as_deref_mut())?;
    }
    Ok(0)
  }

  fn mutate_op(&mut self, op: OpKind) -> Result<()> {
    let atomic = self.json.is_atomic();
    if atomic {
      let inner = std::mem::take(&mut self.json);
      self.json = Json::Array(vec![inner]);
    }
    let walks = if self.walks.is_empty() {
      vec![if atomic { "[0]".to_string() } else { String::new() }]
    } else {
      self.walks.clone()
    };
    let params = match op {
      OpKind::Insert => &self.opts.insert,
      OpKind::Update => &self.opts.update,
    };
    let pool = self.resolve_sources(params)?;
    let (programs, delivered) = self.delivered(&walks)?;
    let is_multi = walks.len() > 1
      || programs
        .first()
        .is_some_and(|p| p.lexemes.iter().any(Lexeme::is_generator));
    debug!(destinations = delivered.len(), is_multi, "mutation pass");

    let mut log = MutationLog::new();
    let mut key = 0usize;
    for (dst, _group) in &delivered {
      self.apply_sources(op, dst, &pool, &mut key, is_multi, &mut log);
    }

    if self.opts.purge >= 2 {
      // keep only the destination locations
      let (_, kept) = self.delivered(&walks)?;
      let keep: Vec<Position> = kept.into_iter().map(|(p, _)| p).collect();
      mutate::crop(&mut self.json, &keep);
    } else if self.opts.purge == 1 {
      // a walked source turns the operation into a move
      match &pool {
        SourcePool::Walked { positions } => mutate::purge(&mut self.json, positions),
        SourcePool::Exec { sources, .. } if !sources.is_empty() => {
          mutate::purge(&mut self.json, sources)
        }
        _ => {}
      }
    }

    if atomic {
      self.json = match std::mem::take(&mut self.json) {
        Json::Array(mut items) if !items.is_empty() => items.remove(0),
        other => other,
      };
    }
    Ok(())
  }

  fn apply_sources(
    &mut self,
    op: OpKind,
    dst: &Position,
    pool: &SourcePool,
    key: &mut usize,
    is_multi: bool,
    log: &mut MutationLog,
  ) {
    if let SourcePool::Exec { command, sources } = pool {
      if sources.is_empty() {
        // -e alone evaluates the command from the destination entry
        match execute_cli(command, dst) {
          Ok(value) => self.apply_one(op, dst, &Source::plain(value), log),
          Err(err) => eprintln!("error: {err}"),
        }
        return;
      }
    }
    let total = pool.len();
    while *key < total {
      debug!(instance = *key, total, "applying source instance");
      match self.fetch_source(pool, *key, log) {
        Ok(src) => self.apply_one(op, dst, &src, log),
        Err(msg) => eprintln!("error: {msg}"),
      }
      *key += 1;
      if is_multi {
        if *key >= total {
          *key = 0;
        }
        break;
      }
    }
  }

  fn fetch_source(&self, pool: &SourcePool, key: usize, log: &MutationLog) -> Result<Source, String> {
    let stale = || format!("walk instance {key} became invalid due to prior operations, skipping");
    match pool {
      SourcePool::Static(sources) => Ok(sources[key].clone()),
      SourcePool::Walked { positions } => {
        let pos = &positions[key];
        if !log.is_valid(pos) {
          return Err(stale());
        }
        Source::from_position(&self.json, pos).ok_or_else(stale)
      }
      SourcePool::Exec { command, sources } => {
        let pos = &sources[key];
        if !log.is_valid(pos) {
          return Err(stale());
        }
        execute_cli(command, pos)
          .map(Source::plain)
          .map_err(|e| e.to_string())
      }
    }
  }

  fn apply_one(&mut self, op: OpKind, dst: &Position, src: &Source, log: &mut MutationLog) {
    let outcome = match op {
      OpKind::Insert => mutate::insert(&mut self.json, dst, src, self.opts.merge, log),
      OpKind::Update => mutate::update(&mut self.json, dst, src, self.opts.merge, log),
    };
    if let Err(err) = outcome {
      eprintln!("error: {err}, skipping");
    }
  }

  /// Resolve `-i`/`-u`/`-c` parameters: file, then JSON literal, then
  /// walk-path. A static JSON followed by walk parameters is walked itself
  /// instead of the input.
  fn resolve_sources(&self, params: &[String]) -> Result<SourcePool> {
    if self.opts.exec {
      let command = params.first().cloned().unwrap_or_default();
      let mut sources = Vec::new();
      for walk in params.iter().skip(1) {
        let program = compile_walk(walk)?;
        sources.extend(Walker::new(&self.json, &program));
      }
      return Ok(SourcePool::Exec { command, sources });
    }

    let mut statics: Vec<Json> = Vec::new();
    let mut walk_args: Vec<&String> = Vec::new();
    for arg in params {
      if let Ok(text) = std::fs::read_to_string(arg) {
        if let Ok(json) = parse_json(&text) {
          debug!(%arg, "parameter read from a file");
          statics.push(json);
          continue;
        }
      }
      if let Ok(json) = parse_json(arg) {
        statics.push(json);
        continue;
      }
      debug!(%arg, "parameter taken as a walk-path");
      walk_args.push(arg);
    }
    if walk_args.is_empty() {
      return Ok(SourcePool::Static(
        statics.into_iter().map(Source::plain).collect(),
      ));
    }

    let static_base = statics.into_iter().next();
    let base = static_base.as_ref().unwrap_or(&self.json);
    let mut positions = Vec::new();
    for walk in walk_args {
      let program = compile_walk(walk)?;
      positions.extend(Walker::new(base, &program));
    }

    if !self.opts.templates.is_empty() {
      // interpolate every template per source match; failures fall back
      let mut out = Vec::new();
      for pos in &positions {
        for template in &self.opts.templates {
          let shaped = interpolate(template, pos, true);
          out.push(Source::plain(if shaped.is_neither() {
            pos.value(base).cloned().unwrap_or(Json::Null)
          } else {
            shaped
          }));
        }
      }
      return Ok(SourcePool::Static(out));
    }
    match static_base {
      Some(base) => Ok(SourcePool::Static(
        positions
          .iter()
          .filter_map(|p| Source::from_position(&base, p))
          .collect(),
      )),
      None => Ok(SourcePool::Walked { positions }),
    }
  }

  fn compare_op(&mut self) -> Result<i32> {
    let atomic = self.json.is_atomic();
    if atomic {
      let inner = std::mem::take(&mut self.json);
      self.json = Json::Array(vec![inner]);
    }
    let walks = if self.walks.is_empty() {
      vec![if atomic { "[0]".to_string() } else { String::new() }]
    } else {
      self.walks.clone()
    };
    let comparators: Vec<Json> = match self.resolve_sources(&self.opts.compare)? {
      SourcePool::Static(sources) => sources.into_iter().map(|s| s.value).collect(),
      SourcePool::Walked { positions } => positions
        .iter()
        .filter_map(|p| p.value(&self.json).cloned())
        .collect(),
      SourcePool::Exec { .. } => Vec::new(),
    };
    let (_, delivered) = self.delivered(&walks)?;

    let mut differs = false;
    for (key, (pos, _group)) in delivered.iter().enumerate() {
      let Some(comparator) = comparators.get(key) else {
        break;
      };
      let base = pos.value(&self.json).cloned().unwrap_or(Json::Null);
      let (side1, side2, equal) = mutate::compare(&base, comparator);
      debug!(instance = key, equal, "compared pair");
      if !equal {
        differs = true;
      }
      let side1 = Json::obj([("json_1", side1)]);
      let side2 = Json::obj([("json_2", side2)]);
      self.out.emit(self.opts, &self.json, pos, 0, Some(side1));
      self.out.emit(self.opts, &self.json, pos, 0, Some(side2));
    }
    if self.opts.jsonize > 0 {
      let jout = std::mem::take(&mut self.out.jout);
      write_json(self.opts, jout, false, self.global.as_deref_mut())?;
    }
    Ok(if differs { COMPARE_DIFFERS } else { 0 })
  }

  fn swap_op(&mut self) -> Result<i32> {
    if self.walks.len() != 2 {
      return Err(
        anyhow!("swap pairs the elements of exactly two walks")
          .context(EC::WalksRequired { count: 2, exact: true }),
      );
    }
    let first = self.collect_one(&self.walks[0])?;
    let second = self.collect_one(&self.walks[1])?;
    for i in 0..first.len().min(second.len()) {
      if mutate::swap(&mut self.json, &first[i], &second[i]).is_err() {
        eprintln!("fail: walk instance {i} became invalid due to prior operations, aborting");
        return Ok(EC::PositionInvalidated.exit_code());
      }
    }
    Ok(0)
  }

  fn purge_op(&mut self) -> Result<()> {
    let walks = if self.walks.is_empty() {
      vec![String::new()]
    } else {
      self.walks.clone()
    };
    if self.opts.purge >= 2 {
      let mut keep = Vec::new();
      for walk in &walks {
        keep.extend(self.collect_one(walk)?);
      }
      mutate::crop(&mut self.json, &keep);
    } else {
      for walk in &walks {
        let targets = self.collect_one(walk)?;
        debug!(targets = targets.len(), walk = %walk, "purging");
        mutate::purge(&mut self.json, &targets);
      }
    }
    Ok(())
  }
}
