use crate::lexeme::{Lexeme, Quantifier, Search, SearchKind, WalkPath};
use crate::node::{Json, Step};
use crate::path::{Anchor, Namespace, Position};

use tracing::trace;

/// Executes a compiled walk-path against a root tree as a lazy, restartable
/// iterator over matching positions.
///
/// The engine keeps one frame per executed lexeme; generator frames suspend
/// an enumeration that is resumed on the next advance, and a local failure
/// backtracks to the nearest generator above.
pub struct Walker<'a> {
  root: &'a Json,
  program: &'a WalkPath,
  frames: Vec<Frame>,
  started: bool,
  done: bool,
  ns: Namespace,
}

struct Frame {
  gen: Option<Gen>,
}

/// Suspended enumeration of a generator lexeme. Items are materialized at
/// frame entry (the per-lexeme cache); `offset` keeps counters absolute.
struct Gen {
  items: Vec<(Vec<Step>, Anchor)>,
  offset: usize,
  next: usize,
}

impl Gen {
  fn step(&mut self) -> Option<(Vec<Step>, Anchor)> {
    let item = self.items.get(self.next)?.clone();
    self.next += 1;
    Some(item)
  }

  /// absolute enumeration index of the last produced item
  fn counter(&self) -> i64 {
    if self.next == 0 {
      -1
    } else {
      (self.offset + self.next - 1) as i64
    }
  }
}

impl<'a> Walker<'a> {
  pub fn new(root: &'a Json, program: &'a WalkPath) -> Self {
    Walker {
      root,
      program,
      frames: Vec::new(),
      started: false,
      done: false,
      ns: Namespace::new(),
    }
  }

  /// restart the iteration from scratch, dropping all cached state
  pub fn reset(&mut self) {
    self.frames.clear();
    self.started = false;
    self.done = false;
    self.ns.clear();
  }

  /// current enumeration index of the generator at lexeme position `i`,
  /// −1 for non-generators and inactive positions
  pub fn counter(&self, i: usize) -> i64 {
    self
      .frames
      .get(i)
      .and_then(|f| f.gen.as_ref())
      .map_or(-1, Gen::counter)
  }

  pub fn namespace(&self) -> &Namespace {
    &self.ns
  }

  fn advance(&mut self) -> Option<Position> {
    if self.done {
      return None;
    }
    // (next lexeme index, path, anchor) to execute forward from
    let mut pending = if self.started {
      None
    } else {
      self.started = true;
      Some((0, Vec::new(), Anchor::Value))
    };
    loop {
      match pending.take() {
        Some((i, path, anchor)) => {
          if i == self.program.len() {
            return Some(self.yield_match(path, anchor));
          }
          if let Some((p, a)) = self.enter(i, path) {
            pending = Some((i + 1, p, a));
          }
          // local failure: fall through to backtracking
        }
        None => loop {
          let Some(frame) = self.frames.last_mut() else {
            self.done = true;
            return None;
          };
          if let Some((p, a)) = frame.gen.as_mut().and_then(Gen::step) {
            pending = Some((self.frames.len(), p, a));
            break;
          }
          self.frames.pop();
        },
      }
    }
  }

  /// Execute lexeme `i` with the given input path. On success a frame is
  /// pushed and the first produced (path, anchor) returned; on local
  /// failure no frame is pushed.
  fn enter(&mut self, i: usize, path: Vec<Step>) -> Option<(Vec<Step>, Anchor)> {
    let produced = match &self.program.lexemes[i] {
      Lexeme::Plain(n) => {
        let node = self.root.at_path(&path)?;
        let (step, _) = node.child(*n)?;
        let mut p = path;
        p.push(step);
        Entry::Single(p)
      }
      Lexeme::Back(n) => {
        if path.len() < *n {
          return None;
        }
        let mut p = path;
        p.truncate(p.len() - n);
        Entry::Single(p)
      }
      Lexeme::FromRoot(n) => {
        if path.len() < *n {
          return None;
        }
        let mut p = path;
        p.truncate(*n);
        Entry::Single(p)
      }
      Lexeme::Label(label) => {
        let node = self.root.at_path(&path)?;
        node.get(label)?;
        let mut p = path;
        p.push(Step::key(label.clone()));
        Entry::Single(p)
      }
      Lexeme::Iterable(start) => {
        let node = self.root.at_path(&path)?;
        Entry::Gen(children_gen(node, &path, *start, node.children_len()))
      }
      Lexeme::Range(slice) => {
        let node = self.root.at_path(&path)?;
        let (lo, hi) = slice.bounds(node.children_len());
        Entry::Gen(children_gen(node, &path, lo, hi))
      }
      Lexeme::Search(search) => {
        let hits = self.search_hits(&path, search);
        match search.quantifier {
          Quantifier::Index(k) => {
            let (p, a) = hits.get(k)?.clone();
            Entry::Anchored(p, a)
          }
          Quantifier::From(k) => Entry::Gen(Gen {
            items: hits.get(k..).map(<[_]>::to_vec).unwrap_or_default(),
            offset: k,
            next: 0,
          }),
          Quantifier::Range(k1, k2) => {
            let hi = k2.unwrap_or(hits.len()).min(hits.len());
            Entry::Gen(Gen {
              items: hits.get(k1..hi).map(<[_]>::to_vec).unwrap_or_default(),
              offset: k1,
              next: 0,
            })
          }
        }
      }
    };
    match produced {
      Entry::Single(p) => {
        self.frames.push(Frame { gen: None });
        Some((p, Anchor::Value))
      }
      Entry::Anchored(p, a) => {
        self.frames.push(Frame { gen: None });
        Some((p, a))
      }
      Entry::Gen(mut gen) => {
        let first = gen.step()?;
        self.frames.push(Frame { gen: Some(gen) });
        Some(first)
      }
    }
  }

  /// All nodes of the search scope matching the lexeme, in document order.
  fn search_hits(&self, base: &[Step], search: &Search) -> Vec<(Vec<Step>, Anchor)> {
    let Some(node) = self.root.at_path(base) else {
      return Vec::new();
    };
    let mut hits = Vec::new();
    let mut visit = |rel: Vec<Step>, cand: &Json| {
      let mut abs = base.to_vec();
      abs.extend(rel);
      if let Some(att) = &search.attached {
        if abs.last().and_then(Step::as_key) != Some(att.as_str()) {
          return;
        }
      }
      let label = abs.last().and_then(Step::as_key);
      if matches(search, cand, label) {
        let anchor = if search.kind.is_label_kind() {
          Anchor::Label
        } else {
          Anchor::Value
        };
        hits.push((abs, anchor));
      }
    };
    if search.recursive {
      for (rel, cand) in node.preorder() {
        visit(rel, cand);
      }
    } else {
      for (step, cand) in node.children() {
        visit(vec![step], cand);
      }
    }
    trace!(
      body = %search.body,
      hits = hits.len(),
      "search lexeme enumerated"
    );
    hits
  }

  fn yield_match(&mut self, path: Vec<Step>, anchor: Anchor) -> Position {
    let value = self
      .root
      .at_path(&path)
      .cloned()
      .unwrap_or(Json::Neither);
    self.ns.insert(String::new(), value);
    Position {
      counters: (0..self.program.len()).map(|i| self.counter(i)).collect(),
      steps: path,
      anchor,
      ns: self.ns.clone(),
    }
  }
}

enum Entry {
  Single(Vec<Step>),
  Anchored(Vec<Step>, Anchor),
  Gen(Gen),
}

fn children_gen(node: &Json, path: &[Step], lo: usize, hi: usize) -> Gen {
  let items = node
    .children()
    .into_iter()
    .skip(lo)
    .take(hi.saturating_sub(lo))
    .map(|(step, _)| {
      let mut p = path.to_vec();
      p.push(step);
      (p, Anchor::Value)
    })
    .collect();
  Gen {
    items,
    offset: lo,
    next: 0,
  }
}

fn matches(search: &Search, cand: &Json, label: Option<&str>) -> bool {
  // regex kinds always carry a compiled pattern
  let regex = || search.regex.as_ref().expect("compiled at walk-path parse");
  match search.kind {
    SearchKind::Str => cand.as_str() == Some(search.body.as_str()),
    SearchKind::StrRegex => cand.as_str().is_some_and(|s| regex().is_match(s)),
    SearchKind::Label => label == Some(search.body.as_str()),
    SearchKind::LabelRegex => label.is_some_and(|l| regex().is_match(l)),
    SearchKind::Num => match cand {
      Json::Number(n) => Some(n) == search.number.as_ref(),
      _ => false,
    },
    SearchKind::NumRegex => match cand {
      Json::Number(n) => regex().is_match(&n.to_string()),
      _ => false,
    },
    SearchKind::Bool => match cand {
      Json::Bool(b) => search.body == "any" || search.body == b.to_string(),
      _ => false,
    },
    SearchKind::Null => cand.is_null(),
    SearchKind::Atom => cand.is_atomic(),
    SearchKind::Object => cand.is_object(),
    SearchKind::Array => cand.is_array(),
    SearchKind::Literal => Some(cand) == search.literal.as_ref(),
    SearchKind::Wide => true,
    SearchKind::End => cand.is_end_node(),
  }
}

impl Iterator for Walker<'_> {
  type Item = Position;

  fn next(&mut self) -> Option<Self::Item> {
    self.advance()
  }
}
