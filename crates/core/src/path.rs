use crate::node::{Json, Step};

use indexmap::IndexMap;

/// Per-walk bag of captured values; the empty key holds the current match.
pub type Namespace = IndexMap<String, Json>;

/// What a position addresses: the node itself, or the label the node hangs
/// from (produced by final label-search lexemes). Mutating a Label position
/// touches the parent's label map, not a child value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
  Value,
  Label,
}

/// A cursor into a tree: the full step path from the root, plus the walk
/// state captured when it was yielded. Positions do not borrow the tree;
/// they are resolved against it on use and may turn invalid after mutations.
#[derive(Debug, Clone)]
pub struct Position {
  pub steps: Vec<Step>,
  pub anchor: Anchor,
  /// per-lexeme generator counters at yield time (−1 for non-generators)
  pub counters: Vec<i64>,
  /// namespace snapshot at yield time
  pub ns: Namespace,
}

impl Position {
  pub fn root() -> Self {
    Position {
      steps: Vec::new(),
      anchor: Anchor::Value,
      counters: Vec::new(),
      ns: Namespace::new(),
    }
  }

  pub fn at(steps: Vec<Step>) -> Self {
    Position {
      steps,
      ..Position::root()
    }
  }

  pub fn is_root(&self) -> bool {
    self.steps.is_empty()
  }

  /// label of the addressed node, when its parent is an object
  pub fn label(&self) -> Option<&str> {
    self.steps.last()?.as_key()
  }

  pub fn parent_steps(&self) -> Option<&[Step]> {
    if self.steps.is_empty() {
      None
    } else {
      Some(&self.steps[..self.steps.len() - 1])
    }
  }

  pub fn value<'a>(&self, root: &'a Json) -> Option<&'a Json> {
    root.at_path(&self.steps)
  }

  pub fn value_mut<'a>(&self, root: &'a mut Json) -> Option<&'a mut Json> {
    root.at_path_mut(&self.steps)
  }

  pub fn parent<'a>(&self, root: &'a Json) -> Option<&'a Json> {
    root.at_path(self.parent_steps()?)
  }

  /// path as a JSON array (`$PATH`)
  pub fn path_json(&self) -> Json {
    Json::Array(
      self
        .steps
        .iter()
        .map(|s| match s {
          Step::Idx(i) => Json::from(*i),
          Step::Key(k) => Json::String(k.clone()),
        })
        .collect(),
    )
  }

  /// path steps joined with `_` (`$path`); empty at the root
  pub fn path_string(&self) -> String {
    self
      .steps
      .iter()
      .map(|s| s.to_string())
      .collect::<Vec<_>>()
      .join("_")
  }
}

/// One structural edit relevant to position validity.
#[derive(Debug, Clone)]
enum Edit {
  /// subtree at this path was removed; the node and everything under it
  Removed(Vec<Step>),
  /// value at this path was replaced; the node itself stays addressable
  Replaced(Vec<Step>),
  /// array at this path had an element inserted/removed at this index
  ArrayShift(Vec<Step>, usize),
}

/// Record of structural edits; previously collected positions are checked
/// against it before being acted on.
#[derive(Debug, Default)]
pub struct MutationLog {
  edits: Vec<Edit>,
}

impl MutationLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn removed(&mut self, path: &[Step]) {
    self.edits.push(Edit::Removed(path.to_vec()));
  }

  pub fn replaced(&mut self, path: &[Step]) {
    self.edits.push(Edit::Replaced(path.to_vec()));
  }

  pub fn array_shifted(&mut self, parent: &[Step], index: usize) {
    self.edits.push(Edit::ArrayShift(parent.to_vec(), index));
  }

  pub fn is_valid(&self, pos: &Position) -> bool {
    for edit in &self.edits {
      match edit {
        Edit::Removed(p) => {
          if pos.steps.len() >= p.len() && pos.steps[..p.len()] == p[..] {
            return false;
          }
        }
        Edit::Replaced(p) => {
          if pos.steps.len() > p.len() && pos.steps[..p.len()] == p[..] {
            return false;
          }
        }
        Edit::ArrayShift(parent, index) => {
          if pos.steps.len() > parent.len() && pos.steps[..parent.len()] == parent[..] {
            if let Step::Idx(i) = pos.steps[parent.len()] {
              if i >= *index {
                return false;
              }
            }
          }
        }
      }
    }
    true
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn parsed(src: &str) -> Json {
    serde_json::from_str(src).expect("should parse")
  }

  #[test]
  fn test_resolve_and_label() {
    let root = parsed(r#"{"a":{"b":[5]}}"#);
    let pos = Position::at(vec![Step::key("a"), Step::key("b"), Step::Idx(0)]);
    assert_eq!(pos.value(&root), Some(&Json::from(5i64)));
    assert_eq!(pos.label(), None);
    let pos = Position::at(vec![Step::key("a"), Step::key("b")]);
    assert_eq!(pos.label(), Some("b"));
    assert_eq!(pos.parent(&root), root.get("a"));
  }

  #[test]
  fn test_path_rendition() {
    let pos = Position::at(vec![Step::key("a"), Step::Idx(2), Step::key("c")]);
    assert_eq!(pos.path_json().to_string(), r#"["a",2,"c"]"#);
    assert_eq!(pos.path_string(), "a_2_c");
    assert_eq!(Position::root().path_string(), "");
  }

  #[test]
  fn test_invalidation_by_removal() {
    let mut log = MutationLog::new();
    log.removed(&[Step::key("a")]);
    let inside = Position::at(vec![Step::key("a"), Step::Idx(0)]);
    let exact = Position::at(vec![Step::key("a")]);
    let sibling = Position::at(vec![Step::key("b")]);
    assert!(!log.is_valid(&inside));
    assert!(!log.is_valid(&exact));
    assert!(log.is_valid(&sibling));
  }

  #[test]
  fn test_invalidation_by_replacement() {
    let mut log = MutationLog::new();
    log.replaced(&[Step::key("a")]);
    let inside = Position::at(vec![Step::key("a"), Step::Idx(0)]);
    let exact = Position::at(vec![Step::key("a")]);
    assert!(!log.is_valid(&inside));
    assert!(log.is_valid(&exact));
  }

  #[test]
  fn test_invalidation_by_array_shift() {
    let mut log = MutationLog::new();
    log.array_shifted(&[Step::key("a")], 2);
    let before = Position::at(vec![Step::key("a"), Step::Idx(1)]);
    let at = Position::at(vec![Step::key("a"), Step::Idx(2)]);
    let past = Position::at(vec![Step::key("a"), Step::Idx(5), Step::key("x")]);
    assert!(log.is_valid(&before));
    assert!(!log.is_valid(&at));
    assert!(!log.is_valid(&past));
  }
}
