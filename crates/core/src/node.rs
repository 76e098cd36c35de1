use indexmap::IndexMap;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt;

pub use serde_json::Number;

/// Ordered label -> value mapping of an object node.
/// Insertion order is the traversal order; equality ignores it.
pub type Map = IndexMap<String, Json>;

/// One step of a path from the root: an array index or an object label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
  Idx(usize),
  Key(String),
}

impl Step {
  pub fn key(s: impl Into<String>) -> Self {
    Step::Key(s.into())
  }

  /// label of this step, if it addresses an object child
  pub fn as_key(&self) -> Option<&str> {
    match self {
      Step::Key(k) => Some(k),
      Step::Idx(_) => None,
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Step::Idx(i) => write!(f, "{i}"),
      Step::Key(k) => write!(f, "{k}"),
    }
  }
}

/// A JSON value tree. `Neither` is the interpolator's "no value produced"
/// sentinel and never appears in parsed input.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Json {
  Object(Map),
  Array(Vec<Json>),
  String(String),
  Number(Number),
  Bool(bool),
  #[default]
  Null,
  Neither,
}

impl Json {
  pub fn kind_name(&self) -> &'static str {
    match self {
      Json::Object(_) => "object",
      Json::Array(_) => "array",
      Json::String(_) => "string",
      Json::Number(_) => "number",
      Json::Bool(_) => "boolean",
      Json::Null => "null",
      Json::Neither => "neither",
    }
  }

  pub fn is_object(&self) -> bool {
    matches!(self, Json::Object(_))
  }
  pub fn is_array(&self) -> bool {
    matches!(self, Json::Array(_))
  }
  pub fn is_string(&self) -> bool {
    matches!(self, Json::String(_))
  }
  pub fn is_number(&self) -> bool {
    matches!(self, Json::Number(_))
  }
  pub fn is_bool(&self) -> bool {
    matches!(self, Json::Bool(_))
  }
  pub fn is_null(&self) -> bool {
    matches!(self, Json::Null)
  }
  pub fn is_neither(&self) -> bool {
    matches!(self, Json::Neither)
  }
  pub fn is_atomic(&self) -> bool {
    matches!(
      self,
      Json::String(_) | Json::Number(_) | Json::Bool(_) | Json::Null
    )
  }
  pub fn is_iterable(&self) -> bool {
    matches!(self, Json::Object(_) | Json::Array(_))
  }
  /// a leaf: atomic, `{}` or `[]`
  pub fn is_end_node(&self) -> bool {
    match self {
      Json::Object(m) => m.is_empty(),
      Json::Array(v) => v.is_empty(),
      _ => true,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Json::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&Map> {
    match self {
      Json::Object(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_object_mut(&mut self) -> Option<&mut Map> {
    match self {
      Json::Object(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&Vec<Json>> {
    match self {
      Json::Array(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_array_mut(&mut self) -> Option<&mut Vec<Json>> {
    match self {
      Json::Array(v) => Some(v),
      _ => None,
    }
  }

  /// number of immediate children (0 for atoms)
  pub fn children_len(&self) -> usize {
    match self {
      Json::Object(m) => m.len(),
      Json::Array(v) => v.len(),
      _ => 0,
    }
  }

  /// immediate children with the step addressing each
  pub fn children(&self) -> Vec<(Step, &Json)> {
    match self {
      Json::Object(m) => m
        .iter()
        .map(|(k, v)| (Step::Key(k.clone()), v))
        .collect(),
      Json::Array(v) => v
        .iter()
        .enumerate()
        .map(|(i, v)| (Step::Idx(i), v))
        .collect(),
      _ => Vec::new(),
    }
  }

  /// n-th immediate child by traversal order
  pub fn child(&self, nth: usize) -> Option<(Step, &Json)> {
    match self {
      Json::Object(m) => m.get_index(nth).map(|(k, v)| (Step::Key(k.clone()), v)),
      Json::Array(v) => v.get(nth).map(|v| (Step::Idx(nth), v)),
      _ => None,
    }
  }

  pub fn get(&self, label: &str) -> Option<&Json> {
    self.as_object()?.get(label)
  }

  /// total number of nodes in this tree, the root included
  pub fn node_count(&self) -> usize {
    let mut count = 0;
    let mut stack = vec![self];
    while let Some(node) = stack.pop() {
      count += 1;
      match node {
        Json::Object(m) => stack.extend(m.values()),
        Json::Array(v) => stack.extend(v.iter()),
        _ => {}
      }
    }
    count
  }

  /// Resolve a path of steps against this tree.
  pub fn at_path(&self, steps: &[Step]) -> Option<&Json> {
    let mut node = self;
    for step in steps {
      node = match (step, node) {
        (Step::Idx(i), Json::Array(v)) => v.get(*i)?,
        (Step::Key(k), Json::Object(m)) => m.get(k)?,
        _ => return None,
      };
    }
    Some(node)
  }

  pub fn at_path_mut(&mut self, steps: &[Step]) -> Option<&mut Json> {
    let mut node = self;
    for step in steps {
      node = match (step, node) {
        (Step::Idx(i), Json::Array(v)) => v.get_mut(*i)?,
        (Step::Key(k), Json::Object(m)) => m.get_mut(k)?,
        _ => return None,
      };
    }
    Some(node)
  }

  /// Pre-order traversal of the subtree, the subtree root first.
  /// Yielded paths are relative to `self`.
  pub fn preorder(&self) -> Preorder<'_> {
    Preorder {
      stack: vec![(Vec::new(), self)],
    }
  }

  /// empty both iterables and atoms in place
  pub fn clear(&mut self) {
    match self {
      Json::Object(m) => m.clear(),
      Json::Array(v) => v.clear(),
      other => *other = Json::Null,
    }
  }

  pub fn obj(entries: impl IntoIterator<Item = (&'static str, Json)>) -> Json {
    Json::Object(
      entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
    )
  }
}

impl From<&str> for Json {
  fn from(s: &str) -> Self {
    Json::String(s.to_string())
  }
}

impl From<i64> for Json {
  fn from(n: i64) -> Self {
    Json::Number(Number::from(n))
  }
}

impl From<usize> for Json {
  fn from(n: usize) -> Self {
    Json::Number(Number::from(n as u64))
  }
}

impl From<bool> for Json {
  fn from(b: bool) -> Self {
    Json::Bool(b)
  }
}

/// Explicit-stack pre-order walk, document order.
pub struct Preorder<'a> {
  stack: Vec<(Vec<Step>, &'a Json)>,
}

impl<'a> Iterator for Preorder<'a> {
  type Item = (Vec<Step>, &'a Json);

  fn next(&mut self) -> Option<Self::Item> {
    let (path, node) = self.stack.pop()?;
    // children pushed in reverse so the leftmost pops first
    for (step, child) in node.children().into_iter().rev() {
      let mut sub = path.clone();
      sub.push(step);
      self.stack.push((sub, child));
    }
    Some((path, node))
  }
}

impl Serialize for Json {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Json::Object(m) => {
        let mut map = serializer.serialize_map(Some(m.len()))?;
        for (k, v) in m {
          map.serialize_entry(k, v)?;
        }
        map.end()
      }
      Json::Array(v) => {
        let mut seq = serializer.serialize_seq(Some(v.len()))?;
        for item in v {
          seq.serialize_element(item)?;
        }
        seq.end()
      }
      Json::String(s) => serializer.serialize_str(s),
      Json::Number(n) => n.serialize(serializer),
      Json::Bool(b) => serializer.serialize_bool(*b),
      Json::Null | Json::Neither => serializer.serialize_unit(),
    }
  }
}

impl<'de> Deserialize<'de> for Json {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct JsonVisitor;

    impl<'de> Visitor<'de> for JsonVisitor {
      type Value = Json;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any valid JSON value")
      }

      fn visit_bool<E>(self, b: bool) -> Result<Json, E> {
        Ok(Json::Bool(b))
      }
      fn visit_i64<E>(self, n: i64) -> Result<Json, E> {
        Ok(Json::Number(n.into()))
      }
      fn visit_u64<E>(self, n: u64) -> Result<Json, E> {
        Ok(Json::Number(n.into()))
      }
      fn visit_f64<E: serde::de::Error>(self, n: f64) -> Result<Json, E> {
        Number::from_f64(n)
          .map(Json::Number)
          .ok_or_else(|| E::custom("not a JSON number"))
      }
      fn visit_str<E>(self, s: &str) -> Result<Json, E> {
        Ok(Json::String(s.to_string()))
      }
      fn visit_string<E>(self, s: String) -> Result<Json, E> {
        Ok(Json::String(s))
      }
      fn visit_unit<E>(self) -> Result<Json, E> {
        Ok(Json::Null)
      }

      fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Json, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
          items.push(item);
        }
        Ok(Json::Array(items))
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Json, A::Error> {
        // entries arrive in document order and the map keeps it
        let mut map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Json>()? {
          map.insert(key, value);
        }
        Ok(Json::Object(map))
      }
    }

    deserializer.deserialize_any(JsonVisitor)
  }
}

impl fmt::Display for Json {
  /// compact one-line rendition
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
    f.write_str(&text)
  }
}
