use crate::node::{Json, Step};
use crate::path::{Anchor, MutationLog, Position};

use std::collections::{HashSet, VecDeque};

use thiserror::Error;
use tracing::{debug, warn};

/// A refused or impossible mutation; surfaced as a warning and skipped.
#[derive(Debug, Error)]
pub enum MutationError {
  #[error("insert into label not applicable, use update")]
  InsertIntoLabel,
  #[error("only an iterable could be insert-merged with an object")]
  NonIterableIntoObject,
  #[error("walk-path must point to an iterable, or use merging")]
  NonIterableDestination,
  #[error("only labels could be updated with valid JSON strings")]
  LabelNeedsString,
  #[error("labels could be updated in objects only")]
  LabelOutsideObject,
  #[error("walk position became invalid due to prior operations")]
  InvalidPosition,
}

/// Insert/update operand: the value plus the label it walked from, if any.
#[derive(Debug, Clone)]
pub struct Source {
  pub value: Json,
  pub label: Option<String>,
}

impl Source {
  pub fn plain(value: Json) -> Self {
    Source { value, label: None }
  }

  pub fn from_position(root: &Json, pos: &Position) -> Option<Self> {
    Some(Source {
      value: pos.value(root)?.clone(),
      label: pos.label().map(str::to_string),
    })
  }

  /// `{label: value}` when labeled, the bare value otherwise
  fn labeled(&self) -> Json {
    match &self.label {
      Some(label) => Json::Object([(label.clone(), self.value.clone())].into_iter().collect()),
      None => self.value.clone(),
    }
  }
}

/// Clash resolution of merging: preserve coalesces into arrays (insert),
/// overwrite replaces (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
  Preserve,
  Overwrite,
}

/// Insert `src` at the destination position. The destination is never
/// rewritten; `merge` extends it per the merge rules.
pub fn insert(
  root: &mut Json,
  dst: &Position,
  src: &Source,
  merge: bool,
  log: &mut MutationLog,
) -> Result<(), MutationError> {
  if dst.anchor == Anchor::Label {
    return Err(MutationError::InsertIntoLabel);
  }
  if !log.is_valid(dst) {
    return Err(MutationError::InvalidPosition);
  }
  let dnode = dst.value_mut(root).ok_or(MutationError::InvalidPosition)?;

  if dnode.is_object() {
    if src.label.is_some() {
      merge_into_object(dnode, src.labeled(), MergeMode::Preserve, merge);
    } else if src.value.is_iterable() {
      merge_into_object(dnode, src.value.clone(), MergeMode::Preserve, merge);
    } else {
      return Err(MutationError::NonIterableIntoObject);
    }
    return Ok(());
  }
  if merge {
    debug!("merging into array");
    merge_into_array(dnode, &src.value, MergeMode::Preserve);
    return Ok(());
  }
  if let Some(items) = dnode.as_array_mut() {
    items.push(src.labeled());
    return Ok(());
  }
  Err(MutationError::NonIterableDestination)
}

/// Update the destination position with `src`: plain replacement, label
/// rename for label-anchored destinations, or merge-overwrite with `merge`.
pub fn update(
  root: &mut Json,
  dst: &Position,
  src: &Source,
  merge: bool,
  log: &mut MutationLog,
) -> Result<(), MutationError> {
  if !log.is_valid(dst) {
    return Err(MutationError::InvalidPosition);
  }
  if dst.anchor == Anchor::Label {
    if merge {
      warn!("merge not applicable in label update, ignoring");
    }
    return rename_label(root, dst, src, log);
  }
  let dnode = dst.value_mut(root).ok_or(MutationError::InvalidPosition)?;

  if !merge {
    debug!("destination being overwritten");
    *dnode = src.value.clone();
    log.replaced(&dst.steps);
    return Ok(());
  }
  debug!("destination being merged");
  if dnode.is_object() {
    merge_into_object(dnode, src.labeled(), MergeMode::Overwrite, true);
  } else if dnode.is_array() {
    merge_into_array(dnode, &src.value, MergeMode::Overwrite);
  } else {
    *dnode = src.labeled();
  }
  log.replaced(&dst.steps);
  Ok(())
}

/// `<..>l`-style destination: move the object entry from the old label to
/// the new one, keeping its slot.
fn rename_label(
  root: &mut Json,
  dst: &Position,
  src: &Source,
  log: &mut MutationLog,
) -> Result<(), MutationError> {
  let Json::String(new_label) = &src.value else {
    return Err(MutationError::LabelNeedsString);
  };
  let old_label = dst
    .label()
    .ok_or(MutationError::LabelOutsideObject)?
    .to_string();
  let parent = dst
    .parent_steps()
    .and_then(|p| root.at_path_mut(p))
    .ok_or(MutationError::InvalidPosition)?;
  let map = parent
    .as_object_mut()
    .ok_or(MutationError::LabelOutsideObject)?;
  if *new_label == old_label {
    return Ok(());
  }
  let (mut slot, _, value) = map
    .shift_remove_full(&old_label)
    .ok_or(MutationError::InvalidPosition)?;
  // a pre-existing entry under the new label is overwritten
  if let Some((taken, _, _)) = map.shift_remove_full(new_label) {
    if taken < slot {
      slot -= 1;
    }
  }
  map.shift_insert(slot.min(map.len()), new_label.clone(), value);
  log.removed(&dst.steps);
  Ok(())
}

/// Merge `src` into `dst` as arrays; non-array destinations are first
/// wrapped, non-iterable sources treated as one-element arrays.
pub fn merge_into_array(dst: &mut Json, src: &Json, mode: MergeMode) {
  if !dst.is_array() {
    let old = std::mem::take(dst);
    *dst = Json::Array(vec![old]);
  }
  let items: Vec<Json> = if src.is_iterable() {
    src.children().into_iter().map(|(_, v)| v.clone()).collect()
  } else {
    vec![src.clone()]
  };
  let slots = dst.as_array_mut().expect("destination is an array");
  match mode {
    MergeMode::Preserve => slots.extend(items),
    MergeMode::Overwrite => {
      for (slot, item) in slots.iter_mut().zip(items) {
        *slot = item;
      }
    }
  }
}

/// Merge an iterable `src` into an object `dst`. Non-clashing labels are
/// copied; object-object clashes recurse via the worklist; other clashes
/// coalesce (preserve) or overwrite only when `merge` is set. An array
/// source extends the object's children element-wise, `merge` only.
pub fn merge_into_object(dst: &mut Json, src: Json, mode: MergeMode, merge: bool) {
  let mut work: VecDeque<(Vec<Step>, Json)> = VecDeque::from([(Vec::new(), src)]);
  while let Some((rel, src)) = work.pop_front() {
    let Some(d) = dst.at_path_mut(&rel) else {
      continue;
    };
    if !src.is_object() {
      if !merge {
        continue;
      }
      debug!("merge array into object");
      let items: Vec<Json> = if src.is_array() {
        src.children().into_iter().map(|(_, v)| v.clone()).collect()
      } else {
        vec![src]
      };
      let Some(map) = d.as_object_mut() else {
        continue;
      };
      for ((_, slot), item) in map.iter_mut().zip(items) {
        match mode {
          MergeMode::Overwrite => *slot = item,
          MergeMode::Preserve => merge_into_array(slot, &item, mode),
        }
      }
      continue;
    }
    debug!("merge objects");
    let Json::Object(entries) = src else {
      unreachable!()
    };
    let Some(map) = d.as_object_mut() else {
      continue;
    };
    for (key, value) in entries {
      match map.get_mut(&key) {
        None => {
          map.insert(key, value);
        }
        Some(existing) => {
          if existing.is_object() && value.is_object() {
            let mut sub = rel.clone();
            sub.push(Step::Key(key));
            work.push_back((sub, value));
          } else if merge {
            match mode {
              MergeMode::Overwrite => *existing = value,
              MergeMode::Preserve => merge_into_array(existing, &value, mode),
            }
          }
        }
      }
    }
  }
}

/// Remove every walked node from its parent. Deepest and rightmost targets
/// go first so earlier removals cannot shift later ones; targets that no
/// longer resolve are skipped.
pub fn purge(root: &mut Json, positions: &[Position]) {
  let mut paths: Vec<Vec<Step>> = positions.iter().map(|p| p.steps.clone()).collect();
  paths.sort();
  paths.dedup();
  for path in paths.iter().rev() {
    remove_at(root, path);
  }
}

fn remove_at(root: &mut Json, path: &[Step]) {
  let Some((last, parent_path)) = path.split_last() else {
    root.clear();
    return;
  };
  let Some(parent) = root.at_path_mut(parent_path) else {
    return;
  };
  match (last, parent) {
    (Step::Key(k), Json::Object(map)) => {
      map.shift_remove(k);
    }
    (Step::Idx(i), Json::Array(items)) => {
      if *i < items.len() {
        items.remove(*i);
      }
    }
    _ => {}
  }
}

/// Inverted purge (`-pp`): keep only walked nodes, their subtrees and their
/// ancestor chains; everything else goes.
pub fn crop(root: &mut Json, keep: &[Position]) {
  let kept: Vec<Vec<Step>> = keep.iter().map(|p| p.steps.clone()).collect();
  debug!(preserved = kept.len(), "crop-out");
  let is_ancestor = |path: &[Step]| {
    kept
      .iter()
      .any(|k| path.len() <= k.len() && k[..path.len()] == path[..])
  };
  let is_inside = |path: &[Step]| {
    kept
      .iter()
      .any(|k| k.len() <= path.len() && path[..k.len()] == k[..])
  };
  let doomed: Vec<Vec<Step>> = root
    .preorder()
    .map(|(path, _)| path)
    .filter(|path| !is_ancestor(path) && !is_inside(path))
    .collect();
  for path in doomed.iter().rev() {
    remove_at(root, path);
  }
}

/// Swap the values of two walked positions.
pub fn swap(root: &mut Json, a: &Position, b: &Position) -> Result<(), MutationError> {
  let va = a.value(root).ok_or(MutationError::InvalidPosition)?.clone();
  let vb = b.value(root).ok_or(MutationError::InvalidPosition)?.clone();
  *a.value_mut(root).ok_or(MutationError::InvalidPosition)? = vb;
  *b.value_mut(root).ok_or(MutationError::InvalidPosition)? = va;
  Ok(())
}

/// Mutual diff of two trees. Returns both sides pruned down to the
/// differing nodes (and their ancestors), plus the equality verdict.
pub fn compare(j1: &Json, j2: &Json) -> (Json, Json, bool) {
  let mut d1: HashSet<Vec<Step>> = HashSet::new();
  let mut d2: HashSet<Vec<Step>> = HashSet::new();
  let mut work: VecDeque<(Vec<Step>, &Json, &Json)> = VecDeque::from([(Vec::new(), j1, j2)]);

  while let Some((path, a, b)) = work.pop_front() {
    if std::mem::discriminant(a) != std::mem::discriminant(b) {
      d1.insert(path.clone());
      d2.insert(path);
      continue;
    }
    match (a, b) {
      (Json::Object(ma), Json::Object(mb)) => {
        let mut labels: Vec<&String> = ma.keys().collect();
        labels.extend(mb.keys().filter(|k| !ma.contains_key(*k)));
        for label in labels {
          let mut sub = path.clone();
          sub.push(Step::key(label.clone()));
          match (ma.get(label), mb.get(label)) {
            (Some(va), Some(vb)) => work.push_back((sub, va, vb)),
            (Some(_), None) => {
              d1.insert(sub);
            }
            (None, Some(_)) => {
              d2.insert(sub);
            }
            (None, None) => unreachable!(),
          }
        }
      }
      (Json::Array(va), Json::Array(vb)) => {
        for i in 0..va.len().max(vb.len()) {
          let mut sub = path.clone();
          sub.push(Step::Idx(i));
          match (va.get(i), vb.get(i)) {
            (Some(ea), Some(eb)) => work.push_back((sub, ea, eb)),
            (Some(_), None) => {
              d1.insert(sub);
            }
            (None, Some(_)) => {
              d2.insert(sub);
            }
            (None, None) => unreachable!(),
          }
        }
      }
      _ => {
        if a != b {
          d1.insert(path.clone());
          d2.insert(path);
        }
      }
    }
  }

  let equal = d1.is_empty() && d2.is_empty();
  let prune = |tree: &Json, diffs: &HashSet<Vec<Step>>| -> Json {
    if tree.is_iterable() {
      let mut pruned = tree.clone();
      let keep: Vec<Position> = diffs.iter().cloned().map(Position::at).collect();
      crop(&mut pruned, &keep);
      pruned
    } else if diffs.is_empty() {
      Json::Object(Default::default())
    } else {
      tree.clone()
    }
  };
  (prune(j1, &d1), prune(j2, &d2), equal)
}
