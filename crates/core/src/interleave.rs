use crate::path::Position;

use std::collections::VecDeque;

use tracing::trace;

/// Feed fully-enumerated walk FIFOs to a subscriber, grouping relevant
/// results across walks.
///
/// Until every FIFO drains, the head positions' counter rows form a
/// front-offsets matrix that is scanned column by column: heads whose offset
/// at the column is negative (or absent) always stay in the running, heads
/// with a non-negative offset stay only when equal to the column minimum.
/// As soon as one walk remains it is emitted; if every column ties, the
/// earliest surviving walk is. The subscriber receives each position along
/// with the width of the last tie group.
///
/// `sequential` concatenates the FIFOs in walk order instead.
pub fn deliver<F>(mut fifos: Vec<VecDeque<Position>>, sequential: bool, mut subscriber: F)
where
  F: FnMut(Position, usize),
{
  if sequential {
    let merged: VecDeque<Position> = fifos.drain(..).flatten().collect();
    fifos = vec![merged];
  }
  while fifos.iter().any(|f| !f.is_empty()) {
    emit_one(&mut fifos, &mut subscriber);
  }
}

fn emit_one<F: FnMut(Position, usize)>(fifos: &mut [VecDeque<Position>], subscriber: &mut F) {
  let longest = fifos
    .iter()
    .filter_map(|f| f.front().map(|p| p.counters.len()))
    .max()
    .unwrap_or(0);
  // walks that still hold positions, in original order
  let mut actuals: Vec<usize> = (0..fifos.len())
    .filter(|&i| !fifos[i].is_empty())
    .collect();

  let mut grouping = 0;
  for column in 0..longest {
    let offset_at = |i: usize| -> i64 {
      fifos[i]
        .front()
        .and_then(|p| p.counters.get(column).copied())
        .unwrap_or(-1)
    };
    let lowest = actuals
      .iter()
      .map(|&i| offset_at(i))
      .filter(|&o| o >= 0)
      .min();
    if let Some(lowest) = lowest {
      actuals.retain(|&i| {
        let offset = offset_at(i);
        offset < 0 || offset == lowest
      });
    }
    grouping = actuals.len();
    if grouping == 1 {
      break;
    }
  }

  let Some(&winner) = actuals.first() else {
    for fifo in fifos.iter_mut() {
      fifo.clear();
    }
    return;
  };
  trace!(winner, grouping, "interleaved emission");
  let head = fifos[winner].pop_front().expect("winner fifo is non-empty");
  subscriber(head, grouping);
}
