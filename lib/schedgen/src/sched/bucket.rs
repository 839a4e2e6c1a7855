//! The label store: an H x N grid of cells over an arena of labels.
//!
//! Cell (t, a) lists the ids of the non-dominated labels ending at time
//! `t` with last activity `a`. The arena owns every label ever created
//! in a sweep; eviction under dominance only unlinks a label from its
//! cell, so back-chains running through evicted labels stay valid.
//! Dropping the bucket is the single release point.

use super::label::{Label, LabelId};
use crate::data::{ActId, Time};

pub struct Bucket {
  horizon: Time,
  num_activities: usize,
  labels: Vec<Label>,
  cells: Vec<Vec<LabelId>>,
}

impl Bucket {
  pub fn new(horizon: Time, num_activities: usize) -> Self {
    return Bucket {
      horizon,
      num_activities,
      labels: Vec::new(),
      cells: vec![Vec::new(); horizon as usize * num_activities],
    };
  }

  #[inline]
  fn cell_index(&self, t: Time, a: ActId) -> usize {
    debug_assert!(0 <= t && t < self.horizon);
    debug_assert!((a as usize) < self.num_activities);
    return t as usize * self.num_activities + a as usize;
  }

  #[inline]
  pub fn cell(&self, t: Time, a: ActId) -> &[LabelId] {
    return &self.cells[self.cell_index(t, a)];
  }

  #[inline]
  pub fn label(&self, id: LabelId) -> &Label {
    return &self.labels[id as usize];
  }

  /// Appends the label to the arena and to the tail of its (time,
  /// activity) cell.
  pub fn push(&mut self, label: Label) -> LabelId {
    let ci = self.cell_index(label.time, label.act_id);
    let id = self.labels.len() as LabelId;
    self.labels.push(label);
    self.cells[ci].push(id);
    return id;
  }

  /// Unlinks every label of the cell that fails the predicate. The
  /// labels themselves stay in the arena.
  pub fn retain_cell(&mut self, t: Time, a: ActId, mut keep: impl FnMut(&Label) -> bool) {
    let ci = self.cell_index(t, a);
    let labels = &self.labels;
    self.cells[ci].retain(|&id| keep(&labels[id as usize]));
  }

  /// Walks the back-chain from `id` to the root, inclusive.
  pub fn chain(&self, id: LabelId) -> Vec<LabelId> {
    let mut out = vec![id];
    let mut cur = self.label(id).previous;
    while let Some(p) = cur {
      out.push(p);
      cur = self.label(p).previous;
    }
    return out;
  }

  /// Every label still linked into some cell.
  pub fn live<'a>(&'a self) -> impl Iterator<Item = &'a Label> + 'a {
    self.cells.iter().flatten().map(move |&id| self.label(id))
  }

  pub fn num_live(&self) -> usize {
    self.cells.iter().map(|c| c.len()).sum()
  }

  /// Total labels ever created this sweep, evicted ones included.
  pub fn arena_len(&self) -> usize {
    self.labels.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::dataset;
  use crate::sched::label::GroupSet;

  fn dummy(time: Time, act_id: ActId, previous: Option<LabelId>) -> Label {
    Label {
      act_id,
      time,
      start_time: 0,
      duration: time,
      charge_duration: 0,
      soc_at_activity_start: 1.0,
      current_soc: 1.0,
      delta_soc: 0.0,
      charge_cost: 0.0,
      utility: 0.0,
      mem: GroupSet::new(),
      previous,
    }
  }

  #[test]
  fn push_links_cell_tail() {
    let mut b = Bucket::new(10, 2);
    let first = b.push(dummy(3, 1, None));
    let second = b.push(dummy(3, 1, Some(first)));
    assert_eq!(b.cell(3, 1), &[first, second]);
    assert!(b.cell(3, 0).is_empty());
    assert_eq!(b.num_live(), 2);
  }

  #[test]
  fn retain_unlinks_but_preserves_chains() {
    let mut b = Bucket::new(10, 2);
    let root = b.push(dummy(1, 0, None));
    let child = b.push(dummy(4, 1, Some(root)));
    b.retain_cell(1, 0, |_| false);
    assert!(b.cell(1, 0).is_empty());
    // the chain through the evicted root still resolves
    assert_eq!(b.chain(child), vec![child, root]);
    assert_eq!(b.arena_len(), 2);
    assert_eq!(b.num_live(), 1);
  }

  #[test]
  fn root_sits_in_its_cell() {
    let pool = dataset::minimal();
    let mut b = Bucket::new(288, pool.len());
    let root = b.push(Label::root(&pool[0], 1.0));
    assert_eq!(b.cell(pool[0].min_duration, 0), &[root]);
  }
}
