//! Pareto dominance between labels sharing a (time, activity) cell.

use super::bucket::Bucket;
use super::label::{Label, LabelId};

/// True when `l1` renders `l2` redundant: no worse on utility, at least
/// as restricted (a *superset* of visited groups means every future
/// path blocked for `l2` is blocked for `l1` too), and no later in
/// time. The time check is redundant while cells are indexed exactly by
/// time but is kept so bucket relaxations cannot silently weaken the
/// order. A partial order: the three checks must never be collapsed
/// into a total one.
pub fn dominates(l1: &Label, l2: &Label) -> bool {
  if l1.act_id != l2.act_id {
    return false;
  }
  return l1.utility >= l2.utility && l2.mem.is_subset(&l1.mem) && l1.time <= l2.time;
}

/// Inserts `cand` into its cell under dominance filtering: discarded if
/// any resident dominates it, otherwise evicts every resident it
/// dominates and appends at the tail.
pub fn insert_with_dominance(bucket: &mut Bucket, cand: Label) -> Option<LabelId> {
  let (t, a) = (cand.time, cand.act_id);
  for &rid in bucket.cell(t, a) {
    if dominates(bucket.label(rid), &cand) {
      return None;
    }
  }
  bucket.retain_cell(t, a, |resident| !dominates(&cand, resident));
  return Some(bucket.push(cand));
}
