//! The forward DP sweep over the time x activity lattice.

use tracing::*;

use super::bucket::Bucket;
use super::label::{GroupSet, Label, LabelId};
use super::{dom, extend, Params};
use crate::data::{ActId, Activity, ActivityPoolExt, Time};

/// Seeds the DAWN root and runs the full time x activity x activity
/// sweep, inserting successors under dominance filtering. Visit order
/// only matters for speed; every extension lands strictly later on the
/// lattice, so a cell is complete by the time the sweep reaches it.
#[instrument(level = "debug", skip_all, fields(n = acts.len()))]
pub fn sweep(
  p: &Params,
  acts: &[Activity],
  memory: &[GroupSet],
  bucket: &mut Bucket,
  initial_soc: f64,
) {
  let root = Label::root(acts.dawn(), initial_soc);
  let root_time = root.time;
  bucket.push(root);

  for t in root_time..p.horizon - 1 {
    for a_from in 0..acts.len() {
      let ids = bucket.cell(t, a_from as ActId).to_vec();
      for lid in ids {
        for a_to in acts {
          if extend::is_feasible(p, acts, bucket, lid, a_to) {
            let cand = extend::extend(p, acts, memory, bucket, lid, a_to);
            dom::insert_with_dominance(bucket, cand);
          }
        }
      }
    }
  }
  debug!(live = bucket.num_live(), created = bucket.arena_len(), "sweep finished");
}

/// Highest-utility label in cell (t, a), if any. With `verbose` the
/// winning chain is logged step by step.
pub fn find_best(bucket: &Bucket, t: Time, a: ActId, verbose: bool) -> Option<LabelId> {
  let mut best: Option<LabelId> = None;
  for &lid in bucket.cell(t, a) {
    let better = match best {
      Some(b) => bucket.label(lid).utility > bucket.label(b).utility,
      None => true,
    };
    if better {
      best = Some(lid);
    }
  }
  match best {
    Some(b) => {
      if verbose {
        debug!(utility = bucket.label(b).utility, "best terminal label");
        for &lid in bucket.chain(b).iter().rev() {
          let l = bucket.label(lid);
          trace!(
            act = l.act_id,
            start = l.start_time,
            duration = l.duration,
            time = l.time,
            soc = l.current_soc,
            "step"
          );
        }
      }
    }
    None => {
      if verbose {
        info!("solution is not feasible, check activity parameters");
      }
    }
  }
  return best;
}
