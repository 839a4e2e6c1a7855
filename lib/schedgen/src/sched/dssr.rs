//! Decremental state-space relaxation: detect a repeated non-home group
//! in the best chain and forbid it on the activities between the two
//! occurrences, tightening the next sweep.

use tracing::*;

use super::bucket::Bucket;
use super::label::{GroupSet, Label, LabelId};
use crate::data::{group, ActId, Activity};

/// Scans the back-chain of `best` for a group-level cycle: a recent
/// activity whose group recurs at an earlier label under a different
/// activity id. DUSK and its predecessor index never open a cycle, and
/// neither does the home group (home may legally repeat). On a hit the
/// group is added to the memory of every activity strictly between the
/// two endpoints and `true` is returned; the caller then re-runs the DP.
/// Each hit strictly grows some memory set, so the fixed point exists.
#[instrument(level = "debug", skip(acts, bucket, memory))]
pub fn detect_and_mark(
  acts: &[Activity],
  bucket: &Bucket,
  memory: &mut [GroupSet],
  best: LabelId,
) -> bool {
  let chain = bucket.chain(best);
  let labels: Vec<&Label> = chain.iter().map(|&id| bucket.label(id)).collect();
  let excluded = |id: ActId| id as usize >= acts.len() - 2;

  let mut i = 0;
  while i < labels.len() {
    let near = labels[i];
    // hop over the rest of this activity instance
    let mut j = i;
    while j < labels.len() && labels[j].act_id == near.act_id {
      j += 1;
    }
    let g = acts[near.act_id as usize].group;
    if !excluded(near.act_id) && g != group::HOME {
      for k in j..labels.len() {
        let far = labels[k];
        if acts[far.act_id as usize].group == g && far.act_id != near.act_id {
          for l in &labels[j..k] {
            memory[l.act_id as usize].insert(g);
          }
          debug!(group = g, near = near.act_id, far = far.act_id, "group cycle");
          return true;
        }
      }
    }
    i = j;
  }
  return false;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::dataset;

  /// Builds a chain of one label per activity visit and returns the
  /// bucket plus the tip.
  fn chain_of(acts: &[Activity], visits: &[ActId]) -> (Bucket, LabelId) {
    let mut bucket = Bucket::new(288, acts.len());
    let mut prev: Option<LabelId> = None;
    let mut tip = 0;
    for (step, &id) in visits.iter().enumerate() {
      let t = 2 * step as i32 + 1;
      let label = Label {
        act_id: id,
        time: t,
        start_time: t - 1,
        duration: 1,
        charge_duration: 0,
        soc_at_activity_start: 1.0,
        current_soc: 1.0,
        delta_soc: 0.0,
        charge_cost: 0.0,
        utility: 0.0,
        mem: GroupSet::new(),
        previous: prev,
      };
      tip = bucket.push(label);
      prev = Some(tip);
    }
    (bucket, tip)
  }

  #[test]
  fn elementary_chain_reports_no_cycle() {
    let pool = dataset::eleven_activity_day();
    let mut memory = vec![GroupSet::new(); pool.len()];
    // dawn, work, shopping, leisure, home, dusk
    let (bucket, tip) = chain_of(&pool, &[0, 2, 4, 6, 9, 10]);
    assert!(!detect_and_mark(&pool, &bucket, &mut memory, tip));
    assert!(memory.iter().all(|m| m.is_empty()));
  }

  #[test]
  fn repeated_group_is_marked_between_endpoints() {
    let pool = dataset::eleven_activity_day();
    let mut memory = vec![GroupSet::new(); pool.len()];
    // leisure 6 ... leisure 7: same group, different activities
    let (bucket, tip) = chain_of(&pool, &[0, 6, 2, 8, 7, 9, 10]);
    assert!(detect_and_mark(&pool, &bucket, &mut memory, tip));
    let leisure = pool[6].group;
    // the activities strictly between the two leisure visits carry the mark
    assert!(memory[2].contains(leisure));
    assert!(memory[8].contains(leisure));
    // the endpoints and the rest do not
    assert!(!memory[6].contains(leisure));
    assert!(!memory[7].contains(leisure));
    assert!(!memory[0].contains(leisure));
    assert!(!memory[9].contains(leisure));
  }

  #[test]
  fn home_repeats_are_not_cycles() {
    let pool = dataset::eleven_activity_day();
    let mut memory = vec![GroupSet::new(); pool.len()];
    // dawn, home visit, work, home visit, dusk: home repeats freely
    let (bucket, tip) = chain_of(&pool, &[0, 1, 2, 9, 10]);
    assert!(!detect_and_mark(&pool, &bucket, &mut memory, tip));
  }

  #[test]
  fn tail_indices_never_open_a_cycle() {
    let pool = dataset::eleven_activity_day();
    let mut memory = vec![GroupSet::new(); pool.len()];
    // id 9 (predecessor of DUSK) shares a group with id 1; excluded
    let (bucket, tip) = chain_of(&pool, &[0, 1, 2, 9, 10]);
    assert!(!detect_and_mark(&pool, &bucket, &mut memory, tip));
    assert!(memory.iter().all(|m| m.is_empty()));
  }

  #[test]
  fn marking_is_idempotent_once_clean() {
    let pool = dataset::eleven_activity_day();
    let mut memory = vec![GroupSet::new(); pool.len()];
    let (bucket, tip) = chain_of(&pool, &[0, 6, 2, 7, 10]);
    assert!(detect_and_mark(&pool, &bucket, &mut memory, tip));
    let snapshot: Vec<GroupSet> = memory.clone();
    // a clean chain afterwards neither reports nor mutates
    let (bucket, tip) = chain_of(&pool, &[0, 2, 6, 9, 10]);
    assert!(!detect_and_mark(&pool, &bucket, &mut memory, tip));
    assert_eq!(memory, snapshot);
  }
}
