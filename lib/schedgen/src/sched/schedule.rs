//! Turning the winning label chain back into a chronological schedule.

use itertools::Itertools;

use super::bucket::Bucket;
use super::label::{Label, LabelId};
use crate::data::{group, ActId, Activity, ChargeMode, Group, Time};
use crate::Set;

/// One activity instance of the final day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
  pub act_id: ActId,
  pub group: Group,
  pub start_time: Time,
  pub duration: Time,
  pub soc_start: f64,
  pub soc_end: f64,
  pub charge_mode: ChargeMode,
  pub is_charging: bool,
  pub charge_duration: Time,
  /// Spend on charging at this instance alone.
  pub charge_cost: f64,
  /// Cumulative utility at the end of the instance.
  pub utility: f64,
}

/// A complete solved day plus solve statistics.
#[derive(Debug, Clone)]
pub struct Schedule {
  pub entries: Vec<ScheduleEntry>,
  pub utility: f64,
  pub final_soc: f64,
  pub dssr_iterations: u32,
  /// False only when the DSSR iteration cap was hit with a cycle still
  /// present.
  pub elementary: bool,
  pub solve_seconds: f64,
}

impl Schedule {
  pub fn total_charge_cost(&self) -> f64 {
    self.entries.iter().map(|e| e.charge_cost).sum()
  }

  pub fn charging_intervals(&self) -> Time {
    self.entries.iter().map(|e| e.charge_duration).sum()
  }

  /// Non-home groups visited over the day.
  pub fn groups_visited(&self) -> Set<Group> {
    self
      .entries
      .iter()
      .map(|e| e.group)
      .filter(|&g| g != group::HOME)
      .collect()
  }

  /// True when no non-home group appears more than once.
  pub fn is_group_elementary(&self) -> bool {
    let distinct = self.groups_visited().len();
    let total = self
      .entries
      .iter()
      .filter(|e| e.group != group::HOME)
      .count();
    return distinct == total;
  }
}

/// Walks `best`'s back-chain to the root and collapses the
/// one-label-per-interval runs into per-instance entries.
pub fn extract(
  acts: &[Activity],
  bucket: &Bucket,
  best: LabelId,
  dssr_iterations: u32,
  elementary: bool,
  solve_seconds: f64,
) -> Schedule {
  let mut chain = bucket.chain(best);
  chain.reverse();
  let labels: Vec<&Label> = chain.iter().map(|&id| bucket.label(id)).collect();

  // one label per interval; one entry per (activity, start) run
  let mut entries = Vec::new();
  for (_, run) in &labels.iter().group_by(|l| (l.act_id, l.start_time)) {
    let run = run.collect_vec();
    let first = run[0];
    let last = run[run.len() - 1];
    let a = &acts[last.act_id as usize];
    let cost_before = match first.previous {
      Some(p) => bucket.label(p).charge_cost,
      None => 0.0,
    };
    entries.push(ScheduleEntry {
      act_id: last.act_id,
      group: a.group,
      start_time: last.start_time,
      duration: last.duration,
      soc_start: last.soc_at_activity_start,
      soc_end: last.current_soc,
      charge_mode: a.charge_mode,
      is_charging: a.is_charging,
      charge_duration: last.charge_duration,
      charge_cost: last.charge_cost - cost_before,
      utility: last.utility,
    });
  }

  let tip = labels[labels.len() - 1];
  return Schedule {
    utility: tip.utility,
    final_soc: tip.current_soc,
    entries,
    dssr_iterations,
    elementary,
    solve_seconds,
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::{dataset, ActivityPoolExt};
  use crate::sched::label::GroupSet;
  use crate::sched::{dp, Params};

  fn solve_raw(pool: &[Activity], soc: f64) -> (Params, Bucket, LabelId) {
    let p = Params::default();
    let memory = vec![GroupSet::new(); pool.len()];
    let mut bucket = Bucket::new(p.horizon, pool.len());
    dp::sweep(&p, pool, &memory, &mut bucket, soc);
    let best = dp::find_best(&bucket, p.horizon - 1, pool.dusk_id(), false).unwrap();
    (p, bucket, best)
  }

  #[test]
  fn entries_are_chronological_and_contiguous() {
    let pool = dataset::work_slow_charge();
    let (p, bucket, best) = solve_raw(&pool, 0.8);
    let sched = extract(&pool, &bucket, best, 0, true, 0.0);

    assert_eq!(sched.entries.first().unwrap().act_id, 0);
    assert_eq!(sched.entries.last().unwrap().act_id, pool.dusk_id());
    assert_eq!(sched.entries.last().unwrap().start_time + sched.entries.last().unwrap().duration,
               p.horizon - 1);
    for pair in sched.entries.windows(2) {
      assert!(pair[0].start_time + pair[0].duration <= pair[1].start_time);
    }
    assert_eq!(sched.utility, bucket.label(best).utility);
    assert_eq!(sched.final_soc, bucket.label(best).current_soc);
  }

  #[test]
  fn charge_cost_is_attributed_per_instance() {
    let pool = dataset::work_slow_charge();
    let (_, bucket, best) = solve_raw(&pool, 0.5);
    let sched = extract(&pool, &bucket, best, 0, true, 0.0);
    let total: f64 = sched.total_charge_cost();
    assert!((total - bucket.label(best).charge_cost).abs() < 1e-9);
    for e in &sched.entries {
      if !e.is_charging {
        assert_eq!(e.charge_cost, 0.0);
        assert_eq!(e.charge_duration, 0);
      }
    }
  }

  #[test]
  fn group_elementarity_helper() {
    let pool = dataset::work_slow_charge();
    let (_, bucket, best) = solve_raw(&pool, 0.8);
    let sched = extract(&pool, &bucket, best, 0, true, 0.0);
    assert!(sched.is_group_elementary());
  }
}
