//! Feasibility checks and label extension: the one-step successor
//! relation of the DP.

use super::bucket::Bucket;
use super::label::{GroupSet, Label, LabelId};
use super::{energy, tariff, Params};
use crate::data::{group, ActivityPoolExt, Activity, ChargeMode, Time};

/// Can the label at `lid` be extended with activity `a`? Covers both
/// cases: staying one more interval at the same activity, and
/// transitioning to a different one.
pub fn is_feasible(p: &Params, acts: &[Activity], bucket: &Bucket, lid: LabelId, a: &Activity) -> bool {
  let l = bucket.label(lid);

  // DAWN can only ever occupy position 0
  if l.act_id != 0 && a.id == 0 {
    return false;
  }

  if l.act_id == a.id {
    // stay one more interval
    if l.duration + 1 > a.max_duration {
      return false;
    }
    if a.is_charging {
      if a.charge_mode == ChargeMode::None {
        return false;
      }
      // no switching charger speed mid-activity
      if acts[l.act_id as usize].charge_mode != a.charge_mode {
        return false;
      }
      let rate = energy::charge_rate(p, a.charge_mode);
      if l.current_soc + rate > 1.0 {
        return false;
      }
    }
    if a.is_service_station && !a.is_charging {
      return false;
    }
    return true;
  }

  // transition to a different activity
  if let Some(pid) = l.previous {
    // no A -> B -> A chatter of length 2
    if bucket.label(pid).act_id == a.id {
      return false;
    }
  }
  if l.act_id as usize == acts.len() - 1 {
    return false; // nothing follows DUSK
  }
  let act = &acts[l.act_id as usize];
  if l.duration < act.min_duration {
    return false;
  }

  let tt = energy::travel_time(p, act, a);
  let home_leg = energy::travel_time(p, a, acts.dusk());
  // must still be able to reach DUSK before the end of the day
  if l.time + tt + a.min_duration + home_leg >= p.horizon - 1 {
    return false;
  }
  let arrival = l.time + tt;
  if arrival < a.earliest_start || arrival > a.latest_start {
    return false;
  }
  if a.group != group::HOME && l.mem.contains(a.group) {
    return false;
  }
  if l.current_soc - energy::consumed_soc(p, act, a) < 0.0 {
    return false;
  }
  if a.is_service_station && !a.is_charging {
    return false;
  }
  if a.is_charging && a.charge_mode == ChargeMode::None {
    return false;
  }
  return true;
}

/// Builds the successor label. Assumes `is_feasible` held.
pub fn extend(
  p: &Params,
  acts: &[Activity],
  memory: &[GroupSet],
  bucket: &Bucket,
  lid: LabelId,
  a: &Activity,
) -> Label {
  let l = bucket.label(lid);
  if l.act_id == a.id {
    return stay(p, lid, l, a);
  } else {
    return transition(p, acts, memory, bucket, lid, l, a);
  }
}

/// One more interval at the current activity. Utility only moves at
/// transitions; SoC and cost move here when charging.
fn stay(p: &Params, lid: LabelId, l: &Label, a: &Activity) -> Label {
  let mut next = Label {
    act_id: l.act_id,
    time: l.time + 1,
    start_time: l.start_time,
    duration: l.duration + 1,
    charge_duration: l.charge_duration,
    soc_at_activity_start: l.soc_at_activity_start,
    current_soc: l.current_soc,
    delta_soc: 0.0,
    charge_cost: l.charge_cost,
    utility: l.utility,
    mem: l.mem,
    previous: Some(lid),
  };
  if a.is_charging && next.current_soc < 1.0 {
    let t_now = next.time;
    charge_one_interval(p, &mut next, a, t_now);
  }
  return next;
}

/// Travel to `a`, enter it at its minimum duration (DUSK absorbs the
/// rest of the day instead), then settle the utility of the finished
/// activity.
fn transition(
  p: &Params,
  acts: &[Activity],
  memory: &[GroupSet],
  bucket: &Bucket,
  lid: LabelId,
  l: &Label,
  a: &Activity,
) -> Label {
  let act = &acts[l.act_id as usize];
  let tt = energy::travel_time(p, act, a);
  let start_time = l.time + tt;
  let (time, duration) = if a.id == acts.dusk_id() {
    (p.horizon - 1, p.horizon - 1 - start_time)
  } else {
    (start_time + a.min_duration, a.min_duration)
  };

  let soc_at_start = l.current_soc - energy::consumed_soc(p, act, a);
  let mut mem = l.mem;
  mem.insert(a.group);
  mem.union_inplace(&memory[a.id as usize]);

  let mut next = Label {
    act_id: a.id,
    time,
    start_time,
    duration,
    charge_duration: 0,
    soc_at_activity_start: soc_at_start,
    current_soc: soc_at_start,
    delta_soc: 0.0,
    charge_cost: l.charge_cost,
    utility: 0.0,
    mem,
    previous: Some(lid),
  };
  if a.is_charging {
    charge_one_interval(p, &mut next, a, start_time);
  }
  next.utility = transition_utility(p, acts, bucket, &next, l, a, tt);
  return next;
}

/// One interval on the charger: SoC clamped at full, spend priced at
/// the TOU factor of the moment.
fn charge_one_interval(p: &Params, label: &mut Label, a: &Activity, t_now: Time) {
  let (rate, price) = tariff::charge_rate_and_price(p, a);
  let delta = (1.0 - label.current_soc).min(rate);
  label.current_soc += delta;
  label.delta_soc = delta;
  label.charge_duration += 1;
  label.charge_cost += price * tariff::tou_factor(p, t_now) * delta * p.energy.battery_capacity;
}

/// Utility increments realised when leaving `l`'s activity for `a`:
/// the new activity's ASC and travel penalty, the finished activity's
/// duration deviation, the new activity's start deviation, and the
/// finished activity's charging terms.
fn transition_utility(
  p: &Params,
  acts: &[Activity],
  bucket: &Bucket,
  next: &Label,
  l: &Label,
  a: &Activity,
  tt: Time,
) -> f64 {
  let w = p.interval as f64;
  let uw = &p.utility;
  let prev_act = &acts[l.act_id as usize];
  let pg = prev_act.group as usize;
  let g = a.group as usize;

  let mut u = l.utility;
  u += uw.asc[g];
  u -= p.travel_time_penalty * tt as f64;

  if prev_act.group != group::HOME && !prev_act.is_service_station {
    u += uw.short[pg] * w * (prev_act.des_duration - l.duration).max(0) as f64;
    u += uw.long[pg] * w * (l.duration - prev_act.des_duration).max(0) as f64;
  }
  if a.group != group::HOME && !a.is_service_station {
    u += uw.early[g] * w * (a.des_start_time - next.start_time).max(0) as f64;
    u += uw.late[g] * w * (next.start_time - a.des_start_time).max(0) as f64;
  }

  if prev_act.is_charging {
    u += match prev_act.group {
      group::WORK => uw.gamma_charge_work,
      group::HOME => uw.gamma_charge_home,
      _ => uw.gamma_charge_non_work,
    };
    u += uw.theta_soc * (uw.soc_threshold - l.soc_at_activity_start).max(0.0);
    u += uw.beta_delta_soc * (l.current_soc - l.soc_at_activity_start);
    let inherited = match l.previous {
      Some(pp) => bucket.label(pp).charge_cost,
      None => 0.0,
    };
    u += uw.beta_charge_cost * (l.charge_cost - inherited);
  }
  return u;
}
