use std::fmt;
use std::time::Instant;
use tracing::*;

use crate::data::*;
use crate::IntUid;
use crate::define_u32_id_type;

pub mod bucket;
pub mod dom;
pub mod dp;
pub mod dssr;
pub mod energy;
pub mod extend;
pub mod label;
pub mod schedule;
pub mod tariff;

pub use bucket::Bucket;
pub use dom::dominates;
pub use label::{GroupSet, Label, LabelId};
pub use schedule::{Schedule, ScheduleEntry};

define_u32_id_type!(SolveId);

/// Physical parameters of the vehicle and its chargers.
#[derive(Debug, Clone)]
pub struct EnergyModel {
  /// Battery capacity in kWh.
  pub battery_capacity: f64,
  /// Consumption in kWh per km driven.
  pub consumption_rate: f64,
  /// Charger powers in kW.
  pub slow_charge_power: f64,
  pub fast_charge_power: f64,
  pub rapid_charge_power: f64,
}

impl Default for EnergyModel {
  fn default() -> Self {
    EnergyModel {
      battery_capacity: 60.0,
      consumption_rate: 0.2,
      slow_charge_power: 7.0,
      fast_charge_power: 22.0,
      rapid_charge_power: 50.0,
    }
  }
}

/// Time-of-use tariff: base prices per kWh and the wall-clock windows
/// their multipliers apply in. Windows are half-open hour ranges.
#[derive(Debug, Clone)]
pub struct TariffSchedule {
  pub home_slow_price: f64,
  pub ac_price: f64,
  pub public_dc_price: f64,
  pub peak_factor: f64,
  pub midpeak_factor: f64,
  pub offpeak_factor: f64,
  pub peak_hours: (i32, i32),
  pub midpeak1_hours: (i32, i32),
  pub midpeak2_hours: (i32, i32),
}

impl Default for TariffSchedule {
  fn default() -> Self {
    TariffSchedule {
      home_slow_price: 0.26,
      ac_price: 0.52,
      public_dc_price: 0.79,
      peak_factor: 1.5,
      midpeak_factor: 2.5,
      offpeak_factor: 1.0,
      peak_hours: (12, 18),
      midpeak1_hours: (8, 12),
      midpeak2_hours: (18, 21),
    }
  }
}

/// Utility weights. Deviation tables are indexed by group tag and are
/// supplied negative so deviations reduce utility.
#[derive(Debug, Clone)]
pub struct UtilityWeights {
  pub asc: [f64; NUM_GROUPS],
  pub early: [f64; NUM_GROUPS],
  pub late: [f64; NUM_GROUPS],
  pub long: [f64; NUM_GROUPS],
  pub short: [f64; NUM_GROUPS],
  pub gamma_charge_work: f64,
  pub gamma_charge_home: f64,
  pub gamma_charge_non_work: f64,
  pub theta_soc: f64,
  pub beta_delta_soc: f64,
  pub beta_charge_cost: f64,
  pub soc_threshold: f64,
}

impl Default for UtilityWeights {
  fn default() -> Self {
    UtilityWeights {
      asc: [0.0; NUM_GROUPS],
      early: [0.0; NUM_GROUPS],
      late: [0.0; NUM_GROUPS],
      long: [0.0; NUM_GROUPS],
      short: [0.0; NUM_GROUPS],
      gamma_charge_work: -3.59,
      gamma_charge_home: -3.34,
      gamma_charge_non_work: -4.34,
      theta_soc: -80.0,
      beta_delta_soc: 25.0,
      beta_charge_cost: -0.3,
      soc_threshold: 0.3,
    }
  }
}

/// Everything one solve reads. Built once, validated once, then shared
/// immutably; independent solves may borrow the same value.
#[derive(Debug, Clone)]
pub struct Params {
  /// Number of lattice intervals in the day.
  pub horizon: Time,
  /// Interval width in minutes.
  pub interval: Time,
  /// Travel speed in metres per minute.
  pub speed: f64,
  pub travel_time_penalty: f64,
  pub utility: UtilityWeights,
  pub energy: EnergyModel,
  pub tariff: TariffSchedule,
  pub max_dssr_iterations: u32,
}

impl Default for Params {
  fn default() -> Self {
    Params {
      horizon: 288,
      interval: 5,
      speed: 547.2,
      travel_time_penalty: 0.1,
      utility: UtilityWeights::default(),
      energy: EnergyModel::default(),
      tariff: TariffSchedule::default(),
      max_dssr_iterations: 40,
    }
  }
}

impl Params {
  pub fn validate(&self) -> Result<(), ParamError> {
    if self.horizon < 2 {
      return Err(ParamError::Horizon(self.horizon));
    }
    if self.interval < 1 {
      return Err(ParamError::Interval(self.interval));
    }
    if !(self.speed > 0.0) {
      return Err(ParamError::Speed(self.speed));
    }
    if !(self.energy.battery_capacity > 0.0) {
      return Err(ParamError::BatteryCapacity(self.energy.battery_capacity));
    }
    if self.energy.consumption_rate < 0.0 {
      return Err(ParamError::ConsumptionRate(self.energy.consumption_rate));
    }
    for &power in &[
      self.energy.slow_charge_power,
      self.energy.fast_charge_power,
      self.energy.rapid_charge_power,
    ] {
      if !(power > 0.0) {
        return Err(ParamError::ChargerPower(power));
      }
    }
    for &price in &[
      self.tariff.home_slow_price,
      self.tariff.ac_price,
      self.tariff.public_dc_price,
    ] {
      if price < 0.0 {
        return Err(ParamError::NegativePrice(price));
      }
    }
    for &factor in &[
      self.tariff.peak_factor,
      self.tariff.midpeak_factor,
      self.tariff.offpeak_factor,
    ] {
      if !(factor > 0.0) {
        return Err(ParamError::TariffFactor(factor));
      }
    }
    let windows = [
      self.tariff.peak_hours,
      self.tariff.midpeak1_hours,
      self.tariff.midpeak2_hours,
    ];
    for w in &windows {
      if w.0 > w.1 {
        return Err(ParamError::TariffWindows);
      }
    }
    for (i, w1) in windows.iter().enumerate() {
      for w2 in &windows[i + 1..] {
        if w1.0 < w2.1 && w2.0 < w1.1 {
          return Err(ParamError::TariffWindows);
        }
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
  Horizon(Time),
  Interval(Time),
  Speed(f64),
  BatteryCapacity(f64),
  ConsumptionRate(f64),
  ChargerPower(f64),
  NegativePrice(f64),
  TariffFactor(f64),
  TariffWindows,
  HorizonTooShort { horizon: Time, dawn_min_duration: Time },
  InitialSoc(f64),
}

impl fmt::Display for ParamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use ParamError::*;
    match self {
      Horizon(h) => write!(f, "horizon must span at least two intervals, got {}", h),
      Interval(w) => write!(f, "interval width must be positive, got {}", w),
      Speed(v) => write!(f, "speed must be positive, got {}", v),
      BatteryCapacity(c) => write!(f, "battery capacity must be positive, got {}", c),
      ConsumptionRate(r) => write!(f, "consumption rate must be non-negative, got {}", r),
      ChargerPower(p) => write!(f, "charger power must be positive, got {}", p),
      NegativePrice(p) => write!(f, "charge price must be non-negative, got {}", p),
      TariffFactor(x) => write!(f, "TOU factor must be positive, got {}", x),
      TariffWindows => write!(f, "TOU windows must be ordered and pairwise disjoint"),
      HorizonTooShort { horizon, dawn_min_duration } => write!(
        f,
        "horizon {} leaves no room after the first activity's minimum stay of {}",
        horizon, dawn_min_duration
      ),
      InitialSoc(s) => write!(f, "initial SoC must lie in [0, 1], got {}", s),
    }
  }
}

impl std::error::Error for ParamError {}

#[derive(Debug)]
pub enum SolveError {
  Param(ParamError),
  Instance(InstanceError),
  /// No label reaches the terminal cell; the host decides how to relax.
  Infeasible,
}

impl fmt::Display for SolveError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SolveError::Param(e) => write!(f, "parameter error: {}", e),
      SolveError::Instance(e) => write!(f, "activity pool error: {}", e),
      SolveError::Infeasible => write!(f, "no feasible schedule"),
    }
  }
}

impl From<ParamError> for SolveError {
  fn from(e: ParamError) -> Self {
    SolveError::Param(e)
  }
}

impl From<InstanceError> for SolveError {
  fn from(e: InstanceError) -> Self {
    SolveError::Instance(e)
  }
}

impl std::error::Error for SolveError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      SolveError::Param(e) => Some(e),
      SolveError::Instance(e) => Some(e),
      SolveError::Infeasible => None,
    }
  }
}

/// One scheduling problem: immutable parameters and activity pool, plus
/// the per-activity DSSR memory that evolves between sweeps.
pub struct Solver<'a> {
  params: &'a Params,
  activities: &'a [Activity],
  memory: Vec<GroupSet>,
}

impl<'a> Solver<'a> {
  pub fn new(params: &'a Params, activities: &'a [Activity]) -> Result<Self, SolveError> {
    params.validate()?;
    validate_pool(activities)?;
    let dawn = activities.dawn();
    if dawn.min_duration >= params.horizon - 1 {
      return Err(
        ParamError::HorizonTooShort {
          horizon: params.horizon,
          dawn_min_duration: dawn.min_duration,
        }
        .into(),
      );
    }
    Ok(Solver {
      params,
      activities,
      memory: vec![GroupSet::new(); activities.len()],
    })
  }

  /// DSSR memory accumulated by the most recent solve, one set per
  /// activity. Cleared again at the top of the next solve.
  pub fn memory(&self) -> &[GroupSet] {
    &self.memory
  }

  /// Runs {DP sweep -> best terminal label -> DSSR} to its fixed point
  /// and extracts the schedule of the final best label.
  pub fn solve(&mut self, initial_soc: f64) -> Result<Schedule, SolveError> {
    if !(0.0..=1.0).contains(&initial_soc) {
      return Err(ParamError::InitialSoc(initial_soc).into());
    }
    let solve_id = SolveId::new();
    let span = info_span!("solve", id = solve_id.raw(), n = self.activities.len());
    let _g = span.enter();
    let started = Instant::now();

    for m in self.memory.iter_mut() {
      *m = GroupSet::new();
    }

    let dusk = self.activities.dusk_id();
    let terminal_time = self.params.horizon - 1;
    let mut dssr_iterations = 0u32;
    let mut elementary = true;

    let (bucket, best) = loop {
      let mut bucket = Bucket::new(self.params.horizon, self.activities.len());
      dp::sweep(self.params, self.activities, &self.memory, &mut bucket, initial_soc);
      let best = match dp::find_best(&bucket, terminal_time, dusk, false) {
        Some(b) => b,
        None => {
          info!(dssr_iterations, "no feasible schedule");
          return Err(SolveError::Infeasible);
        }
      };
      if !dssr::detect_and_mark(self.activities, &bucket, &mut self.memory, best) {
        break (bucket, best);
      }
      dssr_iterations += 1;
      if dssr_iterations >= self.params.max_dssr_iterations {
        warn!(dssr_iterations, "DSSR iteration cap hit, schedule may be non-elementary");
        elementary = false;
        break (bucket, best);
      }
    };

    let solve_seconds = started.elapsed().as_secs_f64();
    let sched = schedule::extract(
      self.activities,
      &bucket,
      best,
      dssr_iterations,
      elementary,
      solve_seconds,
    );
    info!(
      utility = sched.utility,
      entries = sched.entries.len(),
      dssr_iterations,
      "solve finished"
    );
    Ok(sched)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::dataset;
  use crate::init_test_logging;

  fn work_friendly_params() -> Params {
    // the host's ASC table makes out-of-home activities worth doing
    let mut p = Params::default();
    p.utility.asc[group::WORK as usize] = 12.0;
    p.utility.asc[group::SHOPPING as usize] = 6.0;
    p.utility.asc[group::LEISURE as usize] = 5.0;
    p.utility.asc[group::ESCORT as usize] = 3.0;
    p.utility.early = [-0.1; NUM_GROUPS];
    p.utility.late = [-0.1; NUM_GROUPS];
    p.utility.long = [-0.05; NUM_GROUPS];
    p.utility.short = [-0.05; NUM_GROUPS];
    p
  }

  #[test]
  fn minimal_pool_schedules_a_quiet_day() {
    init_test_logging(None::<&str>);
    let pool = dataset::minimal();
    let params = Params::default();
    let mut solver = Solver::new(&params, &pool).unwrap();
    let sched = solver.solve(1.0).unwrap();
    assert_eq!(sched.entries.last().unwrap().act_id, 1);
    assert!(sched.utility.is_finite());
    assert_eq!(sched.total_charge_cost(), 0.0);
    assert_eq!(sched.dssr_iterations, 0);
    assert!(sched.elementary);
  }

  #[test]
  fn work_with_slow_charge_day() {
    let pool = dataset::work_slow_charge();
    let params = work_friendly_params();
    let mut solver = Solver::new(&params, &pool).unwrap();
    let initial_soc = 0.6;
    let sched = solver.solve(initial_soc).unwrap();

    let work: Vec<_> = sched.entries.iter().filter(|e| e.act_id == 1).collect();
    assert_eq!(work.len(), 1, "exactly one work block expected");
    let work = work[0];
    assert!(60 <= work.start_time && work.start_time <= 276);
    assert!(10 <= work.duration && work.duration <= 144);
    assert!(work.is_charging);
    // charging can only raise SoC while parked
    assert!(work.soc_end >= work.soc_start);
    assert!((sched.total_charge_cost() > 0.0) == (sched.charging_intervals() > 0));
    assert!(sched.is_group_elementary());
  }

  #[test]
  fn unreachable_terminal_window_is_infeasible() {
    let mut pool = dataset::work_slow_charge();
    // DUSK can only start in [280, 281] but then needs 50 intervals
    let dusk = pool.last_mut().unwrap();
    dusk.earliest_start = 280;
    dusk.latest_start = 281;
    dusk.min_duration = 50;
    let params = Params::default();
    let mut solver = Solver::new(&params, &pool).unwrap();
    match solver.solve(1.0) {
      Err(SolveError::Infeasible) => {}
      other => panic!("expected infeasibility, got {:?}", other.map(|s| s.utility)),
    }
  }

  #[test]
  fn eleven_activity_day_terminates_elementary() {
    let pool = dataset::eleven_activity_day();
    let params = work_friendly_params();
    let mut solver = Solver::new(&params, &pool).unwrap();
    let sched = solver.solve(0.9).unwrap();
    assert_eq!(sched.entries.last().unwrap().act_id, 10);
    assert!(sched.elementary);
    // after termination every non-home group appears at most once
    assert!(sched.is_group_elementary());
    // the DSSR fixed point leaves nothing left to mark
    let marks = solver.memory().to_vec();
    let again = solver.solve(0.9).unwrap();
    assert_eq!(sched.utility, again.utility);
    assert_eq!(marks, solver.memory());
  }

  #[test]
  fn drained_battery_cannot_leave_home() {
    let mut pool = dataset::minimal();
    // park DUSK 100 km away: the trip needs a third of the battery
    pool[1].x += 100_000.0;
    let params = Params::default();
    let mut solver = Solver::new(&params, &pool).unwrap();
    match solver.solve(0.05) {
      Err(SolveError::Infeasible) => {}
      other => panic!("expected infeasibility, got {:?}", other.map(|s| s.utility)),
    }
  }

  #[test]
  fn solves_are_deterministic() {
    let pool = dataset::eleven_activity_day();
    let params = work_friendly_params();
    let mut solver = Solver::new(&params, &pool).unwrap();
    let a = solver.solve(0.7).unwrap();
    let b = solver.solve(0.7).unwrap();
    assert_eq!(a.utility, b.utility);
    assert_eq!(a.entries, b.entries);
  }

  #[test]
  fn parameter_errors_are_rejected_up_front() {
    let pool = dataset::minimal();

    let params = Params { horizon: 0, ..Params::default() };
    assert!(matches!(
      Solver::new(&params, &pool),
      Err(SolveError::Param(ParamError::Horizon(0)))
    ));

    let params = Params { interval: 0, ..Params::default() };
    assert!(matches!(
      Solver::new(&params, &pool),
      Err(SolveError::Param(ParamError::Interval(0)))
    ));

    let mut params = Params::default();
    params.tariff.midpeak1_hours = (11, 13); // overlaps the peak window
    assert!(matches!(
      Solver::new(&params, &pool),
      Err(SolveError::Param(ParamError::TariffWindows))
    ));

    let params = Params::default();
    let mut bad_pool = dataset::minimal();
    bad_pool[0].min_duration = 5;
    bad_pool[0].max_duration = 2;
    assert!(matches!(
      Solver::new(&params, &bad_pool),
      Err(SolveError::Instance(InstanceError::DurationOrder { id: 0 }))
    ));

    let mut solver = Solver::new(&params, &pool).unwrap();
    assert!(matches!(
      solver.solve(1.5),
      Err(SolveError::Param(ParamError::InitialSoc(_)))
    ));
  }
}
