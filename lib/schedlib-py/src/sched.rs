use pyo3::exceptions::{PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyList;
use pyo3::wrap_pyfunction;
use std::ops::Deref;
use std::str::FromStr;

use crate::run_with_threadpool;
use instances::{dataset, group_name, Activity, ChargeMode, Time, NUM_GROUPS};
use rayon::prelude::*;
use schedgen::rng::SocSampler;
use schedgen::sched::{Params, Schedule, ScheduleEntry, SolveError, Solver};

#[pyclass(module = "sched", name = "Activity")]
#[derive(Clone)]
pub struct ActivityWrapper {
  inner: Activity,
}

impl Deref for ActivityWrapper {
  type Target = Activity;
  fn deref(&self) -> &Activity {
    &self.inner
  }
}

#[pymethods(module = "sched")]
impl ActivityWrapper {
  #[new]
  #[args(charge_mode = "\"none\"", is_charging = "false", is_service_station = "false")]
  fn new(
    id: u16,
    x: f64,
    y: f64,
    group: u8,
    earliest_start: Time,
    latest_start: Time,
    min_duration: Time,
    max_duration: Time,
    des_start_time: Time,
    des_duration: Time,
    charge_mode: &str,
    is_charging: bool,
    is_service_station: bool,
  ) -> PyResult<Self> {
    let charge_mode =
      ChargeMode::from_str(charge_mode).map_err(|e| PyValueError::new_err(e))?;
    Ok(ActivityWrapper {
      inner: Activity {
        id,
        x,
        y,
        group,
        earliest_start,
        latest_start,
        min_duration,
        max_duration,
        des_start_time,
        des_duration,
        charge_mode,
        is_charging,
        is_service_station,
      },
    })
  }

  #[getter("id")]
  fn id(&self) -> u16 { self.id }

  #[getter("group")]
  fn group(&self) -> u8 { self.group }

  #[getter("kind")]
  fn kind(&self) -> &'static str { self.inner.kind() }

  #[getter("earliest_start")]
  fn earliest_start(&self) -> Time { self.earliest_start }

  #[getter("latest_start")]
  fn latest_start(&self) -> Time { self.latest_start }

  #[getter("charge_mode")]
  fn charge_mode(&self) -> String { self.charge_mode.to_string() }

  #[getter("is_charging")]
  fn is_charging(&self) -> bool { self.is_charging }
}

#[pyclass(module = "sched", name = "ScheduleEntry")]
#[derive(Clone)]
pub struct EntryWrapper {
  inner: ScheduleEntry,
}

#[pymethods(module = "sched")]
impl EntryWrapper {
  #[getter("act_id")]
  fn act_id(&self) -> u16 { self.inner.act_id }

  #[getter("kind")]
  fn kind(&self) -> &'static str { group_name(self.inner.group) }

  #[getter("start_time")]
  fn start_time(&self) -> Time { self.inner.start_time }

  #[getter("duration")]
  fn duration(&self) -> Time { self.inner.duration }

  #[getter("soc_start")]
  fn soc_start(&self) -> f64 { self.inner.soc_start }

  #[getter("soc_end")]
  fn soc_end(&self) -> f64 { self.inner.soc_end }

  #[getter("charge_mode")]
  fn charge_mode(&self) -> String { self.inner.charge_mode.to_string() }

  #[getter("charge_duration")]
  fn charge_duration(&self) -> Time { self.inner.charge_duration }

  #[getter("charge_cost")]
  fn charge_cost(&self) -> f64 { self.inner.charge_cost }

  #[getter("utility")]
  fn utility(&self) -> f64 { self.inner.utility }
}

#[pyclass(module = "sched", name = "Schedule")]
pub struct ScheduleWrapper {
  inner: Schedule,
}

#[pymethods(module = "sched")]
impl ScheduleWrapper {
  /// Chronological per-activity records.
  fn entries(&self) -> Vec<EntryWrapper> {
    self
      .inner
      .entries
      .iter()
      .map(|e| EntryWrapper { inner: e.clone() })
      .collect()
  }

  #[getter("utility")]
  fn utility(&self) -> f64 { self.inner.utility }

  #[getter("final_soc")]
  fn final_soc(&self) -> f64 { self.inner.final_soc }

  #[getter("charge_cost")]
  fn charge_cost(&self) -> f64 { self.inner.total_charge_cost() }

  #[getter("dssr_iterations")]
  fn dssr_iterations(&self) -> u32 { self.inner.dssr_iterations }

  #[getter("elementary")]
  fn elementary(&self) -> bool { self.inner.elementary }

  #[getter("solve_seconds")]
  fn solve_seconds(&self) -> f64 { self.inner.solve_seconds }
}

fn solve_error(e: SolveError) -> PyErr {
  PyValueError::new_err(e.to_string())
}

/// One scheduling problem: general parameters plus the activity pool.
#[pyclass(module = "sched", name = "Engine")]
pub struct EngineWrapper {
  params: Params,
  activities: Vec<Activity>,
}

fn weight_table(name: &str, values: Vec<f64>) -> PyResult<[f64; NUM_GROUPS]> {
  if values.len() != NUM_GROUPS {
    return Err(PyValueError::new_err(format!(
      "{} table must have {} entries, got {}",
      name,
      NUM_GROUPS,
      values.len()
    )));
  }
  let mut table = [0.0; NUM_GROUPS];
  table.copy_from_slice(&values);
  Ok(table)
}

#[pymethods(module = "sched")]
impl EngineWrapper {
  #[new]
  fn new() -> Self {
    EngineWrapper { params: Params::default(), activities: Vec::new() }
  }

  #[allow(clippy::too_many_arguments)]
  fn set_general_parameters(
    &mut self,
    horizon: Time,
    speed: f64,
    travel_time_penalty: f64,
    time_interval: Time,
    asc: Vec<f64>,
    early: Vec<f64>,
    late: Vec<f64>,
    long: Vec<f64>,
    short: Vec<f64>,
  ) -> PyResult<()> {
    self.params.horizon = horizon;
    self.params.speed = speed;
    self.params.travel_time_penalty = travel_time_penalty;
    self.params.interval = time_interval;
    self.params.utility.asc = weight_table("asc", asc)?;
    self.params.utility.early = weight_table("early", early)?;
    self.params.utility.late = weight_table("late", late)?;
    self.params.utility.long = weight_table("long", long)?;
    self.params.utility.short = weight_table("short", short)?;
    self.params.validate().map_err(|e| PyValueError::new_err(e.to_string()))
  }

  fn set_activities(&mut self, activities: &PyList) -> PyResult<()> {
    let mut pool = Vec::with_capacity(activities.len());
    for item in activities {
      let a: PyRef<ActivityWrapper> = item.extract()?;
      pool.push(a.inner.clone());
    }
    instances::validate_pool(&pool).map_err(|e| PyValueError::new_err(e.to_string()))?;
    self.activities = pool;
    Ok(())
  }

  /// Solves one day. Returns None when no feasible schedule exists.
  fn solve(&self, initial_soc: f64) -> PyResult<Option<ScheduleWrapper>> {
    let mut solver = Solver::new(&self.params, &self.activities).map_err(solve_error)?;
    match solver.solve(initial_soc) {
      Ok(s) => Ok(Some(ScheduleWrapper { inner: s })),
      Err(SolveError::Infeasible) => Ok(None),
      Err(e) => Err(solve_error(e)),
    }
  }

  /// Independent solves for a batch of starting SoCs, in parallel.
  #[args(cpus = "0")]
  fn solve_batch(
    &self,
    initial_socs: Vec<f64>,
    cpus: usize,
  ) -> PyResult<Vec<Option<ScheduleWrapper>>> {
    let params = &self.params;
    let pool = &self.activities;
    run_with_threadpool(cpus, || {
      initial_socs
        .par_iter()
        .map(|&soc| {
          let mut solver = Solver::new(params, pool).map_err(solve_error)?;
          match solver.solve(soc) {
            Ok(s) => Ok(Some(ScheduleWrapper { inner: s })),
            Err(SolveError::Infeasible) => Ok(None),
            Err(e) => Err(solve_error(e)),
          }
        })
        .collect()
    })
  }
}

/// Deterministic sampler for stochastic starting SoC in drivers.
#[pyclass(module = "sched", name = "SocSampler")]
pub struct SocSamplerWrapper {
  inner: SocSampler,
}

#[pymethods(module = "sched")]
impl SocSamplerWrapper {
  #[new]
  fn new(seed: u64) -> Self {
    SocSamplerWrapper { inner: SocSampler::seeded(seed) }
  }

  fn normal(&mut self, mean: f64, std_dev: f64) -> PyResult<f64> {
    self.inner.normal(mean, std_dev).map_err(|e| PyValueError::new_err(e.to_string()))
  }

  fn initial_soc(&mut self) -> f64 {
    self.inner.initial_soc()
  }
}

#[pyfunction]
pub fn load_fixture(name: &str) -> PyResult<Vec<ActivityWrapper>> {
  let pool = dataset::by_name(name)
    .map_err(|e| PyValueError::new_err(e.to_string()))?;
  Ok(pool.into_iter().map(|inner| ActivityWrapper { inner }).collect())
}

#[pyfunction]
pub fn fixture_names() -> Vec<&'static str> {
  dataset::FIXTURES.iter().map(|f| f.name).collect()
}

pub(crate) fn build_module(py: Python) -> PyResult<&PyModule> {
  let m = PyModule::new(py, "sched")?;
  m.add_class::<ActivityWrapper>()?;
  m.add_class::<EntryWrapper>()?;
  m.add_class::<ScheduleWrapper>()?;
  m.add_class::<EngineWrapper>()?;
  m.add_class::<SocSamplerWrapper>()?;
  m.add_function(wrap_pyfunction!(load_fixture, m)?)?;
  m.add_function(wrap_pyfunction!(fixture_names, m)?)?;
  Ok(m)
}
