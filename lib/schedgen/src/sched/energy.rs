//! Geometry and energy kernel: planar distances, lattice travel times
//! and SoC bookkeeping for travel and charging.

use super::Params;
use crate::data::{Activity, ChargeMode, Time};

#[inline]
pub fn distance(a: &Activity, b: &Activity) -> f64 {
  let dx = b.x - a.x;
  let dy = b.y - a.y;
  return (dx * dx + dy * dy).sqrt();
}

/// Travel time in whole lattice intervals. Raw minutes are rounded up
/// to the next multiple of the interval width so the lattice never
/// under-reports travel.
#[inline]
pub fn travel_time(p: &Params, a: &Activity, b: &Activity) -> Time {
  let minutes = distance(a, b) / p.speed;
  return (minutes / p.interval as f64).ceil() as Time;
}

/// SoC fraction consumed driving from `a` to `b`.
#[inline]
pub fn consumed_soc(p: &Params, a: &Activity, b: &Activity) -> f64 {
  let km = distance(a, b) / 1000.0;
  return p.energy.consumption_rate * km / p.energy.battery_capacity;
}

/// SoC fraction added by one interval on a charger of the given mode.
#[inline]
pub fn charge_rate(p: &Params, mode: ChargeMode) -> f64 {
  let power = match mode {
    ChargeMode::None => return 0.0,
    ChargeMode::Slow => p.energy.slow_charge_power,
    ChargeMode::Fast => p.energy.fast_charge_power,
    ChargeMode::Rapid => p.energy.rapid_charge_power,
  };
  return power / p.energy.battery_capacity * (p.interval as f64 / 60.0);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::dataset;

  fn params() -> Params {
    Params { speed: 100.0, ..Params::default() }
  }

  fn at(x: f64, y: f64) -> Activity {
    Activity { x, y, ..dataset::dawn(0.0, 0.0, 288) }
  }

  #[test]
  fn euclidean_distance() {
    assert_eq!(distance(&at(0.0, 0.0), &at(3.0, 4.0)), 5.0);
    assert_eq!(distance(&at(1.0, 1.0), &at(1.0, 1.0)), 0.0);
  }

  #[test]
  fn travel_rounds_up_to_interval_multiples() {
    let p = params();
    // 100 m/min, 5-minute intervals: one interval covers 500 m
    assert_eq!(travel_time(&p, &at(0.0, 0.0), &at(0.0, 0.0)), 0);
    assert_eq!(travel_time(&p, &at(0.0, 0.0), &at(499.0, 0.0)), 1);
    assert_eq!(travel_time(&p, &at(0.0, 0.0), &at(500.0, 0.0)), 1);
    assert_eq!(travel_time(&p, &at(0.0, 0.0), &at(501.0, 0.0)), 2);
    assert_eq!(travel_time(&p, &at(0.0, 0.0), &at(2600.0, 0.0)), 6);
  }

  #[test]
  fn soc_consumption_scales_with_distance() {
    let p = params();
    // 60 kWh battery, 0.2 kWh/km: 30 km drains a tenth of the battery
    let soc = consumed_soc(&p, &at(0.0, 0.0), &at(30_000.0, 0.0));
    assert!((soc - 0.1).abs() < 1e-12);
  }

  #[test]
  fn charge_rates_per_interval() {
    let p = params();
    assert_eq!(charge_rate(&p, ChargeMode::None), 0.0);
    // 7 kW on 60 kWh for 5 minutes
    let slow = charge_rate(&p, ChargeMode::Slow);
    assert!((slow - 7.0 / 60.0 / 12.0).abs() < 1e-12);
    assert!(charge_rate(&p, ChargeMode::Rapid) > charge_rate(&p, ChargeMode::Fast));
  }
}
