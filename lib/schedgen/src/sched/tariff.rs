//! Tariff kernel: time-of-use multipliers by wall-clock hour and charger
//! price selection by mode and location kind.

use super::{energy, Params};
use crate::data::{group, Activity, ChargeMode, Time};

/// TOU multiplier for the interval `t`.
pub fn tou_factor(p: &Params, t: Time) -> f64 {
  let hour = (t * p.interval) / 60;
  let within = |w: (i32, i32)| hour >= w.0 && hour < w.1;
  if within(p.tariff.peak_hours) {
    return p.tariff.peak_factor;
  } else if within(p.tariff.midpeak1_hours) || within(p.tariff.midpeak2_hours) {
    return p.tariff.midpeak_factor;
  } else {
    return p.tariff.offpeak_factor;
  }
}

/// Base price per kWh for charging at `a`. Home sockets get the home
/// slow tariff, other slow and fast chargers bill as AC, rapid as
/// public DC.
pub fn charge_price(p: &Params, a: &Activity) -> f64 {
  match a.charge_mode {
    ChargeMode::None => 0.0,
    ChargeMode::Slow => {
      if a.group == group::HOME {
        p.tariff.home_slow_price
      } else {
        p.tariff.ac_price
      }
    }
    ChargeMode::Fast => p.tariff.ac_price,
    ChargeMode::Rapid => p.tariff.public_dc_price,
  }
}

/// (SoC fraction per interval, price per kWh) for charging at `a`.
#[inline]
pub fn charge_rate_and_price(p: &Params, a: &Activity) -> (f64, f64) {
  return (energy::charge_rate(p, a.charge_mode), charge_price(p, a));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::dataset;

  fn hour_interval(p: &Params, hour: Time) -> Time {
    hour * 60 / p.interval
  }

  #[test]
  fn tou_windows() {
    let p = Params::default();
    // defaults: peak 12-18, midpeak 8-12 and 18-21, offpeak otherwise
    assert_eq!(tou_factor(&p, 0), 1.0);
    assert_eq!(tou_factor(&p, hour_interval(&p, 8)), 2.5);
    assert_eq!(tou_factor(&p, hour_interval(&p, 12) - 1), 2.5);
    assert_eq!(tou_factor(&p, hour_interval(&p, 12)), 1.5);
    assert_eq!(tou_factor(&p, hour_interval(&p, 18) - 1), 1.5);
    assert_eq!(tou_factor(&p, hour_interval(&p, 18)), 2.5);
    assert_eq!(tou_factor(&p, hour_interval(&p, 21)), 1.0);
    assert_eq!(tou_factor(&p, hour_interval(&p, 23)), 1.0);
  }

  #[test]
  fn price_by_mode_and_location() {
    let p = Params::default();
    let home = dataset::dawn(0.0, 0.0, 288);
    let mut home_slow = home.clone();
    home_slow.charge_mode = ChargeMode::Slow;
    home_slow.is_charging = true;
    let mut away_slow = home_slow.clone();
    away_slow.group = group::WORK;
    let mut fast = home_slow.clone();
    fast.charge_mode = ChargeMode::Fast;
    let mut rapid = home_slow.clone();
    rapid.charge_mode = ChargeMode::Rapid;

    assert_eq!(charge_price(&p, &home), 0.0);
    assert_eq!(charge_price(&p, &home_slow), p.tariff.home_slow_price);
    assert_eq!(charge_price(&p, &away_slow), p.tariff.ac_price);
    assert_eq!(charge_price(&p, &fast), p.tariff.ac_price);
    assert_eq!(charge_price(&p, &rapid), p.tariff.public_dc_price);
  }
}
