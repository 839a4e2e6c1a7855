//! Built-in activity pools used by tests and the Python examples.

use crate::activity::{group, ActId, Activity, ChargeMode, Time};
use crate::InstanceError;
use fnv::FnvHashMap as Map;
use lazy_static::lazy_static;

pub const HOME_X: f64 = 454070.0;
pub const HOME_Y: f64 = 382249.0;
pub const WORK_X: f64 = 474270.0;
pub const WORK_Y: f64 = 381532.0;

/// Synthetic first activity, pinned to interval 0 at the home location.
pub fn dawn(x: f64, y: f64, horizon: Time) -> Activity {
    Activity {
        id: 0,
        x,
        y,
        group: group::HOME,
        earliest_start: 0,
        latest_start: 0,
        min_duration: 1,
        max_duration: horizon - 2,
        des_start_time: 0,
        des_duration: 0,
        charge_mode: ChargeMode::None,
        is_charging: false,
        is_service_station: false,
    }
}

/// Synthetic last activity; every schedule is forced to end here.
pub fn dusk(id: ActId, x: f64, y: f64, horizon: Time) -> Activity {
    Activity {
        id,
        x,
        y,
        group: group::HOME,
        earliest_start: 0,
        latest_start: horizon - 1,
        min_duration: 1,
        max_duration: horizon,
        des_start_time: 0,
        des_duration: 0,
        charge_mode: ChargeMode::None,
        is_charging: false,
        is_service_station: false,
    }
}

fn plain(
    id: ActId,
    x: f64,
    y: f64,
    g: u8,
    window: (Time, Time),
    duration: (Time, Time),
    desired: (Time, Time),
) -> Activity {
    Activity {
        id,
        x,
        y,
        group: g,
        earliest_start: window.0,
        latest_start: window.1,
        min_duration: duration.0,
        max_duration: duration.1,
        des_start_time: desired.0,
        des_duration: desired.1,
        charge_mode: ChargeMode::None,
        is_charging: false,
        is_service_station: false,
    }
}

fn charging(a: Activity, mode: ChargeMode) -> Activity {
    Activity {
        charge_mode: mode,
        is_charging: true,
        ..a
    }
}

/// DAWN and DUSK at the same location, nothing else.
pub fn minimal() -> Vec<Activity> {
    vec![dawn(HOME_X, HOME_Y, 288), dusk(1, HOME_X, HOME_Y, 288)]
}

/// Home bounds around a single work activity with a slow charger.
pub fn work_slow_charge() -> Vec<Activity> {
    vec![
        dawn(HOME_X, HOME_Y, 288),
        charging(
            plain(1, WORK_X, WORK_Y, group::WORK, (60, 276), (10, 144), (98, 80)),
            ChargeMode::Slow,
        ),
        dusk(2, HOME_X, HOME_Y, 288),
    ]
}

/// Eleven activities: three home visits beyond DUSK, work with and
/// without slow charging, shopping with and without fast charging, two
/// leisure nodes and an escort stop.
pub fn eleven_activity_day() -> Vec<Activity> {
    let work = plain(2, WORK_X, WORK_Y, group::WORK, (60, 276), (10, 144), (98, 80));
    let shop = plain(4, 460000.0, 390000.0, group::SHOPPING, (96, 240), (4, 36), (120, 12));
    vec![
        dawn(HOME_X, HOME_Y, 288),
        plain(1, HOME_X, HOME_Y, group::HOME, (0, 286), (6, 200), (0, 0)),
        charging(work.clone(), ChargeMode::Slow),
        Activity { id: 3, ..work },
        charging(shop.clone(), ChargeMode::Fast),
        Activity { id: 5, ..shop },
        plain(6, 450000.0, 378000.0, group::LEISURE, (120, 264), (6, 48), (180, 24)),
        plain(7, 458000.0, 385000.0, group::LEISURE, (120, 264), (6, 48), (192, 18)),
        plain(8, 455000.0, 381000.0, group::ESCORT, (84, 228), (2, 24), (96, 6)),
        plain(9, HOME_X, HOME_Y, group::HOME, (0, 286), (1, 286), (0, 0)),
        dusk(10, HOME_X, HOME_Y, 288),
    ]
}

pub struct Fixture {
    pub name: &'static str,
    pub build: fn() -> Vec<Activity>,
}

lazy_static! {
    pub static ref FIXTURES: Vec<Fixture> = vec![
        Fixture { name: "minimal", build: minimal },
        Fixture { name: "work_slow_charge", build: work_slow_charge },
        Fixture { name: "eleven_activity_day", build: eleven_activity_day },
    ];
    static ref BY_NAME: Map<&'static str, usize> = FIXTURES
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name, i))
        .collect();
}

pub fn by_index(index: usize) -> Result<Vec<Activity>, InstanceError> {
    FIXTURES
        .get(index)
        .map(|f| (f.build)())
        .ok_or(InstanceError::IndexOutOfRange { index })
}

pub fn by_name(name: &str) -> Result<Vec<Activity>, InstanceError> {
    BY_NAME
        .get(name)
        .map(|&i| (FIXTURES[i].build)())
        .ok_or_else(|| InstanceError::UnknownFixture { name: name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookups_agree() {
        for (i, f) in FIXTURES.iter().enumerate() {
            assert_eq!(by_index(i).unwrap(), by_name(f.name).unwrap());
        }
        assert!(by_index(FIXTURES.len()).is_err());
        assert!(by_name("nope").is_err());
    }

    #[test]
    fn eleven_has_bounds_in_place() {
        let pool = eleven_activity_day();
        assert_eq!(pool.len(), 11);
        assert_eq!(pool[0].id, 0);
        assert_eq!(pool[10].id, 10);
        assert_eq!(pool.iter().filter(|a| a.group == group::HOME).count(), 4);
    }
}
