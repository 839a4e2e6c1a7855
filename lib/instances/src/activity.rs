use crate::InstanceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interval index / interval count on the daily lattice.
pub type Time = i32;
/// Activity-type tag. Tag 0 is home (and the synthetic DAWN/DUSK bounds).
pub type Group = u8;
/// Dense activity index within one pool.
pub type ActId = u16;

/// Width of the utility-weight tables; group tags must stay below this.
pub const NUM_GROUPS: usize = 9;

pub mod group {
    use super::Group;

    pub const HOME: Group = 0;
    pub const EDUCATION: Group = 1;
    pub const ERRANDS: Group = 2;
    pub const ESCORT: Group = 3;
    pub const LEISURE: Group = 4;
    pub const SHOPPING: Group = 5;
    pub const WORK: Group = 6;
    pub const SERVICE_STATION: Group = 7;
}

pub fn group_name(g: Group) -> &'static str {
    match g {
        group::HOME => "Home",
        group::EDUCATION => "Education",
        group::ERRANDS => "Errands",
        group::ESCORT => "Escort",
        group::LEISURE => "Leisure",
        group::SHOPPING => "Shopping",
        group::WORK => "Work",
        group::SERVICE_STATION => "ServiceStation",
        _ => "Other",
    }
}

/// Charger speed selected for a charging variant of an activity.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeMode {
    None,
    Slow,
    Fast,
    Rapid,
}

impl Default for ChargeMode {
    fn default() -> Self {
        ChargeMode::None
    }
}

impl FromStr for ChargeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ChargeMode::None),
            "slow" => Ok(ChargeMode::Slow),
            "fast" => Ok(ChargeMode::Fast),
            "rapid" => Ok(ChargeMode::Rapid),
            _ => Err(format!("invalid charge mode: {}", s)),
        }
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChargeMode::None => "none",
            ChargeMode::Slow => "slow",
            ChargeMode::Fast => "fast",
            ChargeMode::Rapid => "rapid",
        };
        f.write_str(s)
    }
}

/// One candidate activity in the pool. Charging variants of the same
/// physical activity appear as distinct entries sharing a group tag.
/// `id == 0` is DAWN (forced first), `id == N-1` is DUSK (forced last).
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: ActId,
    pub x: f64,
    pub y: f64,
    pub group: Group,
    /// Inclusive bounds on the start interval.
    pub earliest_start: Time,
    pub latest_start: Time,
    /// Interval counts.
    pub min_duration: Time,
    pub max_duration: Time,
    pub des_start_time: Time,
    pub des_duration: Time,
    pub charge_mode: ChargeMode,
    pub is_charging: bool,
    pub is_service_station: bool,
}

impl Activity {
    pub fn kind(&self) -> &'static str {
        group_name(self.group)
    }
}

/// Checks every per-activity invariant the engine relies on. Pools that
/// pass here cannot produce out-of-range indexing or inverted windows
/// during a sweep.
pub fn validate_pool(acts: &[Activity]) -> Result<(), InstanceError> {
    if acts.len() < 2 {
        return Err(InstanceError::EmptyPool);
    }
    for (index, a) in acts.iter().enumerate() {
        if a.id as usize != index {
            return Err(InstanceError::NonDenseIds { index, id: a.id });
        }
        if a.earliest_start > a.latest_start {
            return Err(InstanceError::WindowOrder { id: a.id });
        }
        if a.min_duration > a.max_duration {
            return Err(InstanceError::DurationOrder { id: a.id });
        }
        if a.min_duration < 1 {
            return Err(InstanceError::ZeroMinDuration { id: a.id });
        }
        if a.group as usize >= NUM_GROUPS {
            return Err(InstanceError::GroupOutOfRange { id: a.id, group: a.group });
        }
        if a.is_service_station && !(a.is_charging && a.charge_mode != ChargeMode::None) {
            return Err(InstanceError::ServiceStationWithoutCharging { id: a.id });
        }
        if a.is_charging && a.charge_mode == ChargeMode::None {
            return Err(InstanceError::ChargingWithoutMode { id: a.id });
        }
    }
    Ok(())
}
