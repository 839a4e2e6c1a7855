pub use anyhow::Result;

use std::fmt;

pub mod activity;
pub mod dataset;
pub mod io;

pub use activity::{
    group, group_name, validate_pool, ActId, Activity, ChargeMode, Group, Time, NUM_GROUPS,
};

/// Errors raised while building or validating an activity pool.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceError {
    EmptyPool,
    NonDenseIds { index: usize, id: ActId },
    WindowOrder { id: ActId },
    DurationOrder { id: ActId },
    ZeroMinDuration { id: ActId },
    GroupOutOfRange { id: ActId, group: Group },
    ServiceStationWithoutCharging { id: ActId },
    ChargingWithoutMode { id: ActId },
    UnknownFixture { name: String },
    IndexOutOfRange { index: usize },
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InstanceError::*;
        match self {
            EmptyPool => write!(f, "activity pool must contain at least DAWN and DUSK"),
            NonDenseIds { index, id } => {
                write!(f, "activity at position {} has id {} (ids must be dense)", index, id)
            }
            WindowOrder { id } => write!(f, "activity {}: earliest_start > latest_start", id),
            DurationOrder { id } => write!(f, "activity {}: min_duration > max_duration", id),
            ZeroMinDuration { id } => {
                write!(f, "activity {}: min_duration must be at least one interval", id)
            }
            GroupOutOfRange { id, group } => {
                write!(f, "activity {}: group tag {} out of range", id, group)
            }
            ServiceStationWithoutCharging { id } => {
                write!(f, "activity {}: service station entries must charge", id)
            }
            ChargingWithoutMode { id } => {
                write!(f, "activity {}: charging entries need a charge mode", id)
            }
            UnknownFixture { name } => write!(f, "no fixture named {:?}", name),
            IndexOutOfRange { index } => write!(f, "fixture index {} out of range", index),
        }
    }
}

impl std::error::Error for InstanceError {}
