pub use instances::{
  group, group_name, validate_pool, ActId, Activity, ChargeMode, Group, InstanceError, Time,
  NUM_GROUPS,
};

pub use instances::dataset;

pub trait ActivityPoolExt {
  fn dawn(&self) -> &Activity;
  fn dusk(&self) -> &Activity;
  fn dusk_id(&self) -> ActId;
}

impl ActivityPoolExt for [Activity] {
  #[inline]
  fn dawn(&self) -> &Activity {
    return &self[0];
  }

  #[inline]
  fn dusk(&self) -> &Activity {
    return &self[self.len() - 1];
  }

  #[inline]
  fn dusk_id(&self) -> ActId {
    return (self.len() - 1) as ActId;
  }
}
