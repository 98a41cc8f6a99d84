mod model;

pub use model::{ControlMode, ControlState, DistanceUnit, RangeType, TravelMode};
