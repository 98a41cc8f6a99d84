//! Request construction, the request-function seam and the in-flight lifecycle.

mod error;
mod fetch;
mod http;
mod orchestrator;
mod query;

pub use error::{RequestError, RequestResult};
pub use fetch::{Completion, RequestFn, ResponseCallback};
pub use http::{HttpFetcher, ResponseCache};
pub use orchestrator::{PendingRequest, RequestOrchestrator, RequestOutcome};
pub use query::build_query_url;

use crate::geometry::LatLng;
use crate::state::{DistanceUnit, RangeType, TravelMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    Distance(DistanceUnit),
    Minutes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValue {
    pub magnitude: f64,
    pub unit: RangeUnit,
}

/// One draw action's query parameters. Immutable once submitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRequest {
    pub origin: LatLng,
    pub range: RangeValue,
    /// Same unit as `range`.
    pub interval: Option<f64>,
    pub travel_mode: TravelMode,
}

impl OverlayRequest {
    pub const fn distance(
        origin: LatLng,
        magnitude: f64,
        unit: DistanceUnit,
        interval: Option<f64>,
        travel_mode: TravelMode,
    ) -> Self {
        Self {
            origin,
            range: RangeValue {
                magnitude,
                unit: RangeUnit::Distance(unit),
            },
            interval,
            travel_mode,
        }
    }

    pub const fn time(
        origin: LatLng,
        minutes: f64,
        interval_minutes: Option<f64>,
        travel_mode: TravelMode,
    ) -> Self {
        Self {
            origin,
            range: RangeValue {
                magnitude: minutes,
                unit: RangeUnit::Minutes,
            },
            interval: interval_minutes,
            travel_mode,
        }
    }

    pub const fn range_type(&self) -> RangeType {
        match self.range.unit {
            RangeUnit::Distance(_) => RangeType::Distance,
            RangeUnit::Minutes => RangeType::Time,
        }
    }

    pub const fn distance_unit(&self) -> Option<DistanceUnit> {
        match self.range.unit {
            RangeUnit::Distance(unit) => Some(unit),
            RangeUnit::Minutes => None,
        }
    }
}
