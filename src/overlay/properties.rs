use serde::Serialize;

use super::RawProperties;
use crate::request::OverlayRequest;
use crate::state::{DistanceUnit, RangeType};

const SECONDS_PER_MINUTE: f64 = 60.0;
const MINUTES_LABEL: &str = "min";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayProperties {
    pub travel_mode: &'static str,
    pub measure: RangeType,
    pub range_units: &'static str,
    pub range: f64,
    pub area: f64,
    pub area_units: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
}

impl OverlayProperties {
    /// Distance ranges are reported in the request's unit, time ranges always
    /// in minutes. Area follows `area_unit`.
    pub fn derive(
        raw: &RawProperties,
        area_km2: f64,
        request: &OverlayRequest,
        area_unit: DistanceUnit,
    ) -> Self {
        let (range, range_units) = match request.distance_unit() {
            Some(unit) => (unit.from_meters(raw.value), unit.as_str()),
            None => (raw.value / SECONDS_PER_MINUTE, MINUTES_LABEL),
        };
        let origin = raw.center().unwrap_or(request.origin);

        Self {
            travel_mode: request.travel_mode.label(),
            measure: request.range_type(),
            range_units,
            range,
            area: area_unit.from_square_km(area_km2),
            area_units: area_unit.area_label(),
            latitude: origin.lat,
            longitude: origin.lng,
            population: raw.population(),
        }
    }

    pub fn range_label(&self) -> String {
        format!("{:.2}", self.range)
    }

    pub fn area_label(&self) -> String {
        format!("{:.2} {}", self.area, self.area_units)
    }
}
