use reqwest::Url;

use super::{OverlayRequest, RangeUnit, RequestError, RequestResult};
use crate::config::ControlConfig;

const SECONDS_PER_MINUTE: f64 = 60.0;
const REQUESTED_ATTRIBUTES: &str = "area|reachfactor|total_pop";

/// Time ranges are sent in seconds; distance ranges carry a `units` tag.
pub fn build_query_url(config: &ControlConfig, request: &OverlayRequest) -> RequestResult<String> {
    if !request.origin.is_finite() {
        return Err(RequestError::construction("origin coordinate is not finite"));
    }
    let range = checked_magnitude("range", request.range.magnitude)?;
    let interval = request
        .interval
        .map(|interval| checked_magnitude("interval", interval))
        .transpose()?;

    let (range, interval, units) = match request.range.unit {
        RangeUnit::Distance(unit) => (range, interval, Some(unit.as_str())),
        RangeUnit::Minutes => (
            range * SECONDS_PER_MINUTE,
            interval.map(|minutes| minutes * SECONDS_PER_MINUTE),
            None,
        ),
    };

    let mut params = vec![
        ("api_key", config.api_key.clone()),
        (
            "locations",
            format!("{},{}", request.origin.lng, request.origin.lat),
        ),
        (
            "profile",
            config.profiles.profile(request.travel_mode).to_string(),
        ),
        ("range_type", request.range_type().as_str().to_string()),
        ("range", range.to_string()),
    ];
    if let Some(interval) = interval {
        params.push(("interval", interval.to_string()));
    }
    if let Some(units) = units {
        params.push(("units", units.to_string()));
    }
    params.push(("location_type", "start".to_string()));
    params.push(("attributes", REQUESTED_ATTRIBUTES.to_string()));

    let url = Url::parse_with_params(&config.endpoint, &params).map_err(|err| {
        RequestError::construction(format!("invalid endpoint {}: {err}", config.endpoint))
    })?;
    Ok(url.into())
}

fn checked_magnitude(name: &str, value: f64) -> RequestResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RequestError::construction(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}
