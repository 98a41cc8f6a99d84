use geo::{ChamberlainDuquetteArea, Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, Geometry, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::LatLng;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("unsupported geometry type {0}")]
    UnsupportedGeometry(&'static str),
    #[error("invalid feature properties: {0}")]
    Properties(#[from] serde_json::Error),
}

/// Service-side feature properties.
///
/// `value` is metres for distance queries and seconds for time queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperties {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_area_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pop: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachfactor: Option<f64>,
}

impl RawProperties {
    pub const fn with_value(value: f64) -> Self {
        Self {
            value,
            group_index: None,
            center: None,
            total_area_km: None,
            total_pop: None,
            reachfactor: None,
        }
    }

    pub fn center(&self) -> Option<LatLng> {
        match self.center.as_deref() {
            Some([lng, lat, ..]) => Some(LatLng::from_position([*lng, *lat])),
            _ => None,
        }
    }

    pub fn population(&self) -> Option<u64> {
        self.total_pop
            .filter(|pop| pop.is_finite() && *pop >= 0.0)
            .map(|pop| pop.round() as u64)
    }
}

#[derive(Debug, Clone)]
pub struct ReachableArea {
    pub geometry: Geometry,
    pub outline: MultiPolygon<f64>,
    pub properties: RawProperties,
}

impl ReachableArea {
    /// Spherical area of the outline with holes removed.
    pub fn area_km2(&self) -> f64 {
        self.outline.iter().map(polygon_area_m2).sum::<f64>() / 1_000_000.0
    }
}

impl TryFrom<Feature> for ReachableArea {
    type Error = FeatureError;

    fn try_from(feature: Feature) -> Result<Self, Self::Error> {
        let geometry = feature.geometry.ok_or(FeatureError::MissingGeometry)?;
        let outline = outline(&geometry.value)?;
        let properties = serde_json::from_value(serde_json::Value::Object(
            feature.properties.unwrap_or_default(),
        ))?;
        Ok(Self {
            geometry,
            outline,
            properties,
        })
    }
}

fn outline(value: &Value) -> Result<MultiPolygon<f64>, FeatureError> {
    match value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon(rings)])),
        Value::MultiPolygon(polygons) => Ok(polygons.iter().map(|rings| polygon(rings)).collect()),
        Value::Point(_) => Err(FeatureError::UnsupportedGeometry("Point")),
        Value::MultiPoint(_) => Err(FeatureError::UnsupportedGeometry("MultiPoint")),
        Value::LineString(_) => Err(FeatureError::UnsupportedGeometry("LineString")),
        Value::MultiLineString(_) => Err(FeatureError::UnsupportedGeometry("MultiLineString")),
        Value::GeometryCollection(_) => {
            Err(FeatureError::UnsupportedGeometry("GeometryCollection"))
        }
    }
}

// Positions may carry an elevation; only lng and lat are kept.
fn polygon(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| ring_line(ring));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn ring_line(ring: &[Vec<f64>]) -> LineString<f64> {
    ring.iter()
        .filter_map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

// Rings are measured separately so winding order does not matter.
fn polygon_area_m2(polygon: &Polygon<f64>) -> f64 {
    let ring_area = |ring: &LineString<f64>| {
        Polygon::new(ring.clone(), Vec::new()).chamberlain_duquette_unsigned_area()
    };
    let holes: f64 = polygon.interiors().iter().map(ring_area).sum();
    (ring_area(polygon.exterior()) - holes).max(0.0)
}
