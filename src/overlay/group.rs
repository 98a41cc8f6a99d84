use serde::Serialize;

use super::{Geometry, OverlayProperties, StyleDescriptor};
use crate::geometry::LatLng;
use crate::state::{RangeType, TravelMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupId(pub u64);

/// Identifier of a rendered polygon layer; later ids stack above earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayFeature {
    pub layer_id: LayerId,
    pub geometry: Geometry,
    /// Square kilometres; drives stacking.
    pub area_value: f64,
    pub range_upper_bound: f64,
    pub population: Option<u64>,
    /// 0 is the bottom layer.
    pub display_order_rank: usize,
    pub properties: OverlayProperties,
    pub style: StyleDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OriginMarker {
    pub coordinate: LatLng,
    pub travel_mode: TravelMode,
    pub range_type: RangeType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayGroup {
    pub id: GroupId,
    pub origin: LatLng,
    pub travel_mode: TravelMode,
    pub range_type: RangeType,
    pub features: Vec<OverlayFeature>,
    pub origin_marker: Option<OriginMarker>,
}

impl OverlayGroup {
    pub fn contains_layer(&self, layer_id: LayerId) -> bool {
        self.feature(layer_id).is_some()
    }

    pub fn feature(&self, layer_id: LayerId) -> Option<&OverlayFeature> {
        self.features
            .iter()
            .find(|feature| feature.layer_id == layer_id)
    }
}
