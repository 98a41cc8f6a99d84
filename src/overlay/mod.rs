//! Overlay ingestion, stacking and the registry of displayed groups.

mod collection;
mod group;
mod hooks;
mod lifecycle;
mod manager;
mod properties;
mod style;

#[cfg(test)]
pub(crate) use collection::fixtures;
pub use collection::{FeatureError, RawProperties, ReachableArea};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use group::{GroupId, LayerId, OriginMarker, OverlayFeature, OverlayGroup};
pub use hooks::{
    FeatureInteraction, GroupPointerFn, InteractionKind, OverlayHooks, StyleFn,
};
pub use lifecycle::{IngestOptions, InteractionOutcome, OverlayLifecycle};
pub use manager::OverlayGroupManager;
pub use properties::OverlayProperties;
pub use style::StyleDescriptor;
