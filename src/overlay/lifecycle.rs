use super::{
    FeatureCollection, FeatureInteraction, GroupId, InteractionKind, LayerId, OriginMarker,
    OverlayFeature, OverlayGroup, OverlayHooks, OverlayProperties, ReachableArea,
    StyleDescriptor,
};
use crate::request::OverlayRequest;
use crate::state::{ControlMode, DistanceUnit};

#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub area_unit: DistanceUnit,
    pub default_style: StyleDescriptor,
    pub show_origin_marker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    Forwarded,
    /// Delete mode consumed the click; propagation stops here.
    DeleteGroup(GroupId),
    Suppressed,
    UnknownLayer,
}

#[derive(Debug)]
pub struct OverlayLifecycle {
    hooks: OverlayHooks,
    next_group_id: u64,
    next_layer_id: u64,
}

impl Default for OverlayLifecycle {
    fn default() -> Self {
        Self::new(OverlayHooks::default())
    }
}

struct StagedFeature {
    layer_id: LayerId,
    feature: OverlayFeature,
}

impl OverlayLifecycle {
    pub fn new(hooks: OverlayHooks) -> Self {
        Self {
            hooks,
            next_group_id: 1,
            next_layer_id: 1,
        }
    }

    pub fn hooks_mut(&mut self) -> &mut OverlayHooks {
        &mut self.hooks
    }

    fn allocate_group_id(&mut self) -> GroupId {
        let id = GroupId(self.next_group_id);
        self.next_group_id = self.next_group_id.saturating_add(1);
        id
    }

    fn allocate_layer_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id = self.next_layer_id.saturating_add(1);
        id
    }

    /// Largest area first, so smaller polygons stack above the ones around them.
    pub fn ingest(
        &mut self,
        collection: FeatureCollection,
        request: &OverlayRequest,
        options: &IngestOptions,
    ) -> Option<OverlayGroup> {
        if collection.features.is_empty() {
            return None;
        }

        let mut staged = Vec::with_capacity(collection.features.len());
        for raw in collection.features {
            let raw = match ReachableArea::try_from(raw) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(%err, "skipping unusable feature");
                    continue;
                }
            };
            let area_km2 = raw
                .properties
                .total_area_km
                .filter(|area| area.is_finite())
                .unwrap_or_else(|| raw.area_km2());
            let properties =
                OverlayProperties::derive(&raw.properties, area_km2, request, options.area_unit);
            let layer_id = self.allocate_layer_id();
            staged.push(StagedFeature {
                layer_id,
                feature: OverlayFeature {
                    layer_id,
                    area_value: area_km2,
                    range_upper_bound: raw.properties.value,
                    population: raw.properties.population(),
                    geometry: raw.geometry,
                    display_order_rank: 0,
                    properties,
                    style: options.default_style.clone(),
                },
            });
        }

        if staged.is_empty() {
            return None;
        }

        // `sort_by` is stable, which keeps equal areas in arrival order.
        staged.sort_by(|a, b| b.feature.area_value.total_cmp(&a.feature.area_value));

        let mut features = Vec::with_capacity(staged.len());
        for (rank, staged) in staged.into_iter().enumerate() {
            let mut feature = staged.feature;
            feature.layer_id = self.allocate_layer_id();
            feature.display_order_rank = rank;
            tracing::trace!(
                from = staged.layer_id.0,
                to = feature.layer_id.0,
                rank,
                "restacked feature layer"
            );
            feature.style = self.hooks.style_for(&feature, &options.default_style);
            features.push(feature);
        }

        let group = OverlayGroup {
            id: self.allocate_group_id(),
            origin: request.origin,
            travel_mode: request.travel_mode,
            range_type: request.range_type(),
            features,
            origin_marker: options.show_origin_marker.then_some(OriginMarker {
                coordinate: request.origin,
                travel_mode: request.travel_mode,
                range_type: request.range_type(),
            }),
        };
        tracing::debug!(
            group = group.id.0,
            features = group.features.len(),
            "ingested overlay group"
        );
        Some(group)
    }

    pub fn dispatch(
        &mut self,
        interaction: &FeatureInteraction,
        group: Option<&OverlayGroup>,
        mode: ControlMode,
    ) -> InteractionOutcome {
        let Some(group) = group else {
            return InteractionOutcome::UnknownLayer;
        };
        match (mode, interaction.kind) {
            (ControlMode::Draw, _) => InteractionOutcome::Suppressed,
            (ControlMode::Delete, InteractionKind::Click) => {
                InteractionOutcome::DeleteGroup(group.id)
            }
            (_, kind) => {
                if let Some(hook) = self.hooks.pointer_hook(kind) {
                    hook(interaction, group);
                }
                InteractionOutcome::Forwarded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Color, LatLng};
    use crate::overlay::{fixtures, RawProperties};
    use crate::state::TravelMode;
    use geojson::{Feature, Geometry, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    const TRIANGLE: [[f64; 2]; 4] = [[0.0, 0.0], [0.01, 0.0], [0.01, 0.01], [0.0, 0.0]];

    fn feature_with_area(value: f64, area: Option<f64>) -> Feature {
        let mut properties = RawProperties::with_value(value);
        properties.total_area_km = area;
        fixtures::feature(&properties, fixtures::polygon(&TRIANGLE))
    }

    fn collection(areas: &[f64]) -> FeatureCollection {
        fixtures::collection(
            areas
                .iter()
                .enumerate()
                .map(|(index, area)| feature_with_area((index + 1) as f64 * 100.0, Some(*area)))
                .collect(),
        )
    }

    fn request() -> OverlayRequest {
        OverlayRequest::time(LatLng::new(53.45, -2.35), 10.0, Some(5.0), TravelMode::Driving)
    }

    fn options() -> IngestOptions {
        IngestOptions {
            area_unit: DistanceUnit::Kilometers,
            default_style: StyleDescriptor::default(),
            show_origin_marker: true,
        }
    }

    fn areas(group: &OverlayGroup) -> Vec<f64> {
        group.features.iter().map(|f| f.area_value).collect()
    }

    #[test]
    fn smallest_first_response_is_restacked_largest_first() {
        let mut lifecycle = OverlayLifecycle::default();
        let group = lifecycle
            .ingest(collection(&[1.0, 2.0, 4.0, 8.0]), &request(), &options())
            .expect("group should be created");

        assert_eq!(areas(&group), vec![8.0, 4.0, 2.0, 1.0]);
        let ranks: Vec<_> = group.features.iter().map(|f| f.display_order_rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn unordered_response_is_sorted_descending_by_area() {
        let mut lifecycle = OverlayLifecycle::default();
        let group = lifecycle
            .ingest(collection(&[5.0, 1.0, 3.0]), &request(), &options())
            .expect("group should be created");

        assert_eq!(areas(&group), vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn equal_areas_keep_arrival_order() {
        let mut lifecycle = OverlayLifecycle::default();
        let group = lifecycle
            .ingest(collection(&[2.0, 7.0, 2.0, 2.0]), &request(), &options())
            .expect("group should be created");

        let values: Vec<_> = group.features.iter().map(|f| f.range_upper_bound).collect();
        assert_eq!(values, vec![200.0, 100.0, 300.0, 400.0]);
    }

    #[test]
    fn layer_ids_are_regenerated_in_stacking_order() {
        let mut lifecycle = OverlayLifecycle::default();
        let group = lifecycle
            .ingest(collection(&[1.0, 3.0, 2.0]), &request(), &options())
            .expect("group should be created");

        let ids: Vec<_> = group.features.iter().map(|f| f.layer_id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids[0] > LayerId(3), "fresh ids follow the provisional ones");
    }

    #[test]
    fn empty_collection_yields_no_group() {
        let mut lifecycle = OverlayLifecycle::default();
        assert!(lifecycle
            .ingest(fixtures::empty(), &request(), &options())
            .is_none());
    }

    #[test]
    fn missing_total_area_falls_back_to_geometry() {
        let mut lifecycle = OverlayLifecycle::default();
        let raw = feature_with_area(100.0, None);
        let group = lifecycle
            .ingest(fixtures::collection(vec![raw]), &request(), &options())
            .expect("group should be created");

        assert!(group.features[0].area_value > 0.0);
        assert_eq!(group.features[0].properties.range_label(), "1.67");
    }

    #[test]
    fn unusable_features_are_skipped() {
        let mut lifecycle = OverlayLifecycle::default();
        let point = fixtures::feature(
            &RawProperties::with_value(50.0),
            Geometry::new(Value::Point(vec![0.0, 0.0])),
        );
        let mut unlabelled = feature_with_area(60.0, Some(1.0));
        unlabelled.properties = None;

        assert!(lifecycle
            .ingest(
                fixtures::collection(vec![point.clone(), unlabelled.clone()]),
                &request(),
                &options()
            )
            .is_none());

        let group = lifecycle
            .ingest(
                fixtures::collection(vec![point, feature_with_area(300.0, Some(2.0)), unlabelled]),
                &request(),
                &options(),
            )
            .expect("the polygon feature should survive");
        assert_eq!(areas(&group), vec![2.0]);
        assert_eq!(group.features[0].range_upper_bound, 300.0);
    }

    #[test]
    fn style_fn_decorates_each_feature() {
        let hooks = OverlayHooks::default().with_style_fn(|feature| {
            StyleDescriptor::default()
                .with_fill(Color::new(0, 0, 0), feature.area_value as f32 / 10.0)
        });
        let mut lifecycle = OverlayLifecycle::new(hooks);
        let group = lifecycle
            .ingest(collection(&[1.0, 5.0]), &request(), &options())
            .expect("group should be created");

        assert_eq!(group.features[0].style.fill_opacity, 0.5);
        assert_eq!(group.features[1].style.fill_opacity, 0.1);
        assert_eq!(group.features[0].style.fill_color, Color::new(0, 0, 0));
    }

    #[test]
    fn origin_marker_follows_option() {
        let mut lifecycle = OverlayLifecycle::default();
        let hidden = IngestOptions {
            show_origin_marker: false,
            ..options()
        };
        let group = lifecycle
            .ingest(collection(&[1.0]), &request(), &hidden)
            .expect("group should be created");
        assert!(group.origin_marker.is_none());
    }

    #[test]
    fn clicks_branch_on_mode() {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        let hooks = OverlayHooks::default().with_click_fn(move |interaction, group| {
            sink.borrow_mut().push((interaction.layer_id, group.id))
        });
        let mut lifecycle = OverlayLifecycle::new(hooks);
        let group = lifecycle
            .ingest(collection(&[1.0, 2.0]), &request(), &options())
            .expect("group should be created");
        let click = FeatureInteraction::new(InteractionKind::Click, group.features[1].layer_id);

        assert_eq!(
            lifecycle.dispatch(&click, Some(&group), ControlMode::Delete),
            InteractionOutcome::DeleteGroup(group.id)
        );
        assert!(clicks.borrow().is_empty());

        assert_eq!(
            lifecycle.dispatch(&click, Some(&group), ControlMode::Idle),
            InteractionOutcome::Forwarded
        );
        assert_eq!(clicks.borrow().as_slice(), &[(click.layer_id, group.id)]);

        assert_eq!(
            lifecycle.dispatch(&click, Some(&group), ControlMode::Draw),
            InteractionOutcome::Suppressed
        );
        assert_eq!(
            lifecycle.dispatch(&click, None, ControlMode::Idle),
            InteractionOutcome::UnknownLayer
        );
    }

    #[test]
    fn hover_without_hooks_is_a_no_op() {
        let mut lifecycle = OverlayLifecycle::default();
        let group = lifecycle
            .ingest(collection(&[1.0]), &request(), &options())
            .expect("group should be created");
        let hover = FeatureInteraction::new(InteractionKind::MouseOver, group.features[0].layer_id);

        assert_eq!(
            lifecycle.dispatch(&hover, Some(&group), ControlMode::Delete),
            InteractionOutcome::Forwarded
        );
    }
}
