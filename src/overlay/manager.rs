use super::{GroupId, LayerId, OverlayGroup};
use crate::events::{ControlEvent, EventBus};

/// Displayed overlay groups. With `draw_multiple` off it never holds more than one.
#[derive(Debug, Default)]
pub struct OverlayGroupManager {
    groups: Vec<OverlayGroup>,
}

impl OverlayGroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[OverlayGroup] {
        &self.groups
    }

    pub fn group_for_layer(&self, layer_id: LayerId) -> Option<&OverlayGroup> {
        self.groups
            .iter()
            .find(|group| group.contains_layer(layer_id))
    }

    pub fn add(
        &mut self,
        group: OverlayGroup,
        draw_multiple: bool,
        events: &mut EventBus,
    ) -> GroupId {
        if !draw_multiple {
            self.remove_all(events);
        }
        let id = group.id;
        tracing::info!(
            group = id.0,
            features = group.features.len(),
            "overlay group displayed"
        );
        self.groups.push(group);
        events.emit(ControlEvent::Displayed { group_id: id });
        id
    }

    pub fn remove(&mut self, id: GroupId, events: &mut EventBus) -> Option<OverlayGroup> {
        let index = self.groups.iter().position(|group| group.id == id)?;
        let group = self.groups.remove(index);
        tracing::info!(group = id.0, "overlay group removed");
        events.emit(ControlEvent::Delete { group_id: id });
        Some(group)
    }

    pub fn remove_all(&mut self, events: &mut EventBus) -> usize {
        let removed = self.groups.len();
        for group in self.groups.drain(..) {
            tracing::info!(group = group.id.0, "overlay group removed");
            events.emit(ControlEvent::Delete { group_id: group.id });
        }
        removed
    }

    pub fn retain_latest(&mut self, events: &mut EventBus) -> usize {
        let Some(excess) = self.groups.len().checked_sub(1) else {
            return 0;
        };
        for group in self.groups.drain(..excess) {
            tracing::info!(group = group.id.0, "overlay group evicted");
            events.emit(ControlEvent::Delete { group_id: group.id });
        }
        excess
    }
}
