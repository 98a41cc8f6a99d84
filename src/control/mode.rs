use std::time::Duration;

use super::affordance::{Affordance, ACTIVE_CURSOR_CLASS};
use crate::events::{ActiveMode, ControlEvent, EventBus};
use crate::overlay::OverlayGroupManager;
use crate::probe::CoordinateProbe;
use crate::state::ControlMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeEvent {
    ActivateDraw,
    DeactivateDraw,
    ActivateDelete,
    DeactivateDelete,
}

// Draw and Delete are only entered from, and only left to, Idle.
fn next_mode(mode: ControlMode, event: ModeEvent) -> Option<ControlMode> {
    match (mode, event) {
        (ControlMode::Idle, ModeEvent::ActivateDraw) => Some(ControlMode::Draw),
        (ControlMode::Draw, ModeEvent::DeactivateDraw) => Some(ControlMode::Idle),
        (ControlMode::Idle, ModeEvent::ActivateDelete) => Some(ControlMode::Delete),
        (ControlMode::Delete, ModeEvent::DeactivateDelete) => Some(ControlMode::Idle),
        _ => None,
    }
}

/// Draw/Delete toggling with the probe and button affordances kept in step.
#[derive(Debug)]
pub struct ModeController {
    mode: ControlMode,
    probe: CoordinateProbe,
    draw: Affordance,
    delete: Affordance,
    epoch: u64,
}

impl ModeController {
    pub fn new(flash_duration: Duration) -> Self {
        Self {
            mode: ControlMode::default(),
            probe: CoordinateProbe::new(),
            draw: Affordance::new(flash_duration),
            delete: Affordance::new(flash_duration),
            epoch: 0,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Bumped on every Draw activation and deactivation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn transition(&mut self, event: ModeEvent) -> bool {
        match next_mode(self.mode, event) {
            Some(next) => {
                tracing::debug!(from = ?self.mode, to = ?next, ?event, "mode transition");
                self.mode = next;
                true
            }
            None => {
                tracing::warn!(from = ?self.mode, ?event, "invalid mode transition requested");
                false
            }
        }
    }

    pub fn probe(&self) -> &CoordinateProbe {
        &self.probe
    }

    pub(crate) fn probe_mut(&mut self) -> &mut CoordinateProbe {
        &mut self.probe
    }

    pub fn draw_affordance(&self) -> &Affordance {
        &self.draw
    }

    pub fn delete_affordance(&self) -> &Affordance {
        &self.delete
    }

    pub fn map_cursor_class(&self) -> Option<&'static str> {
        match self.mode() {
            ControlMode::Idle => None,
            ControlMode::Draw | ControlMode::Delete => Some(ACTIVE_CURSOR_CLASS),
        }
    }

    pub fn toggle_draw(&mut self, events: &mut EventBus) {
        self.deactivate_delete(events);
        if !self.deactivate_draw(events) {
            self.activate_draw(events);
        }
    }

    pub fn toggle_delete(&mut self, overlays: &mut OverlayGroupManager, events: &mut EventBus) {
        self.deactivate_draw(events);
        if !self.deactivate_delete(events) {
            self.activate_delete(overlays, events);
        }
    }

    pub fn activate_draw(&mut self, events: &mut EventBus) {
        if !self.transition(ModeEvent::ActivateDraw) {
            return;
        }
        self.epoch = self.epoch.saturating_add(1);
        self.probe.arm();
        self.draw.set_active(true);
        tracing::info!(epoch = self.epoch, "draw mode activated");
        events.emit(ControlEvent::Activated {
            mode: ActiveMode::Draw,
        });
    }

    /// Returns `false` when Draw was not active.
    pub fn deactivate_draw(&mut self, events: &mut EventBus) -> bool {
        if self.mode() != ControlMode::Draw {
            return false;
        }
        if !self.transition(ModeEvent::DeactivateDraw) {
            return false;
        }
        self.epoch = self.epoch.saturating_add(1);
        self.probe.disarm();
        self.draw.set_active(false);
        tracing::info!(epoch = self.epoch, "draw mode deactivated");
        events.emit(ControlEvent::Deactivated {
            mode: ActiveMode::Draw,
        });
        true
    }

    /// Zero overlays flash the delete button; a single overlay is removed
    /// right away; otherwise Delete waits for the user to pick a group.
    pub fn activate_delete(&mut self, overlays: &mut OverlayGroupManager, events: &mut EventBus) {
        if self.mode() != ControlMode::Idle {
            tracing::debug!(mode = ?self.mode(), "delete requested outside idle mode");
            return;
        }
        match overlays.count() {
            0 => {
                tracing::debug!("nothing to delete");
                self.delete.flash_error();
            }
            1 => {
                if let Some(id) = overlays.groups().first().map(|group| group.id) {
                    overlays.remove(id, events);
                }
            }
            _ => {
                if !self.transition(ModeEvent::ActivateDelete) {
                    return;
                }
                self.delete.set_active(true);
                tracing::info!(groups = overlays.count(), "delete mode activated");
                events.emit(ControlEvent::Activated {
                    mode: ActiveMode::Delete,
                });
            }
        }
    }

    pub fn deactivate_delete(&mut self, events: &mut EventBus) -> bool {
        if self.mode() != ControlMode::Delete {
            return false;
        }
        if !self.transition(ModeEvent::DeactivateDelete) {
            return false;
        }
        self.delete.set_active(false);
        tracing::info!("delete mode deactivated");
        events.emit(ControlEvent::Deactivated {
            mode: ActiveMode::Delete,
        });
        true
    }

    pub(crate) fn complete_draw(&mut self, draw_multiple: bool, events: &mut EventBus) {
        if draw_multiple {
            self.probe.rearm_commit();
        } else {
            self.deactivate_draw(events);
        }
    }

    pub(crate) fn fail_draw(&mut self, events: &mut EventBus) {
        self.deactivate_draw(events);
        self.draw.flash_error();
    }

    /// Leaves Delete once there is nothing left to pick.
    pub(crate) fn registry_changed(
        &mut self,
        overlays: &OverlayGroupManager,
        events: &mut EventBus,
    ) {
        if overlays.is_empty() {
            self.deactivate_delete(events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::geometry::{LatLng, ScreenPoint};
    use crate::overlay::{GroupId, OverlayGroup};
    use crate::probe::{MercatorViewport, PointerEvent, PointerInput, ProbeOutcome};
    use crate::state::{RangeType, TravelMode};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller() -> ModeController {
        ModeController::new(Duration::from_millis(500))
    }

    fn recorded(bus: &mut EventBus) -> Rc<RefCell<Vec<ControlEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    fn manager_with(count: u64, bus: &mut EventBus) -> OverlayGroupManager {
        let mut manager = OverlayGroupManager::new();
        for id in 1..=count {
            let group = OverlayGroup {
                id: GroupId(id),
                origin: LatLng::new(53.45, -2.35),
                travel_mode: TravelMode::Driving,
                range_type: RangeType::Distance,
                features: Vec::new(),
                origin_marker: None,
            };
            manager.add(group, true, bus);
        }
        manager
    }

    #[test]
    fn toggle_draw_arms_and_disarms_probe() {
        let mut bus = EventBus::new();
        let seen = recorded(&mut bus);
        let mut modes = controller();

        modes.toggle_draw(&mut bus);
        assert_eq!(modes.mode(), ControlMode::Draw);
        assert!(modes.probe().is_armed());
        assert!(modes.draw_affordance().is_active());
        assert_eq!(modes.map_cursor_class(), Some(ACTIVE_CURSOR_CLASS));

        modes.toggle_draw(&mut bus);
        assert_eq!(modes.mode(), ControlMode::Idle);
        assert!(!modes.probe().is_armed());
        assert!(!modes.draw_affordance().is_active());
        assert_eq!(modes.map_cursor_class(), None);
        assert_eq!(modes.epoch(), 2);

        assert_eq!(
            seen.borrow().as_slice(),
            &[
                ControlEvent::Activated {
                    mode: ActiveMode::Draw
                },
                ControlEvent::Deactivated {
                    mode: ActiveMode::Draw
                },
            ]
        );
    }

    #[test]
    fn draw_and_delete_are_only_reachable_from_idle() {
        use ModeEvent::*;

        assert_eq!(next_mode(ControlMode::Idle, ActivateDraw), Some(ControlMode::Draw));
        assert_eq!(next_mode(ControlMode::Idle, ActivateDelete), Some(ControlMode::Delete));
        assert_eq!(next_mode(ControlMode::Draw, ActivateDelete), None);
        assert_eq!(next_mode(ControlMode::Delete, ActivateDraw), None);
        assert_eq!(next_mode(ControlMode::Draw, ActivateDraw), None);
        assert_eq!(next_mode(ControlMode::Idle, DeactivateDelete), None);
        assert_eq!(next_mode(ControlMode::Delete, DeactivateDelete), Some(ControlMode::Idle));
    }

    #[test]
    fn deactivation_is_idempotent() {
        let mut bus = EventBus::new();
        let seen = recorded(&mut bus);
        let mut modes = controller();

        assert!(!modes.deactivate_draw(&mut bus));
        assert!(!modes.deactivate_delete(&mut bus));

        assert!(seen.borrow().is_empty());
        assert_eq!(modes.epoch(), 0);
        assert_eq!(modes.mode(), ControlMode::Idle);
    }

    #[test]
    fn toggle_delete_with_zero_groups_only_flashes() {
        let mut bus = EventBus::new();
        let mut manager = OverlayGroupManager::new();
        let seen = recorded(&mut bus);
        let mut modes = controller();

        modes.toggle_delete(&mut manager, &mut bus);

        assert_eq!(modes.mode(), ControlMode::Idle);
        assert!(modes.delete_affordance().is_flashing());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn toggle_delete_with_one_group_removes_it_immediately() {
        let mut bus = EventBus::new();
        let mut manager = manager_with(1, &mut bus);
        let seen = recorded(&mut bus);
        let mut modes = controller();

        modes.toggle_delete(&mut manager, &mut bus);

        assert_eq!(modes.mode(), ControlMode::Idle);
        assert_eq!(manager.count(), 0);
        assert_eq!(
            seen.borrow().as_slice(),
            &[ControlEvent::Delete {
                group_id: GroupId(1)
            }]
        );
    }

    #[test]
    fn toggle_delete_with_many_groups_waits_for_pick() {
        let mut bus = EventBus::new();
        let mut manager = manager_with(2, &mut bus);
        let mut modes = controller();

        modes.toggle_delete(&mut manager, &mut bus);
        assert_eq!(modes.mode(), ControlMode::Delete);
        assert!(modes.delete_affordance().is_active());
        assert_eq!(manager.count(), 2);

        manager.remove(GroupId(1), &mut bus);
        modes.registry_changed(&manager, &mut bus);
        assert_eq!(modes.mode(), ControlMode::Delete);

        manager.remove(GroupId(2), &mut bus);
        modes.registry_changed(&manager, &mut bus);
        assert_eq!(modes.mode(), ControlMode::Idle);
        assert!(!modes.delete_affordance().is_active());
    }

    #[test]
    fn toggle_draw_leaves_delete_first() {
        let mut bus = EventBus::new();
        let mut manager = manager_with(2, &mut bus);
        let mut modes = controller();
        modes.toggle_delete(&mut manager, &mut bus);
        let seen = recorded(&mut bus);

        modes.toggle_draw(&mut bus);

        assert_eq!(modes.mode(), ControlMode::Draw);
        let kinds: Vec<_> = seen.borrow().iter().map(ControlEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::Deactivated, EventKind::Activated]);
    }

    #[test]
    fn toggle_delete_leaves_draw_first() {
        let mut bus = EventBus::new();
        let mut manager = manager_with(3, &mut bus);
        let mut modes = controller();
        modes.toggle_draw(&mut bus);

        modes.toggle_delete(&mut manager, &mut bus);

        assert_eq!(modes.mode(), ControlMode::Delete);
        assert!(!modes.probe().is_armed());
    }

    #[test]
    fn completion_rearms_or_deactivates() {
        let mut bus = EventBus::new();
        let mut modes = controller();
        modes.activate_draw(&mut bus);
        let tap = PointerEvent::Tapped {
            input: PointerInput::Mouse,
            position: ScreenPoint::new(10.0, 10.0),
        };
        let view = MercatorViewport::new(LatLng::new(0.0, 0.0), 10.0, 100.0, 100.0);
        assert!(matches!(
            modes.probe_mut().handle(tap, &view),
            ProbeOutcome::Committed(_)
        ));
        assert!(!modes.probe().commit_armed());

        modes.complete_draw(true, &mut bus);
        assert_eq!(modes.mode(), ControlMode::Draw);
        assert!(modes.probe().commit_armed());

        modes.complete_draw(false, &mut bus);
        assert_eq!(modes.mode(), ControlMode::Idle);
    }

    #[test]
    fn failed_draw_returns_to_idle_and_flashes() {
        let mut bus = EventBus::new();
        let mut modes = controller();
        modes.activate_draw(&mut bus);

        modes.fail_draw(&mut bus);

        assert_eq!(modes.mode(), ControlMode::Idle);
        assert!(modes.draw_affordance().is_flashing());
        assert!(!modes.delete_affordance().is_flashing());
    }
}
