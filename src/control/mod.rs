//! The map control as the host sees it. Responses are applied from
//! [`ReachabilityControl::poll_responses`], never from the request function.

mod affordance;
mod mode;

pub use affordance::{Affordance, AffordanceState, ACTIVE_CURSOR_CLASS};
pub use mode::ModeController;

use std::time::Duration;

use crate::config::ControlConfig;
use crate::error::ControlResult;
use crate::events::{ControlEvent, EventBus, EventKind, NoDataReason, SubscriptionId};
use crate::geometry::LatLng;
use crate::overlay::{
    FeatureInteraction, GroupId, IngestOptions, InteractionOutcome, OverlayGroup,
    OverlayGroupManager, OverlayHooks, OverlayLifecycle,
};
use crate::probe::{MapProjection, PointerEvent, ProbeOutcome};
use crate::request::{
    HttpFetcher, OverlayRequest, RequestError, RequestFn, RequestOrchestrator, RequestOutcome,
};
use crate::state::{ControlMode, ControlState, RangeType, TravelMode};

pub struct ReachabilityControl {
    config: ControlConfig,
    range_type: RangeType,
    travel_mode: TravelMode,
    draw_multiple: bool,
    show_intervals: bool,
    range_value: f64,
    modes: ModeController,
    requests: RequestOrchestrator,
    lifecycle: OverlayLifecycle,
    overlays: OverlayGroupManager,
    events: EventBus,
    fetcher: Box<dyn RequestFn>,
    attached: bool,
}

impl std::fmt::Debug for ReachabilityControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityControl")
            .field("state", &self.state())
            .field("attached", &self.attached)
            .field("groups", &self.overlays.count())
            .field("busy", &self.requests.is_busy())
            .finish()
    }
}

impl ReachabilityControl {
    pub fn new(config: ControlConfig, fetcher: impl RequestFn + 'static) -> ControlResult<Self> {
        config.validate()?;
        let range_value = config.range_control(config.range_type).min;
        Ok(Self {
            range_type: config.range_type,
            travel_mode: config.travel_mode,
            draw_multiple: config.draw_multiple,
            show_intervals: config.show_intervals,
            range_value,
            modes: ModeController::new(Duration::from_millis(config.error_flash_ms)),
            requests: RequestOrchestrator::new(),
            lifecycle: OverlayLifecycle::default(),
            overlays: OverlayGroupManager::new(),
            events: EventBus::new(),
            fetcher: Box::new(fetcher),
            attached: false,
            config,
        })
    }

    /// Uses the built-in HTTP request function configured by `config.http`.
    pub fn with_http(config: ControlConfig) -> ControlResult<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.http)?;
        Self::new(config, fetcher)
    }

    pub fn with_hooks(mut self, hooks: OverlayHooks) -> Self {
        *self.lifecycle.hooks_mut() = hooks;
        self
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ControlEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&ControlEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe_kind(kind, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn add_to_map(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        tracing::info!("reachability control added to map");
        self.events.emit(ControlEvent::ControlAdded);
    }

    /// Tears down modes and overlays, then drops every listener.
    pub fn remove_from_map(&mut self) {
        if !self.attached {
            return;
        }
        self.modes.deactivate_draw(&mut self.events);
        self.modes.deactivate_delete(&mut self.events);
        self.requests.abandon_in_flight();
        self.overlays.remove_all(&mut self.events);
        self.attached = false;
        tracing::info!("reachability control removed from map");
        self.events.emit(ControlEvent::ControlRemoved);
        self.events.clear();
    }

    pub fn state(&self) -> ControlState {
        ControlState {
            mode: self.modes.mode(),
            range_type: self.range_type,
            travel_mode: self.travel_mode,
            draw_multiple: self.draw_multiple,
            show_intervals: self.show_intervals,
            range_value: self.range_value,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.modes.mode()
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn draw_affordance(&self) -> &Affordance {
        self.modes.draw_affordance()
    }

    pub fn delete_affordance(&self) -> &Affordance {
        self.modes.delete_affordance()
    }

    pub fn map_cursor_class(&self) -> Option<&'static str> {
        self.modes.map_cursor_class()
    }

    pub fn is_busy(&self) -> bool {
        self.requests.is_busy()
    }

    pub fn overlays(&self) -> &[OverlayGroup] {
        self.overlays.groups()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.count()
    }

    pub fn toggle_draw(&mut self) {
        if !self.attached {
            tracing::debug!("draw toggle ignored while detached");
            return;
        }
        self.modes.toggle_draw(&mut self.events);
        self.detach_stale_request();
    }

    pub fn toggle_delete(&mut self) {
        if !self.attached {
            tracing::debug!("delete toggle ignored while detached");
            return;
        }
        self.modes.toggle_delete(&mut self.overlays, &mut self.events);
        self.detach_stale_request();
    }

    /// Switching range type resets the range to the new type's minimum.
    pub fn set_range_type(&mut self, range_type: RangeType) {
        if self.range_type == range_type {
            return;
        }
        self.range_type = range_type;
        self.range_value = self.config.range_control(range_type).min;
        tracing::debug!(range_type = range_type.as_str(), "range type changed");
    }

    pub fn set_travel_mode(&mut self, travel_mode: TravelMode) {
        self.travel_mode = travel_mode;
        tracing::debug!(?travel_mode, "travel mode changed");
    }

    pub fn set_range_value(&mut self, value: f64) -> f64 {
        if !value.is_finite() {
            tracing::warn!(value, "non-finite range value ignored");
            return self.range_value;
        }
        self.range_value = self.config.range_control(self.range_type).clamp(value);
        self.range_value
    }

    pub fn set_show_intervals(&mut self, show_intervals: bool) {
        self.show_intervals = show_intervals;
    }

    pub fn set_draw_multiple(&mut self, draw_multiple: bool) {
        self.draw_multiple = draw_multiple;
        if !draw_multiple {
            self.overlays.retain_latest(&mut self.events);
            self.modes.registry_changed(&self.overlays, &mut self.events);
        }
    }

    /// `Ignored` hands the event back to the host.
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        projection: &dyn MapProjection,
    ) -> ProbeOutcome {
        let outcome = self.modes.probe_mut().handle(event, projection);
        if let ProbeOutcome::Committed(origin) = outcome {
            self.submit_draw(origin);
        }
        outcome
    }

    pub fn build_request(&self, origin: LatLng) -> OverlayRequest {
        let range = self.config.range_control(self.range_type);
        let interval = self.show_intervals.then_some(range.interval);
        match self.range_type {
            RangeType::Distance => OverlayRequest::distance(
                origin,
                self.range_value,
                self.config.distance_units,
                interval,
                self.travel_mode,
            ),
            RangeType::Time => {
                OverlayRequest::time(origin, self.range_value, interval, self.travel_mode)
            }
        }
    }

    fn submit_draw(&mut self, origin: LatLng) {
        let request = self.build_request(origin);
        let submitted = self.requests.submit(
            &self.config,
            request,
            self.modes.epoch(),
            self.fetcher.as_ref(),
            &mut self.events,
        );
        match submitted {
            Ok(ticket) => {
                tracing::debug!(ticket, lat = origin.lat, lng = origin.lng, "draw committed");
                self.poll_responses();
            }
            Err(RequestError::Busy) => {
                tracing::debug!("draw commit ignored while a request is in flight");
            }
            Err(err) => {
                tracing::warn!(%err, "failed to submit reachability request");
                self.events.emit(ControlEvent::from_request_error(&err));
                self.modes.fail_draw(&mut self.events);
            }
        }
    }

    /// Returns how many groups were displayed.
    pub fn poll_responses(&mut self) -> usize {
        let mut displayed = 0;
        for outcome in self.requests.poll(&mut self.events) {
            if self.settle(outcome) {
                displayed += 1;
            }
        }
        displayed
    }

    fn settle(&mut self, outcome: RequestOutcome) -> bool {
        if !self.attached
            || outcome.epoch != self.modes.epoch()
            || self.modes.mode() != ControlMode::Draw
        {
            tracing::debug!(ticket = outcome.ticket, "stale response discarded");
            return false;
        }

        let collection = match outcome.result {
            Ok(collection) => collection,
            Err(err) => {
                tracing::warn!(ticket = outcome.ticket, %err, "reachability request failed");
                self.events.emit(ControlEvent::from_request_error(&err));
                self.modes.fail_draw(&mut self.events);
                return false;
            }
        };

        let options = IngestOptions {
            area_unit: self.config.distance_units,
            default_style: self.config.style.clone(),
            show_origin_marker: self.config.show_origin_marker,
        };
        match self.lifecycle.ingest(collection, &outcome.request, &options) {
            Some(group) => {
                self.overlays.add(group, self.draw_multiple, &mut self.events);
                self.modes.complete_draw(self.draw_multiple, &mut self.events);
                true
            }
            None => {
                self.events.emit(ControlEvent::NoData {
                    reason: NoDataReason::EmptyResult,
                });
                self.modes.fail_draw(&mut self.events);
                false
            }
        }
    }

    pub fn feature_interaction(&mut self, interaction: FeatureInteraction) -> InteractionOutcome {
        let group = self.overlays.group_for_layer(interaction.layer_id);
        let outcome = self
            .lifecycle
            .dispatch(&interaction, group, self.modes.mode());
        if let InteractionOutcome::DeleteGroup(id) = outcome {
            self.remove_group(id);
        }
        outcome
    }

    pub fn remove_group(&mut self, id: GroupId) -> bool {
        let removed = self.overlays.remove(id, &mut self.events).is_some();
        self.modes.registry_changed(&self.overlays, &mut self.events);
        removed
    }

    pub fn clear_overlays(&mut self) -> usize {
        let removed = self.overlays.remove_all(&mut self.events);
        self.modes.registry_changed(&self.overlays, &mut self.events);
        removed
    }

    fn detach_stale_request(&mut self) {
        let stale = self
            .requests
            .in_flight()
            .is_some_and(|pending| pending.epoch != self.modes.epoch());
        if stale {
            self.requests.abandon_in_flight();
        }
    }
}
