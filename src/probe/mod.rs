//! Pointer-to-coordinate translation while Draw is armed.

mod projection;

pub use projection::{MapProjection, MercatorViewport};

use crate::geometry::{LatLng, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInput {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved {
        input: PointerInput,
        position: ScreenPoint,
    },
    Tapped {
        input: PointerInput,
        position: ScreenPoint,
    },
    Left,
}

impl PointerEvent {
    pub const fn input(&self) -> Option<PointerInput> {
        match self {
            Self::Moved { input, .. } | Self::Tapped { input, .. } => Some(*input),
            Self::Left => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    /// The probe is not armed; the host should route the event normally.
    Ignored,
    /// Handled by the probe; must not reach other map layers.
    Consumed,
    Committed(LatLng),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeMarker {
    pub position: LatLng,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct CoordinateProbe {
    marker: Option<ProbeMarker>,
    commit_armed: bool,
    last_input: Option<PointerInput>,
}

impl CoordinateProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.marker.is_some()
    }

    pub fn arm(&mut self) {
        if self.marker.is_none() {
            self.marker = Some(ProbeMarker {
                position: LatLng::new(0.0, 0.0),
                visible: false,
            });
        }
        self.commit_armed = true;
        tracing::debug!("coordinate probe armed");
    }

    /// Re-arms the one-shot commit without resetting the marker.
    pub fn rearm_commit(&mut self) {
        if self.marker.is_some() {
            self.commit_armed = true;
        }
    }

    pub fn disarm(&mut self) {
        if self.marker.take().is_some() {
            tracing::debug!("coordinate probe removed");
        }
        self.commit_armed = false;
        self.last_input = None;
    }

    pub fn commit_armed(&self) -> bool {
        self.commit_armed
    }

    pub fn marker(&self) -> Option<&ProbeMarker> {
        self.marker.as_ref()
    }

    pub fn current_coordinate(&self) -> Option<LatLng> {
        self.marker.map(|marker| marker.position)
    }

    pub fn last_input(&self) -> Option<PointerInput> {
        self.last_input
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        projection: &dyn MapProjection,
    ) -> ProbeOutcome {
        let Some(marker) = self.marker.as_mut() else {
            return ProbeOutcome::Ignored;
        };
        if let Some(input) = event.input() {
            self.last_input = Some(input);
        }

        match event {
            PointerEvent::Moved { position, .. } => {
                marker.position = projection.container_point_to_lat_lng(position);
                ProbeOutcome::Consumed
            }
            PointerEvent::Tapped { position, .. } => {
                // Touch taps arrive without a preceding hover.
                marker.position = projection.container_point_to_lat_lng(position);
                if !self.commit_armed {
                    tracing::debug!("duplicate commit ignored while probe is busy");
                    return ProbeOutcome::Consumed;
                }
                self.commit_armed = false;
                ProbeOutcome::Committed(marker.position)
            }
            PointerEvent::Left => ProbeOutcome::Consumed,
        }
    }
}
