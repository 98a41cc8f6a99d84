use std::time::{Duration, Instant};

/// Class the host puts on the map container while Draw or Delete is on.
pub const ACTIVE_CURSOR_CLASS: &str = "reachability-control-active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceState {
    Inactive,
    Active,
    /// Transient failure highlight; wins over `Active` while it lasts.
    Error,
}

/// Visual state of one toolbar button.
#[derive(Debug, Clone)]
pub struct Affordance {
    active: bool,
    flash_started: Option<Instant>,
    flash_duration: Duration,
}

impl Affordance {
    pub fn new(flash_duration: Duration) -> Self {
        Self {
            active: false,
            flash_started: None,
            flash_duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn flash_duration(&self) -> Duration {
        self.flash_duration
    }

    pub fn flash_started(&self) -> Option<Instant> {
        self.flash_started
    }

    pub(crate) fn flash_error(&mut self) {
        self.flash_started = Some(Instant::now());
    }

    pub fn is_flashing_at(&self, now: Instant) -> bool {
        self.flash_started
            .is_some_and(|started| now.saturating_duration_since(started) < self.flash_duration)
    }

    pub fn is_flashing(&self) -> bool {
        self.is_flashing_at(Instant::now())
    }

    pub fn state_at(&self, now: Instant) -> AffordanceState {
        if self.is_flashing_at(now) {
            AffordanceState::Error
        } else if self.active {
            AffordanceState::Active
        } else {
            AffordanceState::Inactive
        }
    }
}
