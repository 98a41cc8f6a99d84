pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod geometry;
pub mod logging;
pub mod overlay;
pub mod probe;
pub mod request;
pub mod state;

pub use control::ReachabilityControl;
pub use error::{ControlError, ControlResult};

use std::time::{Duration, Instant};

use anyhow::{bail, Context};

use crate::geometry::{LatLng, ScreenPoint};
use crate::probe::{MercatorViewport, PointerEvent, PointerInput, ProbeOutcome};

const DEMO_VIEWPORT_SIZE: f64 = 512.0;
const DEMO_ZOOM: f64 = 12.0;
const POLL_INTERVAL: Duration = Duration::from_millis(24);
const RESPONSE_GRACE: Duration = Duration::from_secs(1);

/// One draw at `<lat> <lng>`, groups printed as JSON.
pub fn run(args: &[String]) -> anyhow::Result<()> {
    logging::init();
    let origin = parse_origin(args)?;

    let config = config::load_control_config();
    let timeout_secs = config.http.timeout_secs;
    let mut control =
        ReachabilityControl::with_http(config).context("failed to set up the control")?;
    control.subscribe(|event| tracing::info!(?event, "control event"));
    control.add_to_map();
    control.toggle_draw();

    let viewport = MercatorViewport::new(origin, DEMO_ZOOM, DEMO_VIEWPORT_SIZE, DEMO_VIEWPORT_SIZE);
    let center = ScreenPoint::new(DEMO_VIEWPORT_SIZE / 2.0, DEMO_VIEWPORT_SIZE / 2.0);
    let outcome = control.handle_pointer(
        PointerEvent::Tapped {
            input: PointerInput::Mouse,
            position: center,
        },
        &viewport,
    );
    if !matches!(outcome, ProbeOutcome::Committed(_)) {
        bail!("draw mode did not accept the origin");
    }

    let deadline = response_deadline(Instant::now(), timeout_secs)
        .with_context(|| format!("http timeout of {timeout_secs}s is out of range"))?;
    while control.is_busy() {
        if Instant::now() >= deadline {
            bail!("timed out waiting for the reachability service");
        }
        std::thread::sleep(POLL_INTERVAL);
        control.poll_responses();
    }

    if control.overlays().is_empty() {
        bail!(
            "no reachability data for {:.5},{:.5}",
            origin.lat,
            origin.lng
        );
    }
    let json = serde_json::to_string_pretty(control.overlays())
        .context("failed to serialize overlay groups")?;
    println!("{json}");

    control.remove_from_map();
    Ok(())
}

fn response_deadline(start: Instant, timeout_secs: u64) -> Option<Instant> {
    start.checked_add(Duration::from_secs(timeout_secs).saturating_add(RESPONSE_GRACE))
}

fn parse_origin(args: &[String]) -> anyhow::Result<LatLng> {
    let [lat, lng] = args else {
        bail!("usage: reachability-control <lat> <lng>");
    };
    let lat: f64 = lat
        .parse()
        .with_context(|| format!("invalid latitude: {lat}"))?;
    let lng: f64 = lng
        .parse()
        .with_context(|| format!("invalid longitude: {lng}"))?;
    let origin = LatLng::new(lat, lng);
    if !origin.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        bail!("coordinate out of range: {lat},{lng}");
    }
    Ok(origin)
}
