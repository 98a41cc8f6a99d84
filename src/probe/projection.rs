use std::f64::consts::PI;

use crate::geometry::{LatLng, ScreenPoint};

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// The host map's current pan/zoom transform.
pub trait MapProjection {
    fn container_point_to_lat_lng(&self, point: ScreenPoint) -> LatLng;
    fn lat_lng_to_container_point(&self, coordinate: LatLng) -> ScreenPoint;
}

/// Web-Mercator viewport centered on `center`, `width`x`height` pixels at `zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorViewport {
    pub center: LatLng,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl MercatorViewport {
    pub const fn new(center: LatLng, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn project(&self, coordinate: LatLng) -> (f64, f64) {
        let size = self.world_size();
        let lat = coordinate.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (coordinate.lng + 180.0) / 360.0 * size;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
        (x, y)
    }

    fn unproject(&self, x: f64, y: f64) -> LatLng {
        let size = self.world_size();
        let lng = x / size * 360.0 - 180.0;
        let n = PI - 2.0 * PI * y / size;
        let lat = n.sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = self.project(self.center);
        self.center = self.unproject(cx - dx, cy - dy);
    }
}

impl MapProjection for MercatorViewport {
    fn container_point_to_lat_lng(&self, point: ScreenPoint) -> LatLng {
        let (cx, cy) = self.project(self.center);
        let x = cx + point.x - self.width / 2.0;
        let y = cy + point.y - self.height / 2.0;
        self.unproject(x, y)
    }

    fn lat_lng_to_container_point(&self, coordinate: LatLng) -> ScreenPoint {
        let (cx, cy) = self.project(self.center);
        let (x, y) = self.project(coordinate);
        ScreenPoint::new(x - cx + self.width / 2.0, y - cy + self.height / 2.0)
    }
}
