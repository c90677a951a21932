//! Spherical Mercator as used by slippy tile maps.
//!
//! World pixel space has its origin at the north-west corner of the world
//! (180 W, ~85.05 N) and spans `256 * 2^zoom` pixels on each axis.

use std::f64::consts::PI;

use kurbo::Point;

use crate::geo::LngLat;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude where the Mercator world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Width (and height) of the world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Geographic coordinate to world pixels at `zoom`. Latitude is clamped to
/// [`MAX_LATITUDE`]; non-finite input produces non-finite output.
pub fn project(p: LngLat, zoom: f64) -> Point {
    let size = world_size(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0;
    let y = 0.5 - (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI);
    Point::new(x * size, y * size)
}

/// Inverse of [`project`].
pub fn unproject(pt: Point, zoom: f64) -> LngLat {
    let size = world_size(zoom);
    let lng = pt.x / size * 360.0 - 180.0;
    let lat = (2.0 * (PI * (1.0 - 2.0 * pt.y / size)).exp().atan() - PI / 2.0).to_degrees();
    LngLat::new(lng, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < tol,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn null_island_is_world_center() {
        let p = project(LngLat::new(0.0, 0.0), 0.0);
        assert_close(p.x, 128.0, 1e-9);
        assert_close(p.y, 128.0, 1e-9);
    }

    #[test]
    fn world_corners_at_zoom_one() {
        let nw = project(LngLat::new(-180.0, MAX_LATITUDE), 1.0);
        assert_close(nw.x, 0.0, 1e-9);
        assert_close(nw.y, 0.0, 1e-6);

        let se = project(LngLat::new(180.0, -MAX_LATITUDE), 1.0);
        assert_close(se.x, 512.0, 1e-9);
        assert_close(se.y, 512.0, 1e-6);
    }

    #[test]
    fn latitude_is_clamped() {
        let pole = project(LngLat::new(0.0, 90.0), 2.0);
        let edge = project(LngLat::new(0.0, MAX_LATITUDE), 2.0);
        assert_eq!(pole, edge);
    }

    #[test]
    fn roundtrip_through_pixels() {
        let samples = [
            LngLat::new(-96.9, 37.8),
            LngLat::new(7.75, 48.58),
            LngLat::new(153.0, -28.0),
            LngLat::new(-179.5, -84.0),
        ];
        for zoom in [0.0, 3.0, 7.5, 18.0] {
            for p in samples {
                let back = unproject(project(p, zoom), zoom);
                assert_close(back.lng, p.lng, 1e-9);
                assert_close(back.lat, p.lat, 1e-9);
            }
        }
    }

    #[test]
    fn non_finite_input_does_not_panic() {
        let p = project(LngLat::new(f64::NAN, f64::INFINITY), 4.0);
        assert!(!p.x.is_finite());
    }
}
