use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::geo::{GeoBounds, LngLat};
use crate::projection::{self, MAX_LATITUDE};

const ZOOM_SENSITIVITY: f64 = 0.001;

/// Allowed zoom levels, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min;
        }
        zoom.clamp(self.min, self.max)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 18.0,
        }
    }
}

/// Current map view: center, zoom, container size and the derived pixel
/// origin (world pixel under the container's top-left corner).
///
/// Only the view controller mutates this; everything that draws reads it
/// through a [`Projector`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    center: LngLat,
    zoom: f64,
    size: Size,
    zoom_range: ZoomRange,
    pixel_origin: Point,
}

impl ViewState {
    pub fn new(center: LngLat, zoom: f64, size: Size, zoom_range: ZoomRange) -> Self {
        let mut view = Self {
            center: clamp_center(center),
            zoom: zoom_range.clamp(zoom),
            size,
            zoom_range,
            pixel_origin: Point::ORIGIN,
        };
        view.update_origin();
        view
    }

    pub fn center(&self) -> LngLat {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixel_origin(&self) -> Point {
        self.pixel_origin
    }

    /// Projection adapter bound to this exact view snapshot.
    pub fn projector(&self) -> Projector<'_> {
        Projector { view: self }
    }

    /// Move the content by a screen-space delta (drag right moves the map right).
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let center_px = projection::project(self.center, self.zoom) - Vec2::new(dx, dy);
        self.center = clamp_center(projection::unproject(center_px, self.zoom));
        self.update_origin();
    }

    /// Exponential wheel zoom toward a container point. The location under
    /// `anchor` stays put.
    pub fn zoom_at(&mut self, delta: f64, anchor: Point) {
        let dz = -delta * ZOOM_SENSITIVITY / std::f64::consts::LN_2;
        self.set_zoom_around(self.zoom + dz, anchor);
    }

    pub fn set_zoom_around(&mut self, zoom: f64, anchor: Point) {
        let new_zoom = self.zoom_range.clamp(zoom);
        if new_zoom == self.zoom {
            return;
        }
        let fixed = self.projector().unproject(anchor);
        let origin = projection::project(fixed, new_zoom) - anchor.to_vec2();
        let center_px = origin + self.size.to_vec2() / 2.0;
        self.zoom = new_zoom;
        self.center = clamp_center(projection::unproject(center_px, new_zoom));
        self.update_origin();
    }

    /// One whole zoom level in, snapping fractional zooms.
    pub fn zoom_in_at(&mut self, anchor: Point) {
        self.set_zoom_around(self.zoom.floor() + 1.0, anchor);
    }

    pub fn zoom_out_at(&mut self, anchor: Point) {
        self.set_zoom_around(self.zoom.ceil() - 1.0, anchor);
    }

    /// Container resized; the center stays fixed.
    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.update_origin();
    }

    /// Fit `bounds` into the container with `padding` pixels on every side.
    /// The zoom snaps down to a whole level so tiles stay crisp.
    pub fn fit_bounds(&mut self, bounds: GeoBounds, padding: f64) {
        let nw = projection::project(LngLat::new(bounds.west, bounds.north), 0.0);
        let se = projection::project(LngLat::new(bounds.east, bounds.south), 0.0);
        let world_w = se.x - nw.x;
        let world_h = se.y - nw.y;
        let avail_w = self.size.width - padding * 2.0;
        let avail_h = self.size.height - padding * 2.0;

        if world_w > 0.0 && world_h > 0.0 && avail_w > 0.0 && avail_h > 0.0 {
            let scale = (avail_w / world_w).min(avail_h / world_h);
            self.zoom = self.zoom_range.clamp(scale.log2().floor());
        }
        let mid = nw.midpoint(se);
        self.center = clamp_center(projection::unproject(mid, 0.0));
        self.update_origin();
    }

    fn update_origin(&mut self) {
        let center_px = projection::project(self.center, self.zoom);
        self.pixel_origin = (center_px - self.size.to_vec2() / 2.0).round();
    }
}

fn clamp_center(center: LngLat) -> LngLat {
    LngLat::new(center.lng, center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE))
}

/// Maps geographic coordinates into container pixels for one view snapshot.
///
/// It borrows the [`ViewState`], so a projector can never be carried across a
/// view change: callers obtain a fresh one every time they draw.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    view: &'a ViewState,
}

impl Projector<'_> {
    pub fn project(&self, p: LngLat) -> Point {
        let world = projection::project(p, self.view.zoom);
        (world - self.view.pixel_origin).to_point()
    }

    pub fn unproject(&self, pt: Point) -> LngLat {
        projection::unproject(pt + self.view.pixel_origin.to_vec2(), self.view.zoom)
    }
}
