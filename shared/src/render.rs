//! Immediate-mode overlay: every redraw repaints the whole surface and
//! rebuilds the hit regions from the same paths.

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

use crate::colors::Rgba;
use crate::geo::{FeatureCollection, FeatureId};
use crate::highlight::HighlightState;
use crate::hit::{HitOrder, HitTester};
use crate::path::{PathBuilder, RenderPath};
use crate::view::Projector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            width: 1.0,
        }
    }
}

/// How features are painted, shared by both overlay kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub stroke: StrokeStyle,
    /// Fill of the hovered feature; every other feature is left unfilled.
    pub highlight_fill: Rgba,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke: StrokeStyle::default(),
            highlight_fill: Rgba::new(0, 0, 0, 0.3),
        }
    }
}

/// A raster target with no memory of what was drawn on it. Coordinates are
/// backing-buffer pixels.
pub trait DrawSurface {
    fn backing_size(&self) -> Size;

    /// Backing pixels per CSS pixel.
    fn pixel_ratio(&self) -> f64 {
        1.0
    }

    fn clear(&mut self);

    fn stroke_path(&mut self, path: &RenderPath, style: &StrokeStyle);

    fn fill_path(&mut self, path: &RenderPath, color: Rgba);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Size),
    Stroke(RenderPath, StrokeStyle),
    Fill(RenderPath, Rgba),
}

/// Headless surface that records what would have been painted since the
/// last clear.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    size: Size,
    pixel_ratio: f64,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(size: Size, pixel_ratio: f64) -> Self {
        Self {
            size,
            pixel_ratio,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }
}

impl DrawSurface for DisplayList {
    fn backing_size(&self) -> Size {
        self.size
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(self.size));
    }

    fn stroke_path(&mut self, path: &RenderPath, style: &StrokeStyle) {
        self.ops.push(DrawOp::Stroke(path.clone(), *style));
    }

    fn fill_path(&mut self, path: &RenderPath, color: Rgba) {
        self.ops.push(DrawOp::Fill(path.clone(), color));
    }
}

/// Canvas overlay renderer. Owns its surface for its whole life.
#[derive(Debug)]
pub struct CanvasRenderer<S> {
    surface: S,
    style: OverlayStyle,
    builder: PathBuilder,
    hits: HitTester,
}

impl<S: DrawSurface> CanvasRenderer<S> {
    pub fn new(surface: S, style: OverlayStyle, builder: PathBuilder, order: HitOrder) -> Self {
        Self {
            surface,
            style,
            builder,
            hits: HitTester::new(order),
        }
    }

    /// Repaint everything for this view and highlight. Returns how many
    /// features produced a visible path.
    pub fn redraw(
        &mut self,
        features: &FeatureCollection,
        projector: &Projector<'_>,
        highlight: &HighlightState,
    ) -> usize {
        self.surface.clear();

        let ratio = self.surface.pixel_ratio();
        let to_backing = Affine::scale(ratio);
        let stroke = StrokeStyle {
            width: self.style.stroke.width * ratio,
            ..self.style.stroke
        };

        let mut drawn: Vec<(FeatureId, RenderPath)> = Vec::with_capacity(features.len());
        for feature in features {
            let path = self.builder.build(feature, projector);
            if path.is_empty() {
                continue;
            }
            let path = path.transformed(to_backing);
            self.surface.stroke_path(&path, &stroke);
            if highlight.is_highlighted(feature.id) && !self.style.highlight_fill.is_transparent() {
                self.surface.fill_path(&path, self.style.highlight_fill);
            }
            drawn.push((feature.id, path));
        }

        let count = drawn.len();
        self.hits.rebuild(drawn);
        count
    }

    /// Feature under a pointer in the surface element's local display pixels.
    /// `surface_transform` maps backing pixels to display pixels.
    pub fn hit_test(&self, point: Point, surface_transform: &Affine) -> Option<FeatureId> {
        self.hits.hit_test(point, surface_transform)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn hit_tester(&self) -> &HitTester {
        &self.hits
    }
}
