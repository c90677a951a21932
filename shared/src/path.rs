use std::borrow::Cow;
use std::fmt::Write as _;

use kurbo::{Affine, BezPath, Circle, PathEl, Point, Rect, Shape};

use crate::geo::{Feature, Geometry, LngLat};
use crate::view::Projector;

/// Drawing commands for one feature at one view, in container pixels.
///
/// Built fresh for every view; never cached across view changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPath(BezPath);

impl RenderPath {
    pub fn commands(&self) -> &[PathEl] {
        self.0.elements()
    }

    pub fn is_empty(&self) -> bool {
        self.0.elements().is_empty()
    }

    pub fn bounds(&self) -> Option<Rect> {
        if self.is_empty() {
            None
        } else {
            Some(self.0.bounding_box())
        }
    }

    pub fn transformed(&self, transform: Affine) -> Self {
        Self(transform * self.0.clone())
    }

    /// Non-zero winding containment, treating open subpaths as closed the
    /// way a canvas fill does.
    pub fn contains(&self, pt: Point) -> bool {
        !self.is_empty() && self.fill_outline().contains(pt)
    }

    fn fill_outline(&self) -> Cow<'_, BezPath> {
        let mut open = false;
        let mut needs_close = false;
        for el in self.0.elements() {
            match el {
                PathEl::MoveTo(_) => {
                    needs_close |= open;
                    open = true;
                }
                PathEl::ClosePath => open = false,
                _ => {}
            }
        }
        if !needs_close && !open {
            return Cow::Borrowed(&self.0);
        }

        let mut closed = BezPath::new();
        let mut open = false;
        for el in self.0.elements() {
            match el {
                PathEl::MoveTo(_) if open => {
                    closed.close_path();
                }
                PathEl::ClosePath => open = false,
                _ => {}
            }
            if let PathEl::MoveTo(_) = el {
                open = true;
            }
            closed.push(*el);
        }
        if open {
            closed.close_path();
        }
        Cow::Owned(closed)
    }

    /// SVG path data (`d` attribute), e.g. `M10,20L30,20L30,40Z`.
    pub fn to_svg_data(&self) -> String {
        let mut out = String::new();
        for el in self.0.elements() {
            match el {
                PathEl::MoveTo(p) => push_cmd(&mut out, 'M', &[*p]),
                PathEl::LineTo(p) => push_cmd(&mut out, 'L', &[*p]),
                PathEl::QuadTo(p1, p) => push_cmd(&mut out, 'Q', &[*p1, *p]),
                PathEl::CurveTo(p1, p2, p) => push_cmd(&mut out, 'C', &[*p1, *p2, *p]),
                PathEl::ClosePath => out.push('Z'),
            }
        }
        out
    }
}

impl From<BezPath> for RenderPath {
    fn from(path: BezPath) -> Self {
        Self(path)
    }
}

fn push_cmd(out: &mut String, cmd: char, points: &[Point]) {
    out.push(cmd);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{},{}", svg_number(p.x), svg_number(p.y));
    }
}

/// Three decimals, trailing zeros trimmed.
fn svg_number(v: f64) -> String {
    let mut s = format!("{v:.3}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}

const CIRCLE_TOLERANCE: f64 = 0.1;

/// Turns geometries into [`RenderPath`]s through a [`Projector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathBuilder {
    /// Radius in pixels of the marker drawn for point geometries.
    pub point_radius: f64,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self { point_radius: 4.5 }
    }
}

impl PathBuilder {
    pub fn new(point_radius: f64) -> Self {
        Self { point_radius }
    }

    pub fn build(&self, feature: &Feature, projector: &Projector<'_>) -> RenderPath {
        match &feature.geometry {
            Some(geometry) => self.build_geometry(geometry, projector),
            None => RenderPath::default(),
        }
    }

    pub fn build_geometry(&self, geometry: &Geometry, projector: &Projector<'_>) -> RenderPath {
        let mut path = BezPath::new();
        self.append(geometry, projector, &mut path);
        RenderPath(path)
    }

    fn append(&self, geometry: &Geometry, projector: &Projector<'_>, path: &mut BezPath) {
        match geometry {
            Geometry::Point { coordinates } => self.append_point(*coordinates, projector, path),
            Geometry::MultiPoint { coordinates } => {
                for p in coordinates {
                    self.append_point(*p, projector, path);
                }
            }
            Geometry::LineString { coordinates } => append_line(coordinates, projector, path),
            Geometry::MultiLineString { coordinates } => {
                for line in coordinates {
                    append_line(line, projector, path);
                }
            }
            Geometry::Polygon { coordinates } => {
                for ring in coordinates {
                    append_ring(ring, projector, path);
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    for ring in polygon {
                        append_ring(ring, projector, path);
                    }
                }
            }
            Geometry::GeometryCollection { geometries } => {
                for member in geometries {
                    self.append(member, projector, path);
                }
            }
        }
    }

    fn append_point(&self, p: LngLat, projector: &Projector<'_>, path: &mut BezPath) {
        let center = projector.project(p);
        if !center.is_finite() || self.point_radius.is_nan() || self.point_radius <= 0.0 {
            return;
        }
        path.extend(Circle::new(center, self.point_radius).path_elements(CIRCLE_TOLERANCE));
    }
}

/// Finite projected vertices with consecutive duplicates collapsed.
fn project_vertices(coords: &[LngLat], projector: &Projector<'_>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(coords.len());
    for p in coords {
        let pt = projector.project(*p);
        if !pt.is_finite() || out.last() == Some(&pt) {
            continue;
        }
        out.push(pt);
    }
    out
}

fn append_line(coords: &[LngLat], projector: &Projector<'_>, path: &mut BezPath) {
    let vertices = project_vertices(coords, projector);
    if vertices.len() < 2 {
        return;
    }
    path.move_to(vertices[0]);
    for v in &vertices[1..] {
        path.line_to(*v);
    }
}

fn append_ring(ring: &[LngLat], projector: &Projector<'_>, path: &mut BezPath) {
    let mut vertices = project_vertices(ring, projector);
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 {
        return;
    }
    path.move_to(vertices[0]);
    for v in &vertices[1..] {
        path.line_to(*v);
    }
    path.close_path();
}
