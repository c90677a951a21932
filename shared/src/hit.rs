use std::fmt;
use std::str::FromStr;

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::geo::FeatureId;
use crate::path::RenderPath;
use crate::spatial::SpatialGrid;

/// Slack, in region pixels, when picking candidates by bounding box.
const CANDIDATE_TOLERANCE: f64 = 1.0;

/// Which region wins when several contain the pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitOrder {
    /// The region painted last, i.e. the one the user sees on top.
    #[default]
    TopmostPainted,
    /// The earliest feature in load order.
    FirstInLoadOrder,
}

impl fmt::Display for HitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TopmostPainted => "topmost",
            Self::FirstInLoadOrder => "first",
        })
    }
}

impl FromStr for HitOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topmost" | "topmost_painted" => Ok(Self::TopmostPainted),
            "first" | "first_in_load_order" => Ok(Self::FirstInLoadOrder),
            other => Err(format!("unknown hit order `{other}`")),
        }
    }
}

/// Fillable outline of one drawn feature, in backing-buffer pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub feature: FeatureId,
    pub path: RenderPath,
    pub bounds: Rect,
}

/// Retained regions for an immediate-mode surface, rebuilt from the same
/// paths as every redraw.
#[derive(Debug, Clone, Default)]
pub struct HitTester {
    order: HitOrder,
    regions: Vec<HitRegion>,
    grid: SpatialGrid,
}

impl HitTester {
    pub fn new(order: HitOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn regions(&self) -> &[HitRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Replace every region. Paths must arrive in draw order; empty paths are
    /// skipped.
    pub fn rebuild(&mut self, paths: impl IntoIterator<Item = (FeatureId, RenderPath)>) {
        self.regions = paths
            .into_iter()
            .filter_map(|(feature, path)| {
                let bounds = path.bounds()?;
                Some(HitRegion {
                    feature,
                    path,
                    bounds,
                })
            })
            .collect();
        let boxes: Vec<Rect> = self.regions.iter().map(|r| r.bounds).collect();
        self.grid = SpatialGrid::build(&boxes);
    }

    /// Feature under `point`, given in the surface element's local display
    /// pixels. `surface` maps backing pixels to those display pixels (see
    /// [`surface_transform`](crate::css::surface_transform)); each candidate
    /// region is transformed by it and tested against the untouched point.
    pub fn hit_test(&self, point: Point, surface: &Affine) -> Option<FeatureId> {
        if self.regions.is_empty() || !point.is_finite() {
            return None;
        }

        let mut candidates = match invert(surface) {
            Some(inverse) => self
                .grid
                .candidates_at(inverse * point, CANDIDATE_TOLERANCE),
            None => (0..self.regions.len()).collect(),
        };
        if self.order == HitOrder::TopmostPainted {
            candidates.reverse();
        }

        candidates
            .into_iter()
            .map(|idx| &self.regions[idx])
            .find(|region| region.path.transformed(*surface).contains(point))
            .map(|region| region.feature)
    }
}

fn invert(transform: &Affine) -> Option<Affine> {
    let det = transform.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }
    Some(transform.inverse())
}

#[cfg(test)]
mod tests {
    use kurbo::BezPath;

    use super::*;

    fn square(x: f64, y: f64, side: f64) -> RenderPath {
        let mut path = BezPath::new();
        path.move_to((x, y));
        path.line_to((x + side, y));
        path.line_to((x + side, y + side));
        path.line_to((x, y + side));
        path.close_path();
        RenderPath::from(path)
    }

    fn tester(order: HitOrder) -> HitTester {
        let mut tester = HitTester::new(order);
        tester.rebuild([
            (FeatureId(0), square(0.0, 0.0, 100.0)),
            (FeatureId(1), RenderPath::default()),
            (FeatureId(2), square(50.0, 50.0, 100.0)),
            (FeatureId(3), square(300.0, 300.0, 20.0)),
        ]);
        tester
    }

    #[test]
    fn empty_paths_get_no_region() {
        let t = tester(HitOrder::default());
        assert_eq!(t.len(), 3);
        assert!(t.regions().iter().all(|r| r.feature != FeatureId(1)));
    }

    #[test]
    fn containment_positive_and_negative() {
        let t = tester(HitOrder::default());
        assert_eq!(t.hit_test(Point::new(10.0, 10.0), &Affine::IDENTITY), Some(FeatureId(0)));
        assert_eq!(t.hit_test(Point::new(310.0, 310.0), &Affine::IDENTITY), Some(FeatureId(3)));
        assert_eq!(t.hit_test(Point::new(1000.0, -40.0), &Affine::IDENTITY), None);
        assert_eq!(t.hit_test(Point::new(200.0, 200.0), &Affine::IDENTITY), None);
    }

    #[test]
    fn overlap_follows_hit_order() {
        let overlap = Point::new(75.0, 75.0);
        let topmost = tester(HitOrder::TopmostPainted);
        assert_eq!(topmost.hit_test(overlap, &Affine::IDENTITY), Some(FeatureId(2)));
        let first = tester(HitOrder::FirstInLoadOrder);
        assert_eq!(first.hit_test(overlap, &Affine::IDENTITY), Some(FeatureId(0)));
    }

    #[test]
    fn regions_are_mapped_through_the_surface_transform() {
        let t = tester(HitOrder::default());
        let display_scale = Affine::scale(2.0);
        assert_eq!(t.hit_test(Point::new(620.0, 620.0), &display_scale), Some(FeatureId(3)));
        assert_eq!(t.hit_test(Point::new(310.0, 310.0), &display_scale), None);
    }

    #[test]
    fn singular_transform_scans_without_panicking() {
        let t = tester(HitOrder::default());
        let flat = Affine::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(t.hit_test(Point::new(10.0, 0.0), &flat), None);
    }

    #[test]
    fn rebuild_replaces_every_region() {
        let mut t = tester(HitOrder::default());
        t.rebuild([(FeatureId(7), square(300.0, 0.0, 50.0))]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.hit_test(Point::new(10.0, 10.0), &Affine::IDENTITY), None);
        assert_eq!(t.hit_test(Point::new(310.0, 10.0), &Affine::IDENTITY), Some(FeatureId(7)));

        t.rebuild([(FeatureId(5), RenderPath::default())]);
        assert!(t.is_empty());
        assert_eq!(t.hit_test(Point::new(310.0, 10.0), &Affine::IDENTITY), None);
    }

    #[test]
    fn hit_order_parses() {
        assert_eq!("first".parse::<HitOrder>(), Ok(HitOrder::FirstInLoadOrder));
        assert_eq!("Topmost".parse::<HitOrder>(), Ok(HitOrder::TopmostPainted));
        assert!("random".parse::<HitOrder>().is_err());
        assert_eq!(HitOrder::FirstInLoadOrder.to_string(), "first");
    }
}
