use kurbo::{Point, Rect};

const GRID_COLS: usize = 32;
const GRID_ROWS: usize = 32;

/// Boxes are filed under every cell within this distance, so queries with a
/// tolerance up to it never miss a neighbour cell.
pub const INDEX_SLACK: f64 = 2.0;

/// A flat 2D grid over region space for narrowing hit tests to a handful of
/// candidates. Rebuilt whenever the regions are.
#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    boxes: Vec<Rect>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    /// Index `boxes` by position; the slot index is what queries return.
    pub fn build(boxes: &[Rect]) -> Self {
        let Some(extent) = boxes
            .iter()
            .copied()
            .filter(|b| b.is_finite())
            .reduce(|a, b| a.union(b))
        else {
            return Self {
                boxes: boxes.to_vec(),
                ..Self::default()
            };
        };

        // Pad so boxes on the far edge land inside the last cell
        let extent = extent.inflate(INDEX_SLACK + 1.0, INDEX_SLACK + 1.0);
        let cell_w = extent.width() / GRID_COLS as f64;
        let cell_h = extent.height() / GRID_ROWS as f64;

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, b) in boxes.iter().enumerate() {
            if !b.is_finite() {
                continue;
            }
            let b = b.inflate(INDEX_SLACK, INDEX_SLACK);
            let col_start = ((b.x0 - extent.x0) / cell_w).floor().max(0.0) as usize;
            let col_end = ((b.x1 - extent.x0) / cell_w).ceil().min(GRID_COLS as f64) as usize;
            let row_start = ((b.y0 - extent.y0) / cell_h).floor().max(0.0) as usize;
            let row_end = ((b.y1 - extent.y0) / cell_h).ceil().min(GRID_ROWS as f64) as usize;

            for row in row_start..row_end.max(row_start + 1).min(GRID_ROWS) {
                for col in col_start..col_end.max(col_start + 1).min(GRID_COLS) {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            boxes: boxes.to_vec(),
            min_x: extent.x0,
            min_y: extent.y0,
            cell_w,
            cell_h,
        }
    }

    /// Slots whose box, grown by `tolerance` (at most [`INDEX_SLACK`]),
    /// contains `pt`, in ascending slot order.
    pub fn candidates_at(&self, pt: Point, tolerance: f64) -> Vec<usize> {
        if self.cells.is_empty() || !pt.is_finite() {
            return Vec::new();
        }

        let col = ((pt.x - self.min_x) / self.cell_w).floor();
        let row = ((pt.y - self.min_y) / self.cell_h).floor();
        if col < 0.0 || row < 0.0 || col >= GRID_COLS as f64 || row >= GRID_ROWS as f64 {
            return Vec::new();
        }

        let cell = &self.cells[row as usize * GRID_COLS + col as usize];
        cell.iter()
            .copied()
            .filter(|&idx| contains_closed(self.boxes[idx].inflate(tolerance, tolerance), pt))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Edges count as inside, unlike `Rect::contains`.
fn contains_closed(r: Rect, pt: Point) -> bool {
    pt.x >= r.x0 && pt.x <= r.x1 && pt.y >= r.y0 && pt.y <= r.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_finds_nothing() {
        let grid = SpatialGrid::build(&[]);
        assert!(grid.is_empty());
        assert!(grid.candidates_at(Point::new(0.0, 0.0), 1.0).is_empty());
    }

    #[test]
    fn finds_overlapping_boxes_in_slot_order() {
        let grid = SpatialGrid::build(&[
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(200.0, 200.0, 300.0, 300.0),
            Rect::new(50.0, 50.0, 150.0, 150.0),
        ]);
        assert_eq!(grid.candidates_at(Point::new(75.0, 75.0), 0.0), vec![0, 2]);
        assert_eq!(grid.candidates_at(Point::new(250.0, 250.0), 0.0), vec![1]);
        assert!(grid.candidates_at(Point::new(180.0, 20.0), 0.0).is_empty());
        assert!(grid.candidates_at(Point::new(-50.0, 20.0), 0.0).is_empty());
    }

    #[test]
    fn tolerance_grows_boxes() {
        let grid = SpatialGrid::build(&[
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(300.0, 300.0, 400.0, 400.0),
        ]);
        let just_outside = Point::new(100.9, 50.0);
        assert!(grid.candidates_at(just_outside, 0.0).is_empty());
        assert_eq!(grid.candidates_at(just_outside, 1.0), vec![0]);
    }

    #[test]
    fn degenerate_boxes_are_indexed() {
        let grid = SpatialGrid::build(&[Rect::new(10.0, 10.0, 10.0, 10.0)]);
        assert_eq!(grid.candidates_at(Point::new(10.0, 10.0), 0.0), vec![0]);
    }

    #[test]
    fn non_finite_boxes_are_skipped() {
        let grid = SpatialGrid::build(&[
            Rect::new(f64::NAN, 0.0, 1.0, 1.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        ]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.candidates_at(Point::new(5.0, 5.0), 0.0), vec![1]);
    }
}
