use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::view::ViewState;

/// Raster tile server addressed by a `{s}`/`{z}`/`{x}`/`{y}` URL template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSource {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub tile_size: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: vec!["a".into(), "b".into(), "c".into()],
            tile_size: 256.0,
            min_zoom: 0,
            max_zoom: 19,
            attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// A tile to show and where, in container pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTile {
    pub coord: TileCoord,
    pub rect: Rect,
    pub url: String,
}

impl PlacedTile {
    /// Stable key for keyed DOM lists: the same tile at a different wrap
    /// position is a different element.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}@{}",
            self.coord.z, self.coord.x, self.coord.y, self.rect.x0 as i64
        )
    }
}

impl TileSource {
    pub fn tile_url(&self, coord: TileCoord) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let idx = (coord.x as usize + coord.y as usize) % self.subdomains.len();
            self.subdomains[idx].as_str()
        };
        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    /// Whole tile zoom used for a (possibly fractional) view zoom.
    pub fn tile_zoom(&self, view_zoom: f64) -> u8 {
        let z = view_zoom.round();
        if z.is_nan() {
            return self.min_zoom;
        }
        z.clamp(self.min_zoom as f64, self.max_zoom as f64) as u8
    }

    /// Tiles covering the container, nearest to its center first.
    pub fn visible_tiles(&self, view: &ViewState) -> Vec<PlacedTile> {
        let size = view.size();
        let drawable = size.width > 0.0 && size.height > 0.0 && self.tile_size > 0.0;
        if !drawable {
            return Vec::new();
        }

        let z = self.tile_zoom(view.zoom());
        let scale = (view.zoom() - z as f64).exp2();
        let shown = self.tile_size * scale;
        let origin = view.pixel_origin();
        let n = 1_i64 << z;

        let x_start = (origin.x / shown).floor() as i64;
        let x_end = ((origin.x + size.width) / shown).ceil() as i64;
        let y_start = ((origin.y / shown).floor() as i64).max(0);
        let y_end = (((origin.y + size.height) / shown).ceil() as i64).min(n);

        let center = Point::new(size.width / 2.0, size.height / 2.0);
        let mut tiles = Vec::new();
        for ty in y_start..y_end {
            for tx in x_start..x_end {
                let coord = TileCoord {
                    z,
                    x: tx.rem_euclid(n) as u32,
                    y: ty as u32,
                };
                let x0 = tx as f64 * shown - origin.x;
                let y0 = ty as f64 * shown - origin.y;
                tiles.push(PlacedTile {
                    coord,
                    rect: Rect::new(x0, y0, x0 + shown, y0 + shown),
                    url: self.tile_url(coord),
                });
            }
        }

        tiles.sort_by(|a, b| {
            let da = a.rect.center().distance_squared(center);
            let db = b.rect.center().distance_squared(center);
            da.total_cmp(&db)
        });
        tiles
    }
}
