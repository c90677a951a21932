use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geo::LngLat;
use crate::hit::HitOrder;
use crate::render::OverlayStyle;
use crate::tiles::TileSource;
use crate::view::ZoomRange;

/// Which overlay draws the features. Only one is mounted at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Svg,
    #[default]
    Canvas,
}

impl RendererKind {
    pub fn toggled(self) -> Self {
        match self {
            Self::Svg => Self::Canvas,
            Self::Canvas => Self::Svg,
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Svg => "svg",
            Self::Canvas => "canvas",
        })
    }
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "canvas" => Ok(Self::Canvas),
            other => Err(format!("unknown renderer `{other}`")),
        }
    }
}

/// Everything the map needs at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// GeoJSON to fetch; `None` shows the built-in demo collection.
    pub data_url: Option<String>,
    pub tiles: TileSource,
    pub center: LngLat,
    pub zoom: f64,
    pub zoom_range: ZoomRange,
    /// Fit the view to the dataset once it has loaded.
    pub fit_to_data: bool,
    pub renderer: RendererKind,
    pub hit_order: HitOrder,
    pub point_radius: f64,
    pub style: OverlayStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            data_url: None,
            tiles: TileSource::default(),
            center: LngLat::new(-96.9, 37.8),
            zoom: 3.0,
            zoom_range: ZoomRange::default(),
            fit_to_data: false,
            renderer: RendererKind::default(),
            hit_order: HitOrder::default(),
            point_radius: 4.5,
            style: OverlayStyle::default(),
        }
    }
}

impl MapConfig {
    /// Keys [`apply_override`](Self::apply_override) understands, as they
    /// appear in a page query string (`?renderer=svg&zoom=5`).
    pub const OVERRIDE_KEYS: [&'static str; 7] =
        ["renderer", "hit", "data", "tiles", "zoom", "center", "fit"];

    /// Apply already-decoded `key=value` overrides in order. Unknown keys are
    /// ignored; bad values are skipped and returned.
    pub fn apply_overrides<K, V>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Vec<ConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .filter_map(|(key, value)| self.apply_override(key.as_ref(), value.as_ref()).err())
            .collect()
    }

    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match key {
            "renderer" => self.renderer = value.parse().map_err(|_| invalid())?,
            "hit" => self.hit_order = value.parse().map_err(|_| invalid())?,
            "data" => {
                self.data_url = if value.is_empty() || value == "demo" {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "tiles" => {
                if value.is_empty() {
                    return Err(invalid());
                }
                self.tiles.url_template = value.to_string();
            }
            "zoom" => {
                let zoom: f64 = value.parse().map_err(|_| invalid())?;
                if !zoom.is_finite() {
                    return Err(invalid());
                }
                self.zoom = self.zoom_range.clamp(zoom);
            }
            "center" => {
                let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
                let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
                let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
                let center = LngLat::new(lng, lat);
                if !center.is_finite() || lat.abs() > 90.0 {
                    return Err(invalid());
                }
                self.center = center;
            }
            "fit" => {
                self.fit_to_data = match value {
                    "" | "1" | "true" | "yes" => true,
                    "0" | "false" | "no" => false,
                    _ => return Err(invalid()),
                };
            }
            _ => {}
        }
        Ok(())
    }
}
