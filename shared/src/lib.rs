pub mod colors;
pub mod config;
pub mod css;
pub mod error;
pub mod geo;
pub mod highlight;
pub mod hit;
pub mod path;
pub mod projection;
pub mod render;
pub mod spatial;
pub mod svg;
pub mod tiles;
pub mod view;

pub use colors::Rgba;
pub use config::{MapConfig, RendererKind};
pub use css::{parse_inline_style, parse_transform, surface_transform};
pub use error::{ConfigError, CssError, LoadError};
pub use geo::*;
pub use highlight::HighlightState;
pub use hit::{HitOrder, HitRegion, HitTester};
pub use path::{PathBuilder, RenderPath};
pub use render::{CanvasRenderer, DisplayList, DrawOp, DrawSurface, OverlayStyle, StrokeStyle};
pub use svg::{SvgNode, SvgOverlay};
pub use tiles::{PlacedTile, TileCoord, TileSource};
pub use view::{Projector, ViewState, ZoomRange};

/// Re-exported so dependents name the same geometry types.
pub use kurbo;
