//! Retained vector overlay: one persistent node per feature whose path data
//! is rewritten on every view change. The browser repaints and hit-tests
//! these nodes itself.

use crate::colors::Rgba;
use crate::geo::{FeatureCollection, FeatureId};
use crate::highlight::HighlightState;
use crate::path::PathBuilder;
use crate::render::OverlayStyle;
use crate::view::Projector;

#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    pub feature: FeatureId,
    /// Current `d` attribute; empty for features with nothing to draw.
    pub d: String,
}

#[derive(Debug, Clone)]
pub struct SvgOverlay {
    nodes: Vec<SvgNode>,
    builder: PathBuilder,
}

impl SvgOverlay {
    /// One node per feature, in feature order. Path data is filled in by the
    /// first [`on_view_changed`](Self::on_view_changed).
    pub fn new(features: &FeatureCollection, builder: PathBuilder) -> Self {
        let nodes = features
            .iter()
            .map(|f| SvgNode {
                feature: f.id,
                d: String::new(),
            })
            .collect();
        Self { nodes, builder }
    }

    /// Recompute every node's path data for the new view. Returns how many
    /// nodes changed.
    pub fn on_view_changed(
        &mut self,
        features: &FeatureCollection,
        projector: &Projector<'_>,
    ) -> usize {
        let mut changed = 0;
        for (node, feature) in self.nodes.iter_mut().zip(features) {
            let d = self.builder.build(feature, projector).to_svg_data();
            if d != node.d {
                node.d = d;
                changed += 1;
            }
        }
        changed
    }

    pub fn nodes(&self) -> &[SvgNode] {
        &self.nodes
    }

    pub fn node(&self, id: FeatureId) -> Option<&SvgNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Fill for a node. Unhighlighted nodes get a fully transparent fill rather
/// than `none` so their interior still receives pointer events.
pub fn node_fill(style: &OverlayStyle, highlight: &HighlightState, id: FeatureId) -> String {
    if highlight.is_highlighted(id) {
        style.highlight_fill.css()
    } else {
        Rgba::TRANSPARENT.css()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use super::*;
    use crate::geo::{LngLat, demo_collection};
    use crate::view::{ViewState, ZoomRange};

    fn view() -> ViewState {
        ViewState::new(
            LngLat::new(20.0, 0.0),
            2.0,
            Size::new(1024.0, 768.0),
            ZoomRange::default(),
        )
    }

    #[test]
    fn one_node_per_feature_in_order() {
        let features = demo_collection();
        let overlay = SvgOverlay::new(&features, PathBuilder::default());
        assert_eq!(overlay.len(), features.len());
        for (idx, node) in overlay.nodes().iter().enumerate() {
            assert_eq!(node.feature, FeatureId(idx));
            assert!(node.d.is_empty());
        }
    }

    #[test]
    fn view_change_rewrites_path_data() {
        let features = demo_collection();
        let mut overlay = SvgOverlay::new(&features, PathBuilder::default());
        let mut v = view();

        assert_eq!(overlay.on_view_changed(&features, &v.projector()), features.len());
        assert!(overlay.nodes().iter().all(|n| n.d.starts_with('M')));
        assert_eq!(overlay.on_view_changed(&features, &v.projector()), 0);

        let before = overlay.node(FeatureId(0)).unwrap().d.clone();
        v.pan_by(40.0, 0.0);
        assert_eq!(overlay.on_view_changed(&features, &v.projector()), features.len());
        assert_ne!(overlay.node(FeatureId(0)).unwrap().d, before);
    }

    #[test]
    fn fill_marks_only_the_hovered_node() {
        let style = OverlayStyle::default();
        let hover = HighlightState::Hovering(FeatureId(1));
        assert_eq!(node_fill(&style, &hover, FeatureId(1)), "rgba(0,0,0,0.3)");
        assert_eq!(node_fill(&style, &hover, FeatureId(0)), "rgba(0,0,0,0)");
    }
}
