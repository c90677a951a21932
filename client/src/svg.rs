#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use geoverlay_shared::svg::node_fill;
use geoverlay_shared::{FeatureCollection, FeatureId, MapConfig, PathBuilder, SvgOverlay, ViewState};
use leptos::prelude::*;
use web_sys::PointerEvent;

use crate::app::{DragOffset, Features, Hover};
use crate::controller::drag_transform;

fn svg_style(css_size: (f64, f64), offset: Option<(f64, f64)>) -> String {
    format!(
        "position: absolute; left: 0px; top: 0px; width: {}px; height: {}px; overflow: visible; transform: {};",
        css_size.0,
        css_size.1,
        drag_transform(offset)
    )
}

/// Retained overlay: one `<path>` per feature. The browser hit-tests the
/// paths, so hover comes from their enter/leave events.
#[component]
pub fn SvgLayer() -> impl IntoView {
    let Features(features) = expect_context();
    let view: RwSignal<ViewState> = expect_context();
    let Hover(hover) = expect_context();
    let DragOffset(drag) = expect_context();
    let config: StoredValue<MapConfig> = expect_context();

    let (style, radius) = config.with_value(|c| (c.style, c.point_radius));
    let builder = PathBuilder::new(radius);
    let overlay = RwSignal::new(SvgOverlay::new(&FeatureCollection::default(), builder));

    // New dataset: new node set.
    Effect::new(move || {
        features.with(|fc| {
            let v = view.get_untracked();
            let mut fresh = SvgOverlay::new(fc, builder);
            fresh.on_view_changed(fc, &v.projector());
            overlay.set(fresh);
        });
    });

    // View changed: rewrite path data in place.
    Effect::new(move || {
        let v = view.get();
        features.with_untracked(|fc| {
            overlay.update(|o| {
                o.on_view_changed(fc, &v.projector());
            });
        });
    });

    let ids = move || {
        overlay.with(|o| o.nodes().iter().map(|n| n.feature).collect::<Vec<FeatureId>>())
    };
    let stroke = style.stroke.color.css();
    let stroke_width = style.stroke.width;

    view! {
        <svg
            style=move || {
                let size = view.with(ViewState::size);
                svg_style((size.width, size.height), drag.get())
            }
        >
            <For
                each=ids
                key=|id| id.0
                children=move |id: FeatureId| {
                    let on_enter = move |_: PointerEvent| {
                        if drag.get_untracked().is_some() {
                            return;
                        }
                        let mut next = hover.get_untracked();
                        if next.apply(Some(id)) {
                            hover.set(next);
                        }
                    };
                    let on_leave = move |_: PointerEvent| {
                        let mut next = hover.get_untracked();
                        if next.target() == Some(id) && next.clear() {
                            hover.set(next);
                        }
                    };
                    view! {
                        <path
                            d=move || overlay.with(|o| o.node(id).map(|n| n.d.clone()).unwrap_or_default())
                            fill=move || hover.with(|h| node_fill(&style, h, id))
                            stroke=stroke.clone()
                            stroke-width=stroke_width.to_string()
                            on:pointerenter=on_enter
                            on:pointerleave=on_leave
                        />
                    }
                }
            />
        </svg>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_carries_size_and_drag() {
        let css = svg_style((640.0, 480.0), Some((5.0, 0.0)));
        assert!(css.contains("width: 640px"));
        assert!(css.contains("height: 480px"));
        assert!(css.contains("transform: translate3d(5px, 0px, 0px)"));
    }
}
