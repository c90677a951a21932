#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::Cell;
use std::rc::Rc;

use geoverlay_shared::kurbo::Point;
use geoverlay_shared::{HighlightState, RendererKind, ViewState};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MouseEvent, PointerEvent, TouchEvent, WheelEvent};

use crate::app::{ActiveRenderer, DragOffset, Hover};
use crate::canvas::CanvasLayer;
use crate::svg::SvgLayer;
use crate::tiles::TilePane;

/// Pointer travel, in CSS pixels, below which a press is not a drag.
const DRAG_THRESHOLD: f64 = 3.0;
/// Pinch distance change to wheel delta.
const PINCH_DELTA_SCALE: f64 = 2.0;

/// CSS `transform` for layers while a drag is in flight.
pub(crate) fn drag_transform(offset: Option<(f64, f64)>) -> String {
    match offset {
        Some((dx, dy)) => format!("translate3d({dx}px, {dy}px, 0px)"),
        None => "none".to_string(),
    }
}

/// Point in the container's local CSS pixels.
fn local_point(container: &web_sys::HtmlDivElement, client_x: f64, client_y: f64) -> Point {
    let rect = container.get_bounding_client_rect();
    Point::new(client_x - rect.left(), client_y - rect.top())
}

fn set_cursor(el: &web_sys::HtmlElement, cursor: &str) {
    web_sys::HtmlElement::style(el)
        .set_property("cursor", cursor)
        .ok();
}

fn clear_hover(hover: RwSignal<HighlightState>) {
    let mut next = hover.get_untracked();
    if next.clear() {
        hover.set(next);
    }
}

/// The map container: tile pane plus the active overlay. Owns every gesture
/// that changes the view; each committed change is one update of the view
/// signal.
#[component]
pub fn MapView() -> impl IntoView {
    let view: RwSignal<ViewState> = expect_context();
    let Hover(hover) = expect_context();
    let DragOffset(drag) = expect_context();
    let ActiveRenderer(renderer) = expect_context();

    let container_ref = NodeRef::<leptos::html::Div>::new();

    let pressed = Rc::new(Cell::new(false));
    let press_x = Rc::new(Cell::new(0.0f64));
    let press_y = Rc::new(Cell::new(0.0f64));
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let to_local = move |client_x: f64, client_y: f64| {
        container_ref
            .get_untracked()
            .map(|el| local_point(&el, client_x, client_y))
    };

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let Some(anchor) = to_local(e.client_x() as f64, e.client_y() as f64) else {
            return;
        };
        let delta = e.delta_y();
        view.update(|v| v.zoom_at(delta, anchor));
    };

    let on_dblclick = move |e: MouseEvent| {
        e.prevent_default();
        let Some(anchor) = to_local(e.client_x() as f64, e.client_y() as f64) else {
            return;
        };
        if e.shift_key() {
            view.update(|v| v.zoom_out_at(anchor));
        } else {
            view.update(|v| v.zoom_in_at(anchor));
        }
    };

    let on_pointer_down = {
        let pressed = pressed.clone();
        let press_x = press_x.clone();
        let press_y = press_y.clone();
        move |e: PointerEvent| {
            if e.button() != 0 {
                return;
            }
            pressed.set(true);
            press_x.set(e.client_x() as f64);
            press_y.set(e.client_y() as f64);

            if let Some(target) = e.current_target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
        }
    };

    let on_pointer_move = {
        let pressed = pressed.clone();
        let press_x = press_x.clone();
        let press_y = press_y.clone();
        move |e: PointerEvent| {
            if !pressed.get() {
                return;
            }
            let dx = e.client_x() as f64 - press_x.get();
            let dy = e.client_y() as f64 - press_y.get();
            if drag.get_untracked().is_none() {
                if dx.hypot(dy) < DRAG_THRESHOLD {
                    return;
                }
                clear_hover(hover);
                if let Some(el) = container_ref.get_untracked() {
                    set_cursor(&el, "grabbing");
                }
            }
            drag.set(Some((dx, dy)));
        }
    };

    let end_gesture = {
        let pressed = pressed.clone();
        move |e: PointerEvent| {
            if !pressed.replace(false) {
                return;
            }
            if let Some(target) = e.current_target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.release_pointer_capture(e.pointer_id()).ok();
                set_cursor(&el, "grab");
            }
            if let Some((dx, dy)) = drag.get_untracked() {
                view.update(|v| v.pan_by(dx, dy));
                drag.set(None);
            }
        }
    };
    let on_pointer_up = end_gesture.clone();
    let on_pointer_cancel = end_gesture;

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                pinch_dist.set(dx.hypot(dy));
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                let new_dist = dx.hypot(dy);
                let old_dist = pinch_dist.get();

                if old_dist > 0.0 {
                    let mid_x = (t0.client_x() + t1.client_x()) as f64 / 2.0;
                    let mid_y = (t0.client_y() + t1.client_y()) as f64 / 2.0;
                    if let Some(anchor) = to_local(mid_x, mid_y) {
                        let delta = -(new_dist - old_dist) * PINCH_DELTA_SCALE;
                        view.update(|v| v.zoom_at(delta, anchor));
                    }
                }

                pinch_dist.set(new_dist);
            }
        }
    };

    // Switching overlays drops the old overlay's highlight.
    Effect::new(move |prev: Option<RendererKind>| {
        let kind = renderer.get();
        if prev.is_some_and(|p| p != kind) {
            clear_hover(hover);
        }
        kind
    });

    view! {
        <div
            node_ref=container_ref
            style="position: absolute; inset: 0; overflow: hidden; touch-action: none; cursor: grab; background: #dde3e6;"
            on:wheel=on_wheel
            on:dblclick=on_dblclick
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointercancel=on_pointer_cancel
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <TilePane />
            {move || match renderer.get() {
                RendererKind::Svg => view! { <SvgLayer /> }.into_any(),
                RendererKind::Canvas => view! { <CanvasLayer /> }.into_any(),
            }}
        </div>
    }
}
