#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::rc::Rc;

use geoverlay_shared::kurbo::{PathEl, Point, Size};
use geoverlay_shared::{
    CanvasRenderer, DrawSurface, FeatureCollection, MapConfig, PathBuilder, RenderPath, Rgba,
    StrokeStyle, ViewState, surface_transform,
};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent};

use crate::app::{DragOffset, Features, Hover};
use crate::controller::drag_transform;

pub(crate) fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .filter(|dpr| dpr.is_finite() && *dpr > 0.0)
        .unwrap_or(1.0)
}

/// Inline style of the overlay canvas. The hit tester reads this attribute
/// back, so every geometric property of the element is spelled out here.
pub(crate) fn canvas_style(css_size: Size, offset: Option<(f64, f64)>) -> String {
    format!(
        "position: absolute; left: 0px; top: 0px; width: {}px; height: {}px; transform-origin: 0px 0px; transform: {};",
        css_size.width,
        css_size.height,
        drag_transform(offset)
    )
}

fn backing_dimension(css: f64, pixel_ratio: f64) -> u32 {
    (css * pixel_ratio).round().max(1.0) as u32
}

/// 2D canvas as a draw surface. Paths arrive in backing pixels.
pub(crate) struct WebCanvas {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f64,
}

impl WebCanvas {
    pub(crate) fn new(canvas: HtmlCanvasElement, pixel_ratio: f64) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| format!("canvas context error: {e:?}"))?
            .ok_or_else(|| "2d context unavailable".to_string())?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "context is not a CanvasRenderingContext2d".to_string())?;
        Ok(Self {
            canvas,
            ctx,
            pixel_ratio,
        })
    }

    /// Match the backing buffer to a CSS size at the given ratio. Resizing
    /// wipes the buffer, so it only happens on an actual change.
    pub(crate) fn resize(&mut self, css_size: Size, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
        let w = backing_dimension(css_size.width, pixel_ratio);
        let h = backing_dimension(css_size.height, pixel_ratio);
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    fn trace(&self, path: &RenderPath) {
        let ctx = &self.ctx;
        ctx.begin_path();
        for el in path.commands() {
            match *el {
                PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
                PathEl::QuadTo(p1, p) => ctx.quadratic_curve_to(p1.x, p1.y, p.x, p.y),
                PathEl::CurveTo(p1, p2, p) => {
                    ctx.bezier_curve_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y)
                }
                PathEl::ClosePath => ctx.close_path(),
            }
        }
    }
}

impl DrawSurface for WebCanvas {
    fn backing_size(&self) -> Size {
        Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn clear(&mut self) {
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
        let size = self.backing_size();
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
    }

    fn stroke_path(&mut self, path: &RenderPath, style: &StrokeStyle) {
        self.ctx.set_stroke_style_str(&style.color.css());
        self.ctx.set_line_width(style.width);
        self.trace(path);
        self.ctx.stroke();
    }

    fn fill_path(&mut self, path: &RenderPath, color: Rgba) {
        self.ctx.set_fill_style_str(&color.css());
        self.trace(path);
        self.ctx.fill();
    }
}

type SharedRenderer = Rc<RefCell<Option<CanvasRenderer<WebCanvas>>>>;

/// Immediate-mode overlay: repaints on every data, view or highlight change
/// and hit-tests pointer moves against the regions of the last repaint.
#[component]
pub fn CanvasLayer() -> impl IntoView {
    let Features(features) = expect_context();
    let view: RwSignal<ViewState> = expect_context();
    let Hover(hover) = expect_context();
    let DragOffset(drag) = expect_context();
    let config: StoredValue<MapConfig> = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let renderer: SharedRenderer = Rc::new(RefCell::new(None));

    let renderer_draw = renderer.clone();
    Effect::new(move || {
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let v = view.get();
        let highlight = hover.get();
        let mut slot = renderer_draw.borrow_mut();
        if slot.is_none() {
            match WebCanvas::new(canvas, device_pixel_ratio()) {
                Ok(surface) => {
                    let (style, radius, order) =
                        config.with_value(|c| (c.style, c.point_radius, c.hit_order));
                    *slot = Some(CanvasRenderer::new(
                        surface,
                        style,
                        PathBuilder::new(radius),
                        order,
                    ));
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("canvas overlay disabled: {e}").into());
                    return;
                }
            }
        }
        let Some(r) = slot.as_mut() else {
            return;
        };
        r.surface_mut().resize(v.size(), device_pixel_ratio());
        features.with(|fc: &FeatureCollection| {
            r.redraw(fc, &v.projector(), &highlight);
        });
    });

    let renderer_hit = renderer;
    let on_pointer_move = move |e: PointerEvent| {
        if drag.get_untracked().is_some() {
            return;
        }
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        // Container-local: the canvas box itself moves with its CSS transform.
        let Some(rect) = canvas
            .parent_element()
            .map(|parent| parent.get_bounding_client_rect())
        else {
            return;
        };
        let point = Point::new(
            e.client_x() as f64 - rect.left(),
            e.client_y() as f64 - rect.top(),
        );
        let style = canvas.get_attribute("style").unwrap_or_default();
        let transform = match surface_transform(&style, canvas.width() as f64) {
            Ok(t) => t,
            Err(err) => {
                web_sys::console::warn_1(&format!("hit test skipped: {err}").into());
                return;
            }
        };
        let hit = renderer_hit
            .borrow()
            .as_ref()
            .and_then(|r| r.hit_test(point, &transform));
        let mut next = hover.get_untracked();
        if next.apply(hit) {
            hover.set(next);
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        let mut next = hover.get_untracked();
        if next.clear() {
            hover.set(next);
        }
    };

    view! {
        <canvas
            node_ref=canvas_ref
            style=move || canvas_style(view.with(ViewState::size), drag.get())
            on:pointermove=on_pointer_move
            on:pointerleave=on_pointer_leave
        />
    }
}
