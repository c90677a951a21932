use std::cell::RefCell;

use geoverlay_shared::kurbo::{Point, Size};
use geoverlay_shared::{
    Feature, FeatureCollection, HighlightState, MapConfig, RendererKind, ViewState,
};
use gloo_storage::Storage;
use leptos::prelude::*;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::controller::MapView;
use crate::data::{self, LoadStatus};

const SETTINGS_KEY: &str = "geoverlay_settings";

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// Decoded config overrides from the page query string, in key order.
fn page_overrides() -> Vec<(String, String)> {
    let Some(search) = web_sys::window().and_then(|w| w.location().search().ok()) else {
        return Vec::new();
    };
    let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search) else {
        return Vec::new();
    };
    MapConfig::OVERRIDE_KEYS
        .iter()
        .filter_map(|key| params.get(key).map(|v| (key.to_string(), v)))
        .collect()
}

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Newtype wrappers so same-typed signals stay distinct in Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct Features(pub RwSignal<FeatureCollection>);
#[derive(Clone, Copy)]
pub(crate) struct Hover(pub RwSignal<HighlightState>);
/// Pointer offset of an in-flight drag; `None` when the view is at rest.
#[derive(Clone, Copy)]
pub(crate) struct DragOffset(pub RwSignal<Option<(f64, f64)>>);
#[derive(Clone, Copy)]
pub(crate) struct ActiveRenderer(pub RwSignal<RendererKind>);

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(default)]
struct Settings {
    renderer: Option<RendererKind>,
}

/// Defaults, then saved settings, then the page query string.
fn startup_config(saved: &Settings, overrides: &[(String, String)]) -> MapConfig {
    let mut config = MapConfig::default();
    if let Some(renderer) = saved.renderer {
        config.renderer = renderer;
    }
    for err in config.apply_overrides(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        web_sys::console::warn_1(&format!("ignoring query override: {err}").into());
    }
    config
}

/// Text shown for a feature: its document id when it has one, else its
/// position in the collection.
fn feature_label(feature: &Feature) -> String {
    let id = match &feature.source_id {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => feature.id.to_string(),
    };
    match feature.name() {
        Some(name) => format!("{id} ({name})"),
        None => id,
    }
}

fn hover_label(features: &FeatureCollection, highlight: &HighlightState) -> String {
    match highlight.target().and_then(|id| features.get(id)) {
        Some(feature) => format!("Hovered: {}", feature_label(feature)),
        None => "Hovered: none".to_string(),
    }
}

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let config = startup_config(&saved, &page_overrides());

    let (w, h) = canvas_dimensions();
    let view = RwSignal::new(ViewState::new(
        config.center,
        config.zoom,
        Size::new(w, h),
        config.zoom_range,
    ));
    let features = RwSignal::new(FeatureCollection::default());
    let hover = RwSignal::new(HighlightState::None);
    let drag: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);
    let renderer = RwSignal::new(config.renderer);
    let status = RwSignal::new(LoadStatus::Loading);
    let attribution = config.tiles.attribution.clone();
    let data_url = config.data_url.clone();
    let fit = config.fit_to_data;
    let config = StoredValue::new(config);

    provide_context(view);
    provide_context(config);
    provide_context(Features(features));
    provide_context(Hover(hover));
    provide_context(DragOffset(drag));
    provide_context(ActiveRenderer(renderer));

    data::load_features(data_url, features, status, view, fit);

    // Persist settings on change
    Effect::new(move || {
        let settings = Settings {
            renderer: Some(renderer.get()),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    // Window resize keeps the container size in the view
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler = Closure::<dyn Fn()>::new(move || {
            let (w, h) = canvas_dimensions();
            view.update(|v| v.resize(Size::new(w, h)));
        });
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    let zoom_by = move |step: i32| {
        view.update(|v| {
            let size = v.size();
            let center = Point::new(size.width / 2.0, size.height / 2.0);
            if step > 0 {
                v.zoom_in_at(center);
            } else {
                v.zoom_out_at(center);
            }
        });
    };

    let button_style = "width: 30px; height: 30px; border: 1px solid #888; background: #fff; cursor: pointer; font: 16px sans-serif;";

    view! {
        <div style="position: fixed; inset: 0; font-family: sans-serif;">
            <MapView />
            <div style="position: absolute; top: 10px; left: 10px; display: flex; flex-direction: column; gap: 4px;">
                <button style=button_style on:click=move |_| zoom_by(1)>"+"</button>
                <button style=button_style on:click=move |_| zoom_by(-1)>"−"</button>
            </div>
            <div style="position: absolute; top: 10px; right: 10px; padding: 6px 10px; background: rgba(255,255,255,0.9); border: 1px solid #888; font-size: 13px; display: flex; flex-direction: column; gap: 4px; min-width: 180px;">
                <div>
                    {move || features.with(|fc| hover.with(|h| hover_label(fc, h)))}
                </div>
                <div style="color: #555;">{move || status.with(LoadStatus::summary)}</div>
                <button
                    style="cursor: pointer;"
                    on:click=move |_| renderer.update(|r| *r = r.toggled())
                >
                    {move || format!("Renderer: {} (switch)", renderer.get())}
                </button>
            </div>
            {move || {
                status.with(|s| match s {
                    LoadStatus::Failed(msg) => {
                        let msg = format!("Could not load map data: {msg}");
                        view! {
                            <div style="position: absolute; bottom: 28px; left: 50%; transform: translateX(-50%); padding: 8px 14px; background: #b3261e; color: #fff; border-radius: 4px; font-size: 13px;">
                                {msg}
                            </div>
                        }
                            .into_any()
                    }
                    _ => ().into_any(),
                })
            }}
            <div style="position: absolute; bottom: 0; right: 0; padding: 2px 6px; background: rgba(255,255,255,0.8); font-size: 11px;">
                {attribution}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use geoverlay_shared::{FeatureId, HitOrder, demo_collection};
    use serde_json::json;

    use super::*;

    #[test]
    fn saved_renderer_then_query_wins() {
        let saved = Settings {
            renderer: Some(RendererKind::Svg),
        };
        let pairs = |items: &[(&str, &str)]| -> Vec<(String, String)> {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        assert_eq!(startup_config(&saved, &[]).renderer, RendererKind::Svg);
        assert_eq!(
            startup_config(&saved, &pairs(&[("renderer", "canvas"), ("hit", "first")])).renderer,
            RendererKind::Canvas
        );
        assert_eq!(
            startup_config(&Settings::default(), &pairs(&[("hit", "first")])).hit_order,
            HitOrder::FirstInLoadOrder
        );
        // A bad value is skipped; the saved renderer survives it.
        let config = startup_config(&saved, &pairs(&[("renderer", "webgl"), ("zoom", "6")]));
        assert_eq!(config.renderer, RendererKind::Svg);
        assert_eq!(config.zoom, 6.0);
    }

    #[test]
    fn hover_label_prefers_document_ids() {
        let features = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": "FR", "properties": { "name": "France" }, "geometry": null },
                { "type": "Feature", "id": 7, "properties": {}, "geometry": null },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        }))
        .unwrap();

        assert_eq!(
            hover_label(&features, &HighlightState::Hovering(FeatureId(0))),
            "Hovered: FR (France)"
        );
        assert_eq!(
            hover_label(&features, &HighlightState::Hovering(FeatureId(1))),
            "Hovered: 7"
        );
        assert_eq!(
            hover_label(&features, &HighlightState::Hovering(FeatureId(2))),
            "Hovered: 2"
        );
        assert_eq!(hover_label(&features, &HighlightState::None), "Hovered: none");
    }

    #[test]
    fn demo_features_have_labels() {
        let features = demo_collection();
        for feature in &features {
            assert!(feature_label(feature).contains('('));
        }
    }
}
