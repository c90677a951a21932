#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use geoverlay_shared::{FeatureCollection, ViewState, demo_collection};
use leptos::prelude::*;

/// Padding in container pixels kept around the data when fitting the view.
const FIT_PADDING: f64 = 24.0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoadStatus {
    Loading,
    Loaded { features: usize, malformed: usize },
    Failed(String),
}

impl LoadStatus {
    /// One-line status for the HUD.
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Loading => "Loading data…".to_string(),
            Self::Loaded {
                features,
                malformed: 0,
            } => format!("{features} features"),
            Self::Loaded {
                features,
                malformed,
            } => format!("{features} features ({malformed} malformed)"),
            Self::Failed(msg) => format!("Failed to load data: {msg}"),
        }
    }
}

/// Fetch and decode a GeoJSON FeatureCollection. One attempt, no retry.
pub(crate) async fn fetch_collection(url: &str) -> Result<FeatureCollection, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| format!("read error: {e}"))?;
    FeatureCollection::from_json_str(&text).map_err(|e| format!("parse error: {e}"))
}

fn install(
    collection: FeatureCollection,
    features: RwSignal<FeatureCollection>,
    status: RwSignal<LoadStatus>,
    view: RwSignal<ViewState>,
    fit: bool,
) {
    let loaded = LoadStatus::Loaded {
        features: collection.len(),
        malformed: collection.malformed(),
    };
    web_sys::console::info_1(&format!("geojson: {}", loaded.summary()).into());
    if fit && let Some(bounds) = collection.bounds() {
        view.update(|v| v.fit_bounds(bounds, FIT_PADDING));
    }
    features.set(collection);
    status.set(loaded);
}

/// Populate `features` once: from `url` when given, otherwise from the
/// built-in demo collection.
pub(crate) fn load_features(
    url: Option<String>,
    features: RwSignal<FeatureCollection>,
    status: RwSignal<LoadStatus>,
    view: RwSignal<ViewState>,
    fit: bool,
) {
    let Some(url) = url else {
        install(demo_collection(), features, status, view, fit);
        return;
    };

    status.set(LoadStatus::Loading);
    wasm_bindgen_futures::spawn_local(async move {
        match fetch_collection(&url).await {
            Ok(collection) => install(collection, features, status, view, fit),
            Err(e) => {
                web_sys::console::warn_1(&format!("GeoJSON load from {url} failed: {e}").into());
                status.set(LoadStatus::Failed(e));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries() {
        assert_eq!(
            LoadStatus::Loaded {
                features: 3,
                malformed: 0
            }
            .summary(),
            "3 features"
        );
        assert_eq!(
            LoadStatus::Loaded {
                features: 3,
                malformed: 1
            }
            .summary(),
            "3 features (1 malformed)"
        );
        assert_eq!(
            LoadStatus::Failed("HTTP 404".into()).summary(),
            "Failed to load data: HTTP 404"
        );
    }
}
