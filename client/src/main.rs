mod app;
mod canvas;
mod controller;
mod data;
mod svg;
mod tiles;

use wasm_bindgen::JsCast;

/// Element id the host page reserves for the map.
const MAP_ELEMENT_ID: &str = "map";

/// The host page's map element, or `<body>` when the page has none.
fn mount_target() -> Option<web_sys::HtmlElement> {
    let document = web_sys::window()?.document()?;
    document
        .get_element_by_id(MAP_ELEMENT_ID)
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body())
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(target) = mount_target() else {
        web_sys::console::warn_1(&"no document to mount the map into".into());
        return;
    };
    // The map lives as long as the page.
    leptos::mount::mount_to(target, app::App).forget();
}
