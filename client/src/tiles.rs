#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use geoverlay_shared::kurbo::Rect;
use geoverlay_shared::{MapConfig, PlacedTile, ViewState};
use leptos::prelude::*;

use crate::app::DragOffset;
use crate::controller::drag_transform;

fn tile_style(rect: &Rect) -> String {
    format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; user-select: none; -webkit-user-drag: none;",
        rect.x0,
        rect.y0,
        rect.width(),
        rect.height()
    )
}

/// Base map: one `<img>` per visible raster tile. Purely visual; pointer
/// events pass through to the overlay.
#[component]
pub fn TilePane() -> impl IntoView {
    let view: RwSignal<ViewState> = expect_context();
    let DragOffset(drag) = expect_context();
    let config: StoredValue<MapConfig> = expect_context();

    let tiles = Memo::new(move |_| {
        config.with_value(|c| view.with(|v| c.tiles.visible_tiles(v)))
    });

    view! {
        <div style=move || {
            format!(
                "position: absolute; inset: 0; pointer-events: none; transform-origin: 0px 0px; transform: {};",
                drag_transform(drag.get())
            )
        }>
            <For
                each=move || tiles.get()
                key=PlacedTile::key
                children=move |tile: PlacedTile| {
                    let style = tile_style(&tile.rect);
                    view! { <img src=tile.url alt="" draggable="false" style=style /> }
                }
            />
        </div>
    }
}
