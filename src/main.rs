//! DUNGEON ATLAS: an interactive atlas for the dungeon's floors
//!
//! A pannable/zoomable tiled map viewer: each floor's composite image is
//! streamed as 256px tiles from the CDN (cached locally), with categorized
//! location markers and smoothed route overlays drawn in the same plane.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod categories;
mod floor;
mod icons;
mod layout;
mod model;
mod overlay;
mod settings;
mod tiles;
mod ui;
mod viewport;

use macroquad::prelude::*;

use app::AtlasApp;
use settings::Settings;
use ui::UiContext;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Dungeon Atlas v{}", VERSION),
        window_width: 1440,
        window_height: 900,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Load a bundled data file, tolerating its absence (empty overlays).
async fn load_data_file(path: &str) -> Option<String> {
    match load_string(path).await {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("No data file {}: {}", path, e);
            None
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Crash logging first, before anything can panic.
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let locations = match load_data_file("assets/data/locations.json").await {
        Some(text) => match model::parse_locations(&text) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("{}", e);
                Default::default()
            }
        },
        None => Default::default(),
    };

    let routes = match load_data_file("assets/data/routes.json").await {
        Some(text) => match model::parse_routes(&text) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("{}", e);
                Default::default()
            }
        },
        None => Default::default(),
    };

    let mut app = AtlasApp::new(locations, routes, Settings::load());

    // Icon textures: the registry plus whatever the data references.
    let extra = app.referenced_icon_paths();
    app.icons.preload(extra).await;

    let mut ui_ctx = UiContext::new();

    loop {
        app.frame(&mut ui_ctx);

        #[cfg(not(target_arch = "wasm32"))]
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        next_frame().await;
    }

    app.cleanup();
}
