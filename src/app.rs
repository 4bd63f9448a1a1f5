//! Application state and frame wiring
//!
//! Owns every subsystem - floor layers, viewport, overlays, visibility,
//! settings - and runs one frame: input, load polling, map drawing, UI.
//! Overlay rebuilds always regenerate markers AND routes together; a toggle
//! that updated one but not the other would desynchronize the view.

use macroquad::prelude::*;

use crate::categories::VisibilityStore;
use crate::floor::{FloorLayers, SelectOutcome, FLOORS};
use crate::icons::IconLibrary;
use crate::layout::TILE_OVERLAP;
use crate::model::{LocationsData, Point2, RoutesData};
use crate::overlay::{build_markers, build_routes, Marker, MarkerIcon, RouteOverlay};
use crate::settings::Settings;
use crate::tiles::TileStore;
use crate::ui::{self, MouseState, PopupContent, Rect, SidebarAction, UiContext};
use crate::viewport::{scaled_marker_size, Viewport};

/// Screen-space drag distance below which a press counts as a click.
const CLICK_DRAG_THRESHOLD: f32 = 4.0;

/// Route line thickness in pixels.
const ROUTE_THICKNESS: f32 = 3.0;

struct DragState {
    last: (f32, f32),
    travelled: f32,
}

pub struct AtlasApp {
    locations: LocationsData,
    routes: RoutesData,
    visibility: VisibilityStore,
    floors: FloorLayers,
    viewport: Viewport,
    pub icons: IconLibrary,

    markers: Vec<Marker>,
    route_overlay: RouteOverlay,

    popup: Option<(PopupContent, (f32, f32))>,
    readout_plane: Point2,
    readout_flash: f32,
    drag: Option<DragState>,
}

impl AtlasApp {
    /// Build the app from loaded data and persisted settings, and kick off
    /// the first floor load.
    pub fn new(locations: LocationsData, routes: RoutesData, settings: Settings) -> Self {
        let mut app = Self {
            locations,
            routes,
            visibility: VisibilityStore::from_hidden(settings.hidden_categories),
            floors: FloorLayers::new(TileStore::new()),
            viewport: Viewport::new(),
            icons: IconLibrary::new(),
            markers: Vec::new(),
            route_overlay: RouteOverlay::default(),
            popup: None,
            readout_plane: Point2::default(),
            readout_flash: 0.0,
            drag: None,
        };
        let floor = if FLOORS.contains(&settings.last_floor.as_str()) {
            settings.last_floor
        } else {
            FLOORS[0].to_string()
        };
        app.select_floor(&floor);
        app
    }

    /// Icon paths referenced by the location data (for texture preloading).
    pub fn referenced_icon_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for level in self.locations.values() {
            for categories in level.values() {
                for locations in categories.values() {
                    for loc in locations {
                        if let Some(icon) = &loc.icon {
                            if !paths.contains(icon) {
                                paths.push(icon.clone());
                            }
                        }
                    }
                }
            }
        }
        paths
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering surface (the operations the shell drives)
    // ─────────────────────────────────────────────────────────────────────

    pub fn select_floor(&mut self, floor: &str) {
        match self.floors.select(floor) {
            SelectOutcome::Attached => self.on_floor_attached(),
            SelectOutcome::Loading | SelectOutcome::Busy | SelectOutcome::NoChange => {}
        }
    }

    pub fn toggle_category(&mut self, name: &str) {
        self.visibility.toggle(name);
        self.rebuild_overlays();
        self.save_settings();
    }

    pub fn show_all_categories(&mut self) {
        self.visibility.show_all();
        self.rebuild_overlays();
        self.save_settings();
    }

    pub fn hide_all_categories(&mut self) {
        let known = self.known_categories();
        self.visibility.hide_all(known);
        self.rebuild_overlays();
        self.save_settings();
    }

    #[allow(dead_code)]
    pub fn is_category_visible(&self, name: &str) -> bool {
        self.visibility.is_visible(name)
    }

    /// Release layers and overlays and persist settings.
    pub fn cleanup(&mut self) {
        self.save_settings();
        self.markers.clear();
        self.route_overlay = RouteOverlay::default();
        self.popup = None;
        self.floors = FloorLayers::new(TileStore::new());
    }

    /// Union of location subcategories across all floors plus route
    /// categories - the namespace `hide_all` operates on.
    fn known_categories(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for level in self.locations.values() {
            for categories in level.values() {
                for sub in categories.keys() {
                    if !names.contains(sub) {
                        names.push(sub.clone());
                    }
                }
            }
        }
        for category in self.routes.keys() {
            if !names.contains(category) {
                names.push(category.clone());
            }
        }
        names
    }

    fn save_settings(&self) {
        let settings = Settings {
            last_floor: self
                .floors
                .active_floor()
                .unwrap_or(FLOORS[0])
                .to_string(),
            hidden_categories: self.visibility.hidden_names(),
        };
        settings.save();
    }

    /// Markers and routes are always rebuilt together.
    fn rebuild_overlays(&mut self) {
        let Some(floor) = self.floors.active_floor() else {
            self.markers.clear();
            self.route_overlay = RouteOverlay::default();
            return;
        };
        self.markers = build_markers(floor, &self.locations, &self.visibility);
        self.route_overlay = build_routes(floor, &self.routes, &self.locations, &self.visibility);
        self.popup = None;
    }

    fn on_floor_attached(&mut self) {
        if let Some(layer) = self.floors.active_layer() {
            let view = self.map_view();
            self.viewport.fit_bounds(layer.layout.bounds, view);
        }
        self.rebuild_overlays();
        self.save_settings();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame
    // ─────────────────────────────────────────────────────────────────────

    fn map_view(&self) -> Rect {
        let screen = Rect::screen(screen_width(), screen_height());
        let (_, rest) = screen.split_left(ui::SIDEBAR_WIDTH);
        let (_, map) = rest.split_top(ui::TAB_STRIP_HEIGHT);
        map
    }

    /// One frame: input, polling, map, UI.
    pub fn frame(&mut self, ctx: &mut UiContext) {
        let screen = Rect::screen(screen_width(), screen_height());
        let (sidebar_rect, rest) = screen.split_left(ui::SIDEBAR_WIDTH);
        let (tabs_rect, map_view) = rest.split_top(ui::TAB_STRIP_HEIGHT);

        ctx.begin_frame(MouseState::sample());
        self.readout_flash = (self.readout_flash - get_frame_time()).max(0.0);

        // Finished loads attach their floor here.
        if self.floors.poll().is_some() {
            self.on_floor_attached();
        }

        self.handle_map_input(ctx, map_view);

        clear_background(ui::MAP_BG);
        self.draw_map(map_view);
        self.draw_route_overlay(map_view);
        self.draw_markers(map_view);

        // UI on top of the map.
        let level = self
            .floors
            .active_floor()
            .and_then(|f| self.locations.get(f));
        match ui::draw_sidebar(ctx, sidebar_rect, level, &self.routes, &self.visibility) {
            Some(SidebarAction::ToggleCategory(name)) => self.toggle_category(&name),
            Some(SidebarAction::ShowAll) => self.show_all_categories(),
            Some(SidebarAction::HideAll) => self.hide_all_categories(),
            None => {}
        }

        if let Some(floor) = ui::draw_floor_tabs(
            ctx,
            tabs_rect,
            FLOORS,
            self.floors.active_floor(),
            self.floors.is_loading(),
        ) {
            self.select_floor(&floor);
        }

        ui::draw_readout(
            map_view,
            self.readout_plane.y,
            self.readout_plane.x,
            self.readout_flash,
        );

        if let Some((content, anchor)) = self.popup.clone() {
            if ui::draw_popup(ctx, map_view, anchor, &content) {
                self.popup = None;
            }
        }

        if let Some((fraction, message)) = self.floors.progress() {
            draw_loading_bar(map_view, fraction, &message);
        }
    }

    /// Pan / zoom / click handling over the map area. The coordinate readout
    /// is display-only: clicks flash it, nothing touches the data model.
    fn handle_map_input(&mut self, ctx: &UiContext, map_view: Rect) {
        let mouse = ctx.mouse;
        let inside = mouse.inside(&map_view);

        if inside {
            self.readout_plane = self.viewport.screen_to_plane(mouse.x, mouse.y, map_view);

            if mouse.scroll != 0.0 {
                let steps = if mouse.scroll > 0.0 { 1 } else { -1 };
                self.viewport.zoom_steps(steps, (mouse.x, mouse.y), map_view);
            }
        }

        // Keyboard zoom at the view center.
        if is_key_pressed(KeyCode::Equal) || is_key_pressed(KeyCode::KpAdd) {
            self.viewport
                .zoom_steps(1, (map_view.center_x(), map_view.center_y()), map_view);
        }
        if is_key_pressed(KeyCode::Minus) || is_key_pressed(KeyCode::KpSubtract) {
            self.viewport
                .zoom_steps(-1, (map_view.center_x(), map_view.center_y()), map_view);
        }

        // Left-drag pans; a press-and-release under the threshold is a click.
        if mouse.left_pressed && inside {
            self.drag = Some(DragState {
                last: (mouse.x, mouse.y),
                travelled: 0.0,
            });
        }
        if let Some(drag) = &mut self.drag {
            if mouse.left_down {
                let dx = mouse.x - drag.last.0;
                let dy = mouse.y - drag.last.1;
                drag.travelled += dx.abs() + dy.abs();
                drag.last = (mouse.x, mouse.y);
                if drag.travelled > CLICK_DRAG_THRESHOLD {
                    self.viewport.pan_by_screen(dx, dy);
                }
            }
        }
        if mouse.left_released {
            let was_click = self
                .drag
                .take()
                .map(|d| d.travelled <= CLICK_DRAG_THRESHOLD)
                .unwrap_or(false);
            if was_click && inside {
                self.handle_map_click(mouse.x, mouse.y, map_view);
            }
        }
    }

    /// A click either opens the topmost marker under the cursor or flashes
    /// the coordinate readout.
    fn handle_map_click(&mut self, x: f32, y: f32, map_view: Rect) {
        let base = self.viewport.marker_base_size();
        let hit = self.markers.iter().rev().find(|marker| {
            let (mx, my) = self.viewport.plane_to_screen(marker.position, map_view);
            let half = scaled_marker_size(base, marker.scale_percent()) / 2.0;
            (x - mx).abs() <= half && (y - my).abs() <= half
        });

        match hit {
            Some(marker) => {
                let anchor = self.viewport.plane_to_screen(marker.position, map_view);
                self.popup = Some((PopupContent::from_marker(marker), anchor));
            }
            None => {
                self.popup = None;
                self.readout_flash = 0.25;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Map drawing
    // ─────────────────────────────────────────────────────────────────────

    fn draw_map(&self, map_view: Rect) {
        let Some(layer) = self.floors.active_layer() else {
            return;
        };

        scissor_push(map_view);

        let scale = self.viewport.scale();
        for placed in &layer.layout.tiles {
            let rect = placed.rect.inflate(TILE_OVERLAP);
            let (sx, sy) = self
                .viewport
                .plane_to_screen(Point2::new(rect.left, rect.top), map_view);
            let w = rect.width() * scale;
            let h = rect.height() * scale;
            if sx + w < map_view.x
                || sy + h < map_view.y
                || sx > map_view.right()
                || sy > map_view.bottom()
            {
                continue;
            }
            if let Some(texture) = layer.textures.get(&(placed.directory, placed.tile)) {
                draw_texture_ex(
                    texture,
                    sx,
                    sy,
                    WHITE,
                    DrawTextureParams {
                        dest_size: Some(vec2(w, h)),
                        ..Default::default()
                    },
                );
            }
        }

        scissor_pop();
    }

    fn draw_route_overlay(&self, map_view: Rect) {
        if self.route_overlay.paths.is_empty() && self.route_overlay.markers.is_empty() {
            return;
        }

        scissor_push(map_view);

        for path in &self.route_overlay.paths {
            let screen: Vec<(f32, f32)> = path
                .points
                .iter()
                .map(|p| self.viewport.plane_to_screen(*p, map_view))
                .collect();
            match &path.dash {
                Some(dash) => {
                    let dash_screen: Vec<f32> =
                        dash.iter().map(|d| d * self.viewport.scale()).collect();
                    draw_dashed_polyline(&screen, &dash_screen, ROUTE_THICKNESS, path.color);
                }
                None => {
                    for pair in screen.windows(2) {
                        draw_line(
                            pair[0].0,
                            pair[0].1,
                            pair[1].0,
                            pair[1].1,
                            ROUTE_THICKNESS,
                            path.color,
                        );
                    }
                }
            }
        }

        for marker in &self.route_overlay.markers {
            let (sx, sy) = self.viewport.plane_to_screen(marker.position, map_view);
            draw_circle(sx, sy, 5.0, WHITE);
            draw_circle(sx, sy, 3.5, ui::ACCENT);
            draw_text(&marker.label, sx + 8.0, sy - 6.0, ui::FONT_SIZE_SMALL, WHITE);
        }

        scissor_pop();
    }

    fn draw_markers(&self, map_view: Rect) {
        if self.markers.is_empty() {
            return;
        }

        scissor_push(map_view);

        let base = self.viewport.marker_base_size();
        for marker in &self.markers {
            let (sx, sy) = self.viewport.plane_to_screen(marker.position, map_view);
            let size = scaled_marker_size(base, marker.scale_percent());
            let half = size / 2.0;
            if sx + half < map_view.x
                || sy + half < map_view.y
                || sx - half > map_view.right()
                || sy - half > map_view.bottom()
            {
                continue;
            }

            match &marker.icon {
                MarkerIcon::Image { path, .. } => match self.icons.get(path) {
                    Some(texture) => draw_texture_ex(
                        texture,
                        sx - half,
                        sy - half,
                        WHITE,
                        DrawTextureParams {
                            dest_size: Some(vec2(size, size)),
                            ..Default::default()
                        },
                    ),
                    None => {
                        // Texture missing on disk: category square stands in.
                        let color = crate::icons::category_color(&marker.main_category);
                        draw_rectangle(sx - half, sy - half, size, size, color);
                    }
                },
                MarkerIcon::Square { color } => {
                    draw_rectangle(sx - half, sy - half, size, size, *color);
                }
            }
        }

        scissor_pop();
    }
}

/// Clip subsequent draws to a screen rect.
fn scissor_push(rect: Rect) {
    let dpi = screen_dpi_scale();
    gl_use_default_material();
    unsafe {
        get_internal_gl().quad_gl.scissor(Some((
            (rect.x * dpi) as i32,
            (rect.y * dpi) as i32,
            (rect.w * dpi) as i32,
            (rect.h * dpi) as i32,
        )));
    }
}

fn scissor_pop() {
    unsafe {
        get_internal_gl().quad_gl.scissor(None);
    }
}

/// Dashed polyline in screen space; the pattern alternates on/off lengths.
fn draw_dashed_polyline(points: &[(f32, f32)], dash: &[f32], thickness: f32, color: Color) {
    if dash.is_empty() {
        return;
    }
    let mut pattern_pos = 0.0f32;
    let total: f32 = dash.iter().sum::<f32>().max(1e-3);

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        if len < 1e-6 {
            continue;
        }
        let (dx, dy) = ((x1 - x0) / len, (y1 - y0) / len);

        let mut t = 0.0f32;
        while t < len {
            // Position inside the repeating pattern.
            let mut offset = (pattern_pos + t) % total;
            let mut on = true;
            let mut remaining = 0.0;
            for (i, d) in dash.iter().enumerate() {
                if offset < *d {
                    on = i % 2 == 0;
                    remaining = d - offset;
                    break;
                }
                offset -= d;
            }
            let run = remaining.min(len - t).max(0.5);
            if on {
                draw_line(
                    x0 + dx * t,
                    y0 + dy * t,
                    x0 + dx * (t + run),
                    y0 + dy * (t + run),
                    thickness,
                    color,
                );
            }
            t += run;
        }
        pattern_pos = (pattern_pos + len) % total;
    }
}

/// In-app loading bar while a floor's tiles stream in.
fn draw_loading_bar(map_view: Rect, fraction: f32, message: &str) {
    let w = (map_view.w * 0.5).min(420.0);
    let rect = Rect::new(
        map_view.center_x() - w / 2.0,
        map_view.bottom() - 64.0,
        w,
        26.0,
    );
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, ui::READOUT_BG);
    draw_rectangle(
        rect.x + 2.0,
        rect.y + 2.0,
        (rect.w - 4.0) * fraction.clamp(0.0, 1.0),
        rect.h - 4.0,
        ui::ACCENT,
    );
    let dims = measure_text(message, None, ui::FONT_SIZE_SMALL as u16, 1.0);
    draw_text(
        message,
        rect.center_x() - dims.width * 0.5,
        rect.y - 6.0,
        ui::FONT_SIZE_SMALL,
        ui::TEXT_COLOR,
    );
}
