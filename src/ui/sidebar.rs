//! Category sidebar and floor tab strip

use macroquad::prelude::*;

use super::{theme, Rect, UiContext};
use crate::categories::{canonical_category, VisibilityStore};
use crate::model::{LevelData, RoutesData};

/// What the user did in the sidebar this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    ToggleCategory(String),
    ShowAll,
    HideAll,
}

/// Draw the sidebar: Show/Hide All buttons, one header per main category with
/// its subcategory rows (count bubbles), then the route categories. Returns
/// at most one action per frame.
pub fn draw_sidebar(
    ctx: &mut UiContext,
    rect: Rect,
    level: Option<&LevelData>,
    routes: &RoutesData,
    visibility: &VisibilityStore,
) -> Option<SidebarAction> {
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, theme::SIDEBAR_BG);
    if ctx.mouse.inside(&rect) {
        let id = ctx.next_id();
        ctx.set_hot(id);
    }

    let mut action = None;
    let (buttons, list) = rect.split_top(theme::ROW_HEIGHT + 8.0);

    // Show All / Hide All
    let (show_btn, hide_btn) = buttons.pad(4.0).split_left(buttons.w / 2.0 - 4.0);
    if draw_text_button(ctx, show_btn, "Show All") {
        action = Some(SidebarAction::ShowAll);
    }
    if draw_text_button(ctx, hide_btn, "Hide All") {
        action = Some(SidebarAction::HideAll);
    }

    let mut row = 0usize;
    let mut draw_header = |title: &str, row: &mut usize| {
        let r = list.row(*row, theme::ROW_HEIGHT);
        draw_rectangle(r.x, r.y, r.w, r.h, theme::HEADER_BG);
        draw_text(
            title,
            r.x + 8.0,
            r.y + r.h * 0.5 + theme::FONT_SIZE_HEADER * 0.35,
            theme::FONT_SIZE_HEADER,
            theme::TEXT_COLOR,
        );
        *row += 1;
    };

    if let Some(level) = level {
        for (main_category, categories) in level {
            draw_header(main_category, &mut row);
            for (sub_category, locations) in categories {
                let r = list.row(row, theme::ROW_HEIGHT);
                row += 1;
                if r.bottom() > rect.bottom() {
                    continue;
                }
                if draw_category_row(ctx, r, sub_category, locations.len(), visibility) {
                    action = Some(SidebarAction::ToggleCategory(canonical_category(
                        sub_category,
                    )));
                }
            }
        }
    }

    if !routes.is_empty() {
        draw_header("Routes", &mut row);
        for (category, category_routes) in routes {
            let r = list.row(row, theme::ROW_HEIGHT);
            row += 1;
            if r.bottom() > rect.bottom() {
                continue;
            }
            if draw_category_row(ctx, r, category, category_routes.len(), visibility) {
                action = Some(SidebarAction::ToggleCategory(canonical_category(category)));
            }
        }
    }

    action
}

/// One toggleable category row with a count bubble. Returns true on click.
fn draw_category_row(
    ctx: &mut UiContext,
    rect: Rect,
    name: &str,
    count: usize,
    visibility: &VisibilityStore,
) -> bool {
    let visible = visibility.is_visible(name);
    let hovered = ctx.mouse.inside(&rect);
    if hovered {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, theme::ROW_HOVER);
    }

    // Visibility accent stripe on the left edge.
    let stripe = if visible { theme::ACCENT } else { theme::ROW_HIDDEN };
    draw_rectangle(rect.x, rect.y + 2.0, 3.0, rect.h - 4.0, stripe);

    let text_color = if visible { theme::TEXT_COLOR } else { theme::TEXT_DIM };
    draw_text(
        name,
        rect.x + 12.0,
        rect.y + rect.h * 0.5 + theme::FONT_SIZE_CONTENT * 0.35,
        theme::FONT_SIZE_CONTENT,
        text_color,
    );

    // Count bubble on the right.
    let label = count.to_string();
    let dims = measure_text(&label, None, theme::FONT_SIZE_SMALL as u16, 1.0);
    let bubble_w = dims.width + 10.0;
    let bubble = Rect::new(
        rect.right() - bubble_w - 6.0,
        rect.y + 4.0,
        bubble_w,
        rect.h - 8.0,
    );
    draw_rectangle(bubble.x, bubble.y, bubble.w, bubble.h, theme::BUBBLE_BG);
    draw_text(
        &label,
        bubble.x + 5.0,
        bubble.center_y() + theme::FONT_SIZE_SMALL * 0.35,
        theme::FONT_SIZE_SMALL,
        theme::TEXT_DIM,
    );

    ctx.mouse.clicked(&rect)
}

fn draw_text_button(ctx: &mut UiContext, rect: Rect, label: &str) -> bool {
    let hovered = ctx.mouse.inside(&rect);
    let bg = if hovered { theme::ROW_HOVER } else { theme::HEADER_BG };
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, bg);
    let dims = measure_text(label, None, theme::FONT_SIZE_CONTENT as u16, 1.0);
    draw_text(
        label,
        rect.center_x() - dims.width * 0.5,
        rect.center_y() + theme::FONT_SIZE_CONTENT * 0.35,
        theme::FONT_SIZE_CONTENT,
        theme::TEXT_COLOR,
    );
    ctx.mouse.clicked(&rect)
}

/// Draw the floor tab strip. Returns the clicked floor, if any. Tabs are
/// inert while a floor load is in flight.
pub fn draw_floor_tabs(
    ctx: &mut UiContext,
    rect: Rect,
    floors: &[&str],
    active: Option<&str>,
    loading: bool,
) -> Option<String> {
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, theme::HEADER_BG);
    if ctx.mouse.inside(&rect) {
        let id = ctx.next_id();
        ctx.set_hot(id);
    }

    let tab_w = rect.w / floors.len() as f32;
    let mut selected = None;

    for (i, floor) in floors.iter().enumerate() {
        let tab = Rect::new(rect.x + i as f32 * tab_w, rect.y, tab_w, rect.h);
        let is_active = active == Some(*floor);
        let hovered = ctx.mouse.inside(&tab) && !loading;

        if is_active {
            draw_rectangle(tab.x, tab.y, tab.w, tab.h, theme::SIDEBAR_BG);
            draw_rectangle(tab.x, tab.bottom() - 2.0, tab.w, 2.0, theme::ACCENT);
        } else if hovered {
            draw_rectangle(tab.x, tab.y, tab.w, tab.h, theme::ROW_HOVER);
        }

        // Short label: "1", "6.5", ...
        let label = crate::floor::floor_number(floor);
        let dims = measure_text(label, None, theme::FONT_SIZE_CONTENT as u16, 1.0);
        let color = if loading && !is_active {
            theme::TEXT_DIM
        } else {
            theme::TEXT_COLOR
        };
        draw_text(
            label,
            tab.center_x() - dims.width * 0.5,
            tab.center_y() + theme::FONT_SIZE_CONTENT * 0.35,
            theme::FONT_SIZE_CONTENT,
            color,
        );

        if !loading && ctx.mouse.clicked(&tab) {
            selected = Some(floor.to_string());
        }
    }

    selected
}

/// Coordinate readout in the bottom-left corner. `flash` fades after a click.
pub fn draw_readout(view: Rect, plane_y: f32, plane_x: f32, flash: f32) {
    let text = format!("[{}, {}]", plane_y.round() as i64, plane_x.round() as i64);
    let raw = format!("{:.2}, {:.2}", plane_y, plane_x);
    let dims = measure_text(&text, None, theme::FONT_SIZE_CONTENT as u16, 1.0);
    let raw_dims = measure_text(&raw, None, theme::FONT_SIZE_SMALL as u16, 1.0);
    let w = dims.width.max(raw_dims.width) + 16.0;
    let h = 36.0;
    let rect = Rect::new(view.x + 10.0, view.bottom() - h - 10.0, w, h);

    let bg = if flash > 0.0 { theme::READOUT_FLASH } else { theme::READOUT_BG };
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, bg);
    draw_text(
        &raw,
        rect.x + 8.0,
        rect.y + 13.0,
        theme::FONT_SIZE_SMALL,
        theme::TEXT_DIM,
    );
    draw_text(
        &text,
        rect.x + 8.0,
        rect.y + 29.0,
        theme::FONT_SIZE_CONTENT,
        theme::TEXT_COLOR,
    );
}
