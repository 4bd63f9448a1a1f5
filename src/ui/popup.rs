//! Marker popup panel
//!
//! Structured popup content derived from a marker's location; the drawing
//! side wraps text to the panel width. Content building is pure so it can be
//! tested without a window.

use macroquad::prelude::*;

use super::{theme, Rect, UiContext};
use crate::overlay::Marker;

/// One line of popup body text, optionally styled.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupLine {
    Heading(String),
    Body(String),
    Emphasis(String),
}

/// Popup content for one clicked marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub lines: Vec<PopupLine>,
}

impl PopupContent {
    /// Build popup content from a marker: title, rune words, description,
    /// codex upgrade (runes only), the matching container entry, and
    /// requirements.
    pub fn from_marker(marker: &Marker) -> Self {
        let loc = &marker.location;
        let mut lines = Vec::new();

        if let Some(words) = &loc.words {
            lines.push(PopupLine::Emphasis(words.clone()));
        }

        lines.push(PopupLine::Heading("Description".to_string()));
        lines.push(PopupLine::Body(loc.description.clone()));

        // Runes carry words; only they show the codex upgrade.
        if let (Some(codex), Some(_)) = (&loc.codex_upgrade, &loc.words) {
            lines.push(PopupLine::Heading("Codex Upgrade".to_string()));
            lines.push(PopupLine::Body(codex.clone()));
        }

        if let Some(index) = marker.container_index {
            if let Some(container) = loc.container_at(index) {
                lines.push(PopupLine::Heading("Container".to_string()));
                lines.push(PopupLine::Body(container.to_string()));
            }
        }

        if let Some(requirements) = &loc.requirements {
            lines.push(PopupLine::Heading("Requirements".to_string()));
            lines.push(PopupLine::Body(requirements.clone()));
        }

        Self {
            title: loc.title.clone(),
            lines,
        }
    }
}

/// Greedy word wrap to a character limit per line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

const POPUP_WIDTH: f32 = 260.0;
const POPUP_WRAP_CHARS: usize = 38;
const LINE_HEIGHT: f32 = 16.0;

/// Draw the popup near its anchor, clamped into the view. Returns true when
/// the popup should close (click anywhere outside it).
pub fn draw_popup(ctx: &mut UiContext, view: Rect, anchor: (f32, f32), content: &PopupContent) -> bool {
    // Pre-wrap to know the height.
    let mut wrapped: Vec<(f32, String)> = Vec::new();
    let mut y = 30.0;
    for line in &content.lines {
        match line {
            PopupLine::Heading(text) => {
                y += 6.0;
                wrapped.push((y, text.clone()));
                y += LINE_HEIGHT;
            }
            PopupLine::Body(text) | PopupLine::Emphasis(text) => {
                for part in wrap_text(text, POPUP_WRAP_CHARS) {
                    wrapped.push((y, part));
                    y += LINE_HEIGHT;
                }
            }
        }
    }
    let height = y + 8.0;

    let x = (anchor.0 + 12.0).min(view.right() - POPUP_WIDTH - 4.0).max(view.x + 4.0);
    let top = (anchor.1 - height - 12.0).max(view.y + 4.0);
    let rect = Rect::new(x, top, POPUP_WIDTH, height);

    if ctx.mouse.inside(&rect) {
        let id = ctx.next_id();
        ctx.set_hot(id);
    }

    draw_rectangle(rect.x, rect.y, rect.w, rect.h, theme::POPUP_BG);
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, theme::POPUP_BORDER);
    draw_text(
        &content.title,
        rect.x + 8.0,
        rect.y + 18.0,
        theme::FONT_SIZE_HEADER,
        theme::TEXT_COLOR,
    );

    // Re-walk lines so headings and bodies get their own styling.
    let mut index = 0usize;
    for line in &content.lines {
        match line {
            PopupLine::Heading(_) => {
                let (line_y, text) = &wrapped[index];
                index += 1;
                draw_text(
                    text,
                    rect.x + 8.0,
                    rect.y + line_y + 10.0,
                    theme::FONT_SIZE_CONTENT,
                    theme::ACCENT,
                );
            }
            PopupLine::Body(text) => {
                for _ in wrap_text(text, POPUP_WRAP_CHARS) {
                    let (line_y, part) = &wrapped[index];
                    index += 1;
                    draw_text(
                        part,
                        rect.x + 8.0,
                        rect.y + line_y + 10.0,
                        theme::FONT_SIZE_SMALL,
                        theme::TEXT_COLOR,
                    );
                }
            }
            PopupLine::Emphasis(text) => {
                for _ in wrap_text(text, POPUP_WRAP_CHARS) {
                    let (line_y, part) = &wrapped[index];
                    index += 1;
                    draw_text(
                        part,
                        rect.x + 8.0,
                        rect.y + line_y + 10.0,
                        theme::FONT_SIZE_SMALL,
                        theme::TEXT_DIM,
                    );
                }
            }
        }
    }

    ctx.mouse.left_pressed && !ctx.mouse.inside(&rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::VisibilityStore;
    use crate::model::parse_locations;
    use crate::overlay::build_markers;

    fn markers() -> Vec<Marker> {
        let data = parse_locations(
            r#"{"Level 1": {"Runes": {"first circle": [
                {"id": 1, "title": "Knock", "description": "An unlocking rune",
                 "coordinates": [0, 0], "words": "Ex Por",
                 "codex_upgrade": "Opens reinforced doors"}
            ]},
            "Loot": {"chests": [
                {"id": 2, "title": "Twin chests", "description": "Paired stashes",
                 "coordinates": [[1, 1], [2, 2]],
                 "container": ["north nook", "south nook"],
                 "requirements": "Lockpicking 80"}
            ]}}}"#,
        )
        .unwrap();
        build_markers("Level 1", &data, &VisibilityStore::new())
    }

    #[test]
    fn test_rune_popup_has_words_and_codex() {
        let markers = markers();
        let rune = markers.iter().find(|m| m.location.title == "Knock").unwrap();
        let content = PopupContent::from_marker(rune);
        assert_eq!(content.title, "Knock");
        assert!(content.lines.contains(&PopupLine::Emphasis("Ex Por".into())));
        assert!(content
            .lines
            .contains(&PopupLine::Heading("Codex Upgrade".into())));
    }

    #[test]
    fn test_container_line_matches_marker_instance() {
        let markers = markers();
        let second = markers
            .iter()
            .find(|m| m.container_index == Some(1))
            .unwrap();
        let content = PopupContent::from_marker(second);
        assert!(content.lines.contains(&PopupLine::Body("south nook".into())));
        assert!(!content.lines.contains(&PopupLine::Body("north nook".into())));
        assert!(content
            .lines
            .contains(&PopupLine::Heading("Requirements".into())));
    }

    #[test]
    fn test_no_codex_without_words() {
        let markers = markers();
        let chest = markers
            .iter()
            .find(|m| m.location.title == "Twin chests")
            .unwrap();
        let content = PopupContent::from_marker(chest);
        assert!(!content
            .lines
            .iter()
            .any(|l| matches!(l, PopupLine::Heading(h) if h == "Codex Upgrade")));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert!(wrap_text("", 10).is_empty());
    }
}
