//! Viewport Controller - zoom/pan camera over the tile plane
//!
//! Maps between screen pixels and plane coordinates (both y-down, so no axis
//! flip anywhere). Zoom is discrete: bounded quarter-steps on a log2 scale.
//! The marker base size is derived from zoom and cached; zoom changes resize
//! existing icons and never rebuild marker lists or re-fetch tiles.

use crate::layout::PlaneBounds;
use crate::model::Point2;
use crate::ui::Rect;

pub const ZOOM_MIN: f32 = -4.0;
pub const ZOOM_MAX: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.25;

/// Marker base size bounds in pixels.
const MARKER_SIZE_MIN: f32 = 16.0;
const MARKER_SIZE_MAX: f32 = 128.0;

/// The zoomable/pannable camera over one floor's plane.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    /// Discrete zoom level; scale factor is `2^zoom`.
    zoom: f32,
    /// Plane point shown at the center of the view rect.
    pub center: Point2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 0.0,
            center: Point2::default(),
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Pixels per plane unit.
    pub fn scale(&self) -> f32 {
        2.0f32.powf(self.zoom)
    }

    /// Snap to the step grid and clamp to the zoom bounds.
    fn snap(zoom: f32) -> f32 {
        ((zoom / ZOOM_STEP).round() * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX)
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = Self::snap(zoom);
    }

    pub fn plane_to_screen(&self, p: Point2, view: Rect) -> (f32, f32) {
        let s = self.scale();
        (
            view.center_x() + (p.x - self.center.x) * s,
            view.center_y() + (p.y - self.center.y) * s,
        )
    }

    pub fn screen_to_plane(&self, sx: f32, sy: f32, view: Rect) -> Point2 {
        let s = self.scale();
        Point2::new(
            self.center.x + (sx - view.center_x()) / s,
            self.center.y + (sy - view.center_y()) / s,
        )
    }

    /// Step the zoom, keeping the plane point under `anchor` fixed on screen.
    pub fn zoom_steps(&mut self, steps: i32, anchor: (f32, f32), view: Rect) {
        let target = Self::snap(self.zoom + steps as f32 * ZOOM_STEP);
        if target == self.zoom {
            return;
        }
        let pivot = self.screen_to_plane(anchor.0, anchor.1, view);
        self.zoom = target;
        let s = self.scale();
        self.center = Point2::new(
            pivot.x - (anchor.0 - view.center_x()) / s,
            pivot.y - (anchor.1 - view.center_y()) / s,
        );
    }

    /// Drag the content by a screen-space delta (content follows the mouse).
    pub fn pan_by_screen(&mut self, dx: f32, dy: f32) {
        let s = self.scale();
        self.center.x -= dx / s;
        self.center.y -= dy / s;
    }

    /// Center on a floor's bounding box at the largest zoom step that fits.
    pub fn fit_bounds(&mut self, bounds: PlaneBounds, view: Rect) {
        if bounds.width <= 0.0 || bounds.height <= 0.0 || view.w <= 0.0 || view.h <= 0.0 {
            return;
        }
        self.center = Point2::new(bounds.width / 2.0, bounds.height / 2.0);
        let fit_scale = (view.w / bounds.width).min(view.h / bounds.height);
        let exact = fit_scale.log2();
        self.zoom = ((exact / ZOOM_STEP).floor() * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// Base marker size at the current zoom: 32px at zoom 0, clamped.
    pub fn marker_base_size(&self) -> f32 {
        (32.0 * self.scale()).clamp(MARKER_SIZE_MIN, MARKER_SIZE_MAX)
    }
}

/// Pixel size for one marker: the zoom-derived base scaled by the marker's
/// icon percentage.
pub fn scaled_marker_size(base: f32, scale_percent: f32) -> f32 {
    base * scale_percent / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn test_zoom_snaps_and_clamps() {
        let mut vp = Viewport::new();
        vp.set_zoom(0.3);
        assert_eq!(vp.zoom(), 0.25);
        vp.set_zoom(9.0);
        assert_eq!(vp.zoom(), ZOOM_MAX);
        vp.set_zoom(-7.5);
        assert_eq!(vp.zoom(), ZOOM_MIN);
    }

    #[test]
    fn test_screen_plane_round_trip() {
        let mut vp = Viewport::new();
        vp.set_zoom(-1.25);
        vp.center = Point2::new(1000.0, 700.0);
        let p = Point2::new(1234.0, 567.0);
        let (sx, sy) = vp.plane_to_screen(p, view());
        let back = vp.screen_to_plane(sx, sy, view());
        assert!((back.x - p.x).abs() < 1e-2);
        assert!((back.y - p.y).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::new();
        vp.center = Point2::new(500.0, 500.0);
        let anchor = (200.0, 150.0);
        let before = vp.screen_to_plane(anchor.0, anchor.1, view());
        vp.zoom_steps(2, anchor, view());
        let after = vp.screen_to_plane(anchor.0, anchor.1, view());
        assert!((before.x - after.x).abs() < 1e-2);
        assert!((before.y - after.y).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_steps_clamped_at_bounds() {
        let mut vp = Viewport::new();
        vp.set_zoom(ZOOM_MAX);
        let center_before = vp.center;
        vp.zoom_steps(1, (400.0, 300.0), view());
        assert_eq!(vp.zoom(), ZOOM_MAX);
        assert_eq!(vp.center, center_before);
    }

    #[test]
    fn test_fit_bounds_centers_and_fits() {
        let mut vp = Viewport::new();
        let bounds = PlaneBounds {
            width: 512.0,
            height: 512.0,
        };
        vp.fit_bounds(bounds, view());
        assert_eq!(vp.center, Point2::new(256.0, 256.0));
        // 600/512 ~ 1.17x fits; the largest quarter-step not above log2(1.17).
        assert_eq!(vp.zoom(), 0.0);
        // The whole box is inside the view at the chosen zoom.
        let (left, top) = vp.plane_to_screen(Point2::new(0.0, 0.0), view());
        let (right, bottom) = vp.plane_to_screen(Point2::new(512.0, 512.0), view());
        assert!(left >= 0.0 && top >= 0.0);
        assert!(right <= 800.0 && bottom <= 600.0);
    }

    #[test]
    fn test_marker_base_size_clamped() {
        let mut vp = Viewport::new();
        vp.set_zoom(0.0);
        assert_eq!(vp.marker_base_size(), 32.0);
        vp.set_zoom(ZOOM_MAX);
        assert_eq!(vp.marker_base_size(), 128.0);
        vp.set_zoom(ZOOM_MIN);
        assert_eq!(vp.marker_base_size(), 16.0);
    }

    #[test]
    fn test_scaled_marker_size() {
        assert_eq!(scaled_marker_size(32.0, 100.0), 32.0);
        assert_eq!(scaled_marker_size(32.0, 250.0), 80.0);
    }

    #[test]
    fn test_pan_moves_content_with_mouse() {
        let mut vp = Viewport::new();
        vp.set_zoom(1.0); // scale 2
        vp.center = Point2::new(100.0, 100.0);
        vp.pan_by_screen(20.0, -10.0);
        assert_eq!(vp.center, Point2::new(90.0, 105.0));
    }
}
