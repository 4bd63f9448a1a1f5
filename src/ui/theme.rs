//! UI Theme - Shared colors and styling constants
//!
//! Centralized look for the sidebar, floor tabs, popups and readout.

use macroquad::prelude::Color;

// =============================================================================
// Base UI Colors
// =============================================================================

/// Dark background behind the map while tiles load
pub const MAP_BG: Color = Color::new(0.05, 0.05, 0.07, 1.0);

/// Sidebar background
pub const SIDEBAR_BG: Color = Color::new(0.11, 0.11, 0.13, 1.0);

/// Section header background
pub const HEADER_BG: Color = Color::new(0.15, 0.15, 0.18, 1.0);

/// Primary text color
pub const TEXT_COLOR: Color = Color::new(0.8, 0.8, 0.85, 1.0);

/// Dimmed/secondary text
pub const TEXT_DIM: Color = Color::new(0.45, 0.45, 0.5, 1.0);

/// Row hover highlight
pub const ROW_HOVER: Color = Color::new(0.18, 0.18, 0.22, 1.0);

/// Visible-category accent
pub const ACCENT: Color = Color::new(0.0, 0.65, 0.85, 1.0);

/// Hidden-category row tint
pub const ROW_HIDDEN: Color = Color::new(0.3, 0.3, 0.32, 1.0);

/// Count bubble background
pub const BUBBLE_BG: Color = Color::new(0.22, 0.22, 0.27, 1.0);

/// Popup panel background
pub const POPUP_BG: Color = Color::new(0.09, 0.09, 0.12, 0.97);

/// Popup border
pub const POPUP_BORDER: Color = Color::new(0.35, 0.35, 0.4, 1.0);

/// Coordinate readout background
pub const READOUT_BG: Color = Color::new(0.0, 0.0, 0.0, 0.7);

/// Readout flash after a click
pub const READOUT_FLASH: Color = Color::new(0.0, 0.6, 0.2, 0.7);

// =============================================================================
// Font Sizes
// =============================================================================

/// Section header text size
pub const FONT_SIZE_HEADER: f32 = 15.0;

/// Standard row text size
pub const FONT_SIZE_CONTENT: f32 = 13.0;

/// Small/detail text size
pub const FONT_SIZE_SMALL: f32 = 11.0;

// =============================================================================
// Layout
// =============================================================================

/// Sidebar width in pixels
pub const SIDEBAR_WIDTH: f32 = 240.0;

/// Height of one category row
pub const ROW_HEIGHT: f32 = 24.0;

/// Height of the floor tab strip
pub const TAB_STRIP_HEIGHT: f32 = 30.0;
