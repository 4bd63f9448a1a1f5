//! Immediate-mode UI for the atlas
//!
//! Rebuilt each frame, rectangle-based layout, macroquad rendering:
//! the category sidebar, floor tab strip, marker popup, and the
//! coordinate readout.

#![allow(dead_code)]

mod input;
mod popup;
mod rect;
mod sidebar;
mod theme;

pub use input::*;
pub use popup::*;
pub use rect::*;
pub use sidebar::*;
pub use theme::*;
