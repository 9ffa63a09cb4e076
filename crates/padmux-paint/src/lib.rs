//! Overlay layout: per-style component rectangles and the deduplicated
//! appearance cache.
//!
//! Drawing itself is platform glue; this crate computes *where* everything
//! goes. Each overlay has component rectangles (index 0 = the whole
//! window, 1..=N = item rectangles) recomputed when the target size, UI
//! scale, or any of the menu's appearance/layout/position indices change.

mod appearance;
mod layout;

pub use appearance::{
    Alignment, AppearanceCache, MenuAppearance, MenuLayout, MenuPosition, PaintStyle,
    WindowAlphaInfo,
};
pub use layout::{LayoutKey, OverlayLayout, compute_overlay_layout};
