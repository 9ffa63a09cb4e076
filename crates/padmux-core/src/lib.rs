//! Shared primitives for padmux: directions, integer geometry, anchored
//! coordinates, normalized-space math, bit sets, and dense entity IDs.

mod bitset;
mod coord;
mod dir;
mod geom;
mod ids;
mod norm;

pub use bitset::BitSet;
pub use coord::{Coord, Hotspot};
pub use dir::{Dir4, Dir8};
pub use geom::{Point, Rect, Size};
pub use ids::{
    ArrayId, CycleId, FIRST_USER_HOTSPOT, HOTSPOT_LAST_CURSOR_POS, HOTSPOT_MOUSE_HIDDEN,
    HOTSPOT_MOUSE_LOOK_START, HOTSPOT_NONE, HotspotId, KeyBindId, LayerId, MenuId, OverlayId,
    StringId, VariableId,
};
pub use norm::{GRID_CELL_SIZE, GRID_SHIFT, GRID_SIZE, NORMALIZED_MAX, denormalize, normalize};
