//! Incremental spatial index over the hotspots: answers "which hotspot lies
//! in direction D from the cursor" and builds per-menu navigation graphs.
//!
//! All positions are mapped into a fixed normalized square so squared
//! distances fit in `u32`. Work is cooperative: state changes post tasks
//! into a priority bitset and [`HotspotMap::update`] runs one task step per
//! tick. The synchronous queries ([`next_hotspot_in_dir`],
//! [`menu_link_node`], [`edge_menu_item`]) force the prerequisite tasks to
//! completion before answering.
//!
//! [`next_hotspot_in_dir`]: HotspotMap::next_hotspot_in_dir
//! [`menu_link_node`]: HotspotMap::menu_link_node
//! [`edge_menu_item`]: HotspotMap::edge_menu_item

mod links;
mod search;

pub use links::HotspotLinkNode;
pub use search::{HotspotMap, MAX_PERP_FOR_STRAIGHT, MIN_JUMP_DIST};
