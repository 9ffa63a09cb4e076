//! Dense `u16` identifiers for the entities owned by the input map.
//!
//! Cross-references between subsystems are stored as these indices rather
//! than references so that backing vectors can grow freely and bitset
//! operations can assume contiguous IDs. Index 0 is reserved where noted.

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u16);

        impl $name {
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[must_use]
            pub fn from_index(idx: usize) -> Self {
                Self(idx as u16)
            }
        }
    };
}

id_type!(
    /// A hotspot. ID 0 is the reserved "none" hotspot.
    HotspotId
);
id_type!(
    /// A hotspot array (contiguous block of hotspots sharing an anchor).
    ArrayId
);
id_type!(
    /// A named key bind.
    KeyBindId
);
id_type!(
    /// A key-bind cycle.
    CycleId
);
id_type!(
    /// A controls layer. ID 0 is the base scheme and cannot be removed.
    LayerId
);
id_type!(
    /// A menu (root or sub-menu).
    MenuId
);
id_type!(
    /// An overlay window; equals the index of its root menu in load order.
    OverlayId
);
id_type!(
    /// An interned command string (chat macros, VK sequences).
    StringId
);
id_type!(
    /// A profile variable.
    VariableId
);

/// The reserved "no hotspot" ID.
pub const HOTSPOT_NONE: HotspotId = HotspotId(0);
/// Tracks the most recent synthetic cursor position.
pub const HOTSPOT_LAST_CURSOR_POS: HotspotId = HotspotId(1);
/// Where the cursor was when mouse-look mode began.
pub const HOTSPOT_MOUSE_LOOK_START: HotspotId = HotspotId(2);
/// Parking position used while the cursor is hidden.
pub const HOTSPOT_MOUSE_HIDDEN: HotspotId = HotspotId(3);
/// First index available to profile-declared hotspots.
pub const FIRST_USER_HOTSPOT: usize = 4;
