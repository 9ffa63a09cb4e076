//! Menu definitions: items, styles, and the sub-menu forest.
//!
//! Menus are declared as `Menu.Root.Sub` profile sections; the dots spell
//! the forest. Each menu caches its root, and the root's position among all
//! roots is its overlay ID.

use padmux_command::Command;
use padmux_core::{CycleId, HotspotId, MenuId, OverlayId};

/// How a menu arranges and navigates its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuStyle {
    /// Vertical list; up/down move, left/right push past the edge.
    #[default]
    List,
    /// Horizontal bar.
    Bar,
    /// Row-major grid with a fixed width.
    Grid,
    /// Column-major grid with a fixed height.
    Columns,
    /// Vertical rotation with persistent wrap.
    Slots,
    /// Items pinned to hotspots, navigated by the link map.
    Hotspots,
    /// Like `Hotspots` but only the selected item is drawn.
    Highlight,
    /// Four directional items around a hub.
    FourDir,
    /// Follows a key-bind cycle's last-used entry.
    KbCycleLast,
    /// Follows a key-bind cycle's default entry.
    KbCycleDefault,
    /// Always-visible status element.
    Hud,
    /// Full-target overlay marking every active hotspot.
    HotspotGuide,
    /// The system notice overlay.
    System,
}

impl MenuStyle {
    /// Parses a style name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<MenuStyle> {
        let style = match name.to_ascii_lowercase().as_str() {
            "list" => MenuStyle::List,
            "bar" => MenuStyle::Bar,
            "grid" => MenuStyle::Grid,
            "columns" => MenuStyle::Columns,
            "slots" => MenuStyle::Slots,
            "hotspots" => MenuStyle::Hotspots,
            "highlight" => MenuStyle::Highlight,
            "4dir" | "fourdir" => MenuStyle::FourDir,
            "kbcyclelast" => MenuStyle::KbCycleLast,
            "kbcycledefault" => MenuStyle::KbCycleDefault,
            "hud" => MenuStyle::Hud,
            "hotspotguide" => MenuStyle::HotspotGuide,
            "system" => MenuStyle::System,
            _ => return None,
        };
        Some(style)
    }

    /// Styles that may only appear on root menus.
    #[must_use]
    pub fn root_only(self) -> bool {
        matches!(
            self,
            MenuStyle::KbCycleLast | MenuStyle::KbCycleDefault | MenuStyle::Hud
        )
    }

    /// Styles that require a linked key-bind cycle.
    #[must_use]
    pub fn requires_cycle(self) -> bool {
        matches!(self, MenuStyle::KbCycleLast | MenuStyle::KbCycleDefault)
    }

    /// Styles navigated through the hotspot link map.
    #[must_use]
    pub fn uses_link_map(self) -> bool {
        matches!(self, MenuStyle::Hotspots | MenuStyle::Highlight)
    }
}

/// One selectable item.
#[derive(Debug, Clone, Default)]
pub struct MenuItem {
    pub label: String,
    pub alt_label: String,
    pub command: Command,
    pub hotspot: HotspotId,
}

impl MenuItem {
    /// True when the slot holds nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command.is_placeholder() && self.label.is_empty() && self.hotspot.0 == 0
    }
}

/// One menu (root or sub-menu).
#[derive(Debug, Clone, Default)]
pub struct Menu {
    /// Leaf name (last dotted segment).
    pub name: String,
    /// Full section name (`Menu.Root.Sub`).
    pub section: String,
    pub parent: Option<MenuId>,
    pub root: MenuId,
    pub overlay: OverlayId,
    pub style: MenuStyle,
    pub items: Vec<MenuItem>,
    /// Items for pushing past an edge in each direction.
    pub dir_items: [MenuItem; 4],
    pub auto_command: Command,
    pub back_command: Command,
    pub grid_width: u8,
    pub grid_height: u8,
    pub default_item: u16,
    pub cycle: Option<CycleId>,
    pub origin_hotspot: HotspotId,
    /// Set when any item hotspot changed since last consumed by the
    /// hotspot map's caches.
    pub hotspots_changed: bool,
}

impl Menu {
    /// Effective grid width for `Grid` (or height for `Columns`), derived
    /// from the item count when not configured.
    #[must_use]
    pub fn effective_grid_width(&self) -> usize {
        if self.grid_width > 0 {
            return usize::from(self.grid_width);
        }
        // Square-ish default.
        let n = self.items.len().max(1);
        (n as f64).sqrt().ceil() as usize
    }

    #[must_use]
    pub fn effective_grid_height(&self) -> usize {
        if self.grid_height > 0 {
            return usize::from(self.grid_height);
        }
        let w = self.effective_grid_width();
        self.items.len().max(1).div_ceil(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_names() {
        assert_eq!(MenuStyle::from_name("grid"), Some(MenuStyle::Grid));
        assert_eq!(MenuStyle::from_name("4Dir"), Some(MenuStyle::FourDir));
        assert_eq!(MenuStyle::from_name("fancy"), None);
    }

    #[test]
    fn test_root_only_styles() {
        assert!(MenuStyle::KbCycleLast.root_only());
        assert!(MenuStyle::Hud.root_only());
        assert!(!MenuStyle::List.root_only());
    }

    #[test]
    fn test_effective_grid_dimensions() {
        let mut menu = Menu {
            grid_width: 3,
            ..Menu::default()
        };
        menu.items.resize_with(7, MenuItem::default);
        assert_eq!(menu.effective_grid_width(), 3);
        assert_eq!(menu.effective_grid_height(), 3);
        menu.grid_width = 0;
        assert_eq!(menu.effective_grid_width(), 3);
    }
}
