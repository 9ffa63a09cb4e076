//! Menu runtime state: the active sub-menu per overlay, the selection per
//! menu, directional movement per style, and flash confirmation.
//!
//! Pushing past an edge yields the menu's configured directional command;
//! when that command opens a sub-menu with no explicit initial item it is
//! rewritten to a side-menu entry, which positions the new menu's selection
//! at the opposite edge so the cursor appears to cross straight into it.

use padmux_command::Command;
use padmux_core::{Dir4, MenuId, OverlayId};
use padmux_hotspots::HotspotMap;
use padmux_map::{InputMap, MenuStyle};
use tracing::debug;

/// Default flash-confirmation duration when the appearance does not name
/// one (ms).
pub const DEFAULT_FLASH_TIME_MS: u32 = 300;

/// A flashing item on one overlay.
#[derive(Debug, Clone, Copy)]
struct Flash {
    item: u16,
    remaining_ms: u32,
}

/// Selection and sub-menu state for every overlay.
#[derive(Debug, Default)]
pub struct MenuState {
    /// Selected item per menu, clamped on read.
    selected: Vec<u16>,
    /// Active sub-menu per overlay.
    active_sub: Vec<MenuId>,
    /// Flash confirmation per overlay.
    flash: Vec<Option<Flash>>,
    /// Overlays needing a repaint.
    dirty: Vec<bool>,
}

impl MenuState {
    /// Initializes state for the map's menus and overlays.
    #[must_use]
    pub fn new(map: &InputMap) -> Self {
        let mut state = Self {
            selected: vec![0; map.menu_count()],
            active_sub: Vec::with_capacity(map.overlay_count()),
            flash: vec![None; map.overlay_count()],
            dirty: vec![true; map.overlay_count()],
        };
        for overlay in 0..map.overlay_count() {
            let root = map
                .overlay_root(OverlayId(overlay as u16))
                .unwrap_or_default();
            state.active_sub.push(root);
        }
        for (idx, sel) in state.selected.iter_mut().enumerate() {
            *sel = map.menu(MenuId(idx as u16)).map_or(0, |m| m.default_item);
        }
        state
    }

    /// Re-sizes state after a profile reload, preserving what it can.
    pub fn load_profile_changes(&mut self, map: &InputMap) {
        self.selected.resize(map.menu_count(), 0);
        self.flash.resize(map.overlay_count(), None);
        self.dirty.resize(map.overlay_count(), true);
        while self.active_sub.len() < map.overlay_count() {
            let overlay = self.active_sub.len();
            self.active_sub.push(
                map.overlay_root(OverlayId(overlay as u16))
                    .unwrap_or_default(),
            );
        }
        self.active_sub.truncate(map.overlay_count());
        // A reload may have dropped sub-menus; fall back to roots.
        for (overlay, active) in self.active_sub.iter_mut().enumerate() {
            if map.menu(*active).is_none()
                || map.menu(*active).map(|m| m.overlay.index()) != Some(overlay)
            {
                *active = map
                    .overlay_root(OverlayId(overlay as u16))
                    .unwrap_or_default();
            }
        }
    }

    /// Ticks flash timers; returns overlays whose flash just ended.
    pub fn update(&mut self, dt_ms: u32) {
        for (overlay, slot) in self.flash.iter_mut().enumerate() {
            if let Some(flash) = slot {
                flash.remaining_ms = flash.remaining_ms.saturating_sub(dt_ms);
                if flash.remaining_ms == 0 {
                    *slot = None;
                    self.dirty[overlay] = true;
                }
            }
        }
    }

    /// The active sub-menu shown by an overlay.
    #[must_use]
    pub fn active_menu(&self, map: &InputMap, overlay: OverlayId) -> MenuId {
        self.active_sub
            .get(overlay.index())
            .copied()
            .unwrap_or_else(|| map.overlay_root(overlay).unwrap_or_default())
    }

    /// The clamped selection for a menu.
    #[must_use]
    pub fn selected_item(&self, map: &InputMap, menu: MenuId) -> usize {
        let count = map.menu_item_count(menu);
        if count == 0 {
            return 0;
        }
        usize::from(self.selected.get(menu.index()).copied().unwrap_or(0)).min(count - 1)
    }

    /// The item currently flashing on an overlay.
    #[must_use]
    pub fn flashing_item(&self, overlay: OverlayId) -> Option<usize> {
        self.flash
            .get(overlay.index())
            .copied()
            .flatten()
            .map(|f| usize::from(f.item))
    }

    /// Overlays marked dirty since the last call; clears the marks.
    pub fn take_dirty(&mut self) -> Vec<OverlayId> {
        let mut out = Vec::new();
        for (overlay, dirty) in self.dirty.iter_mut().enumerate() {
            if *dirty {
                out.push(OverlayId(overlay as u16));
                *dirty = false;
            }
        }
        out
    }

    fn mark_dirty(&mut self, overlay: OverlayId) {
        if let Some(slot) = self.dirty.get_mut(overlay.index()) {
            *slot = true;
        }
    }

    /// The selected item's command. Commands that keep the same active
    /// sub-menu flash the item as confirmation.
    pub fn selected_item_command(
        &mut self,
        map: &InputMap,
        root: MenuId,
        flash_time_ms: u32,
    ) -> Command {
        let overlay = map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        let menu = self.active_menu(map, overlay);
        let item = self.selected_item(map, menu);
        let command = map
            .menu(menu)
            .and_then(|m| m.items.get(item))
            .map_or(Command::Empty, |i| i.command);
        if command.flashes_menu_item() {
            self.flash[overlay.index()] = Some(Flash {
                item: item as u16,
                remaining_ms: flash_time_ms.max(1),
            });
            self.mark_dirty(overlay);
        }
        command
    }

    /// Moves the selection in a direction, honoring the active menu's
    /// style. Returns the command produced by pushing past an edge (or
    /// rewritten side-menu entry), if any.
    #[allow(clippy::too_many_lines)]
    pub fn select(
        &mut self,
        map: &InputMap,
        hotspots: &mut HotspotMap,
        root: MenuId,
        dir: Dir4,
        wrap: bool,
        repeat: bool,
    ) -> Command {
        let overlay = map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        let menu = self.active_menu(map, overlay);
        let Some(menu_def) = map.menu(menu) else {
            return Command::Empty;
        };
        let count = map.menu_item_count(menu);
        let mut selection = self.selected_item(map, menu);
        let mut pushed_past_edge = false;
        let mut dir_command = menu_def.dir_items[dir.index()].command;
        let style = menu_def.style;

        match style {
            MenuStyle::List => match dir {
                Dir4::Left | Dir4::Right => pushed_past_edge = true,
                Dir4::Up => {
                    pushed_past_edge = selection == 0;
                    if !pushed_past_edge {
                        selection -= 1;
                    } else if wrap && count > 2 {
                        selection = count - 1;
                    }
                }
                Dir4::Down => {
                    pushed_past_edge = selection + 1 >= count;
                    if !pushed_past_edge {
                        selection += 1;
                    } else if wrap && count > 2 {
                        selection = 0;
                    }
                }
            },
            MenuStyle::Bar => match dir {
                Dir4::Up | Dir4::Down => pushed_past_edge = true,
                Dir4::Left => {
                    pushed_past_edge = selection == 0;
                    if !pushed_past_edge {
                        selection -= 1;
                    } else if wrap && count > 2 {
                        selection = count - 1;
                    }
                }
                Dir4::Right => {
                    pushed_past_edge = selection + 1 >= count;
                    if !pushed_past_edge {
                        selection += 1;
                    } else if wrap && count > 2 {
                        selection = 0;
                    }
                }
            },
            MenuStyle::Grid | MenuStyle::Columns => {
                let stride = if style == MenuStyle::Grid {
                    menu_def.effective_grid_width()
                } else {
                    menu_def.effective_grid_height()
                };
                // Columns are a transposed grid: swap the axes.
                let dir = if style == MenuStyle::Columns {
                    match dir {
                        Dir4::Left => Dir4::Up,
                        Dir4::Right => Dir4::Down,
                        Dir4::Up => Dir4::Left,
                        Dir4::Down => Dir4::Right,
                    }
                } else {
                    dir
                };
                match dir {
                    Dir4::Left => {
                        pushed_past_edge = stride == 0 || selection % stride == 0;
                        if !pushed_past_edge {
                            selection -= 1;
                        } else if wrap && count > 2 {
                            selection = (selection + stride - 1).min(count - 1);
                        }
                    }
                    Dir4::Right => {
                        pushed_past_edge =
                            selection + 1 >= count || (selection + 1) % stride == 0;
                        if !pushed_past_edge {
                            selection += 1;
                        } else if wrap && count > 2 {
                            selection = (selection / stride) * stride;
                        }
                    }
                    Dir4::Up => {
                        pushed_past_edge = selection < stride;
                        if !pushed_past_edge {
                            selection -= stride;
                        } else if wrap && count > 2 {
                            selection += ((count - 1) / stride) * stride;
                            if selection >= count {
                                selection -= stride;
                            }
                        }
                    }
                    Dir4::Down => {
                        pushed_past_edge = selection + stride >= count;
                        if !pushed_past_edge {
                            selection += stride;
                        } else if wrap && count > 2 {
                            selection %= stride;
                        } else if !dir_command.takes_effect()
                            && selection < ((count - 1) / stride) * stride
                        {
                            // A partial last row is still reachable.
                            selection = count - 1;
                        }
                    }
                }
            }
            MenuStyle::Slots => match dir {
                Dir4::Left | Dir4::Right => pushed_past_edge = !repeat,
                Dir4::Up => {
                    selection = if selection == 0 { count.saturating_sub(1) } else { selection - 1 };
                }
                Dir4::Down => {
                    selection = if selection + 1 >= count { 0 } else { selection + 1 };
                }
            },
            MenuStyle::Hotspots | MenuStyle::Highlight => {
                let node = hotspots.menu_link_node(map, menu, selection);
                pushed_past_edge = node.edge[dir.index()];
                if !pushed_past_edge || wrap {
                    selection = usize::from(node.next[dir.index()]);
                }
            }
            MenuStyle::FourDir => {
                pushed_past_edge = !repeat;
                if pushed_past_edge {
                    dir_command = menu_def.dir_items[dir.index()].command;
                    self.flash[overlay.index()] = Some(Flash {
                        item: dir.index() as u16,
                        remaining_ms: DEFAULT_FLASH_TIME_MS,
                    });
                    self.mark_dirty(overlay);
                }
            }
            MenuStyle::KbCycleLast
            | MenuStyle::KbCycleDefault
            | MenuStyle::Hud
            | MenuStyle::HotspotGuide
            | MenuStyle::System => {
                return Command::Empty;
            }
        }

        if count > 0 {
            selection = selection.min(count - 1);
        }
        if !pushed_past_edge {
            dir_command = Command::Empty;
        }

        // An edge push into an unadorned sub-menu open becomes a side-menu
        // entry: the old menu keeps its selection, the new one is entered
        // at the opposite edge.
        if let Command::OpenSubMenu { menu: sub, item: 0 } = dir_command {
            if style != MenuStyle::FourDir {
                selection = self.selected_item(map, menu);
                dir_command = Command::OpenSideMenu { menu: sub, dir };
            }
        }

        if selection != self.selected_item(map, menu) {
            self.selected[menu.index()] = selection as u16;
            self.mark_dirty(overlay);
        }
        dir_command
    }

    /// Opens a sub-menu on its overlay, optionally forcing an initial item
    /// (1-based; 0 keeps the stored selection).
    pub fn open_sub_menu(&mut self, map: &InputMap, sub: MenuId, initial_item: u16) {
        let Some(menu_def) = map.menu(sub) else {
            return;
        };
        let overlay = menu_def.overlay;
        debug!("opening sub-menu {} on overlay {}", menu_def.section, overlay.0);
        self.active_sub[overlay.index()] = sub;
        if initial_item > 0 {
            self.selected[sub.index()] = initial_item - 1;
        }
        self.mark_dirty(overlay);
    }

    /// Opens a side menu entered by pushing past an edge in `dir`: the new
    /// selection lands on the opposite edge.
    pub fn open_side_menu(
        &mut self,
        map: &InputMap,
        hotspots: &mut HotspotMap,
        sub: MenuId,
        dir: Dir4,
    ) {
        let Some(menu_def) = map.menu(sub) else {
            return;
        };
        let overlay = menu_def.overlay;
        let count = map.menu_item_count(sub);
        let entry_edge = dir.opposite();
        let current = self.selected_item(map, sub);

        let selection = match menu_def.style {
            MenuStyle::List => match dir {
                Dir4::Down => 0,
                Dir4::Up => count.saturating_sub(1),
                Dir4::Left | Dir4::Right => current,
            },
            MenuStyle::Bar => match dir {
                Dir4::Right => 0,
                Dir4::Left => count.saturating_sub(1),
                Dir4::Up | Dir4::Down => current,
            },
            MenuStyle::Grid => {
                let stride = menu_def.effective_grid_width().max(1);
                let sel = match dir {
                    Dir4::Right => (current / stride) * stride,
                    Dir4::Left => ((current / stride) * stride + stride - 1).min(count - 1),
                    Dir4::Down => current % stride,
                    Dir4::Up => {
                        let col = current % stride;
                        let last_row = (count - 1) / stride;
                        (last_row * stride + col).min(count - 1)
                    }
                };
                sel
            }
            MenuStyle::Columns => {
                let stride = menu_def.effective_grid_height().max(1);
                match dir {
                    Dir4::Down => (current / stride) * stride,
                    Dir4::Up => ((current / stride) * stride + stride - 1).min(count - 1),
                    Dir4::Right => current % stride,
                    Dir4::Left => {
                        let col = current % stride;
                        let last_col = (count - 1) / stride;
                        (last_col * stride + col).min(count - 1)
                    }
                }
            }
            MenuStyle::Hotspots | MenuStyle::Highlight => {
                hotspots.edge_menu_item(map, sub, entry_edge, current)
            }
            _ => 0,
        };

        self.active_sub[overlay.index()] = sub;
        if count > 0 {
            self.selected[sub.index()] = selection.min(count - 1) as u16;
        }
        self.mark_dirty(overlay);
    }

    /// Steps back to the active sub-menu's parent. Returns false at a root.
    pub fn close_active_sub_menu(&mut self, map: &InputMap, root: MenuId) -> bool {
        let overlay = map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        let active = self.active_menu(map, overlay);
        let Some(parent) = map.menu(active).and_then(|m| m.parent) else {
            return false;
        };
        self.active_sub[overlay.index()] = parent;
        self.mark_dirty(overlay);
        true
    }

    /// Returns an overlay to its root menu and default selections.
    pub fn reset(&mut self, map: &InputMap, root: MenuId) {
        let overlay = map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        let root_menu = map.overlay_root(overlay).unwrap_or(root);
        self.active_sub[overlay.index()] = root_menu;
        for idx in 0..map.menu_count() {
            let id = MenuId(idx as u16);
            if map.root_menu_of(id) == root_menu {
                self.selected[idx] = map.menu(id).map_or(0, |m| m.default_item);
            }
        }
        self.flash[overlay.index()] = None;
        self.mark_dirty(overlay);
    }

    /// The menu's auto command (fired when its overlay becomes active).
    #[must_use]
    pub fn auto_command(&self, map: &InputMap, root: MenuId) -> Command {
        let overlay = map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        let active = self.active_menu(map, overlay);
        map.menu(active).map_or(Command::Empty, |m| m.auto_command)
    }

    /// The menu's configured back command, defaulting to closing the active
    /// sub-menu.
    #[must_use]
    pub fn back_command(&self, map: &InputMap, root: MenuId) -> Command {
        let overlay = map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        let active = self.active_menu(map, overlay);
        map.menu(active).map_or(Command::Empty, |m| m.back_command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padmux_core::Size;
    use padmux_profile::Profile;

    const TARGET: Size = Size { w: 1000, h: 1000 };

    fn setup(profile_text: &str) -> (InputMap, HotspotMap, MenuState) {
        let mut profile = Profile::new();
        profile.load_from_str(profile_text).expect("profile parses");
        let mut map = InputMap::new();
        map.load_profile(&profile);
        let hotspots = HotspotMap::new(&map, TARGET, 1.0);
        let state = MenuState::new(&map);
        (map, hotspots, state)
    }

    fn menu_of(map: &InputMap, name: &str) -> MenuId {
        padmux_command::ParseContext::menu_id(map, name).expect("menu exists")
    }

    const GRID_PROFILE: &str = "\
[Menu.Board]
Style = Grid
GridWidth = 3
1 = One: F1
2 = Two: F2
3 = Three: F3
4 = Four: F4
5 = Five: F5
6 = Six: F6
7 = Seven: F7
";

    #[test]
    fn test_grid_right_wraps_within_row() {
        let (map, mut hotspots, mut state) = setup(GRID_PROFILE);
        let board = menu_of(&map, "Board");
        state.selected[board.index()] = 2; // third item, row 0
        let cmd = state.select(&map, &mut hotspots, board, Dir4::Right, true, false);
        assert_eq!(cmd, Command::Empty);
        assert_eq!(state.selected_item(&map, board), 0);
    }

    #[test]
    fn test_grid_down_without_wrap_stays_on_last() {
        let (map, mut hotspots, mut state) = setup(GRID_PROFILE);
        let board = menu_of(&map, "Board");
        state.selected[board.index()] = 6; // last item (row 2, col 0)
        let cmd = state.select(&map, &mut hotspots, board, Dir4::Down, false, false);
        // No D= command configured: the edge push produces nothing and the
        // selection stays put.
        assert_eq!(cmd, Command::Empty);
        assert_eq!(state.selected_item(&map, board), 6);
    }

    #[test]
    fn test_grid_down_reaches_partial_last_row() {
        let (map, mut hotspots, mut state) = setup(GRID_PROFILE);
        let board = menu_of(&map, "Board");
        // Item 5 (row 1, col 2): down has no item below (7 items, last row
        // has only col 0), so the selection snaps to the last item.
        state.selected[board.index()] = 5;
        let cmd = state.select(&map, &mut hotspots, board, Dir4::Down, false, false);
        assert_eq!(cmd, Command::Empty);
        assert_eq!(state.selected_item(&map, board), 6);
    }

    #[test]
    fn test_list_up_down_and_wrap() {
        let profile = "\
[Menu.Names]
Style = List
1 = A: F1
2 = B: F2
3 = C: F3
";
        let (map, mut hotspots, mut state) = setup(profile);
        let names = menu_of(&map, "Names");
        assert_eq!(state.selected_item(&map, names), 0);
        state.select(&map, &mut hotspots, names, Dir4::Down, false, false);
        assert_eq!(state.selected_item(&map, names), 1);
        state.select(&map, &mut hotspots, names, Dir4::Up, false, false);
        state.select(&map, &mut hotspots, names, Dir4::Up, true, false);
        // Wrapped from the top to the bottom.
        assert_eq!(state.selected_item(&map, names), 2);
    }

    #[test]
    fn test_slots_updown_always_wrap() {
        let profile = "\
[Menu.Ring]
Style = Slots
1 = A: F1
2 = B: F2
3 = C: F3
";
        let (map, mut hotspots, mut state) = setup(profile);
        let ring = menu_of(&map, "Ring");
        state.select(&map, &mut hotspots, ring, Dir4::Up, false, false);
        assert_eq!(state.selected_item(&map, ring), 2);
        state.select(&map, &mut hotspots, ring, Dir4::Down, false, false);
        assert_eq!(state.selected_item(&map, ring), 0);
        // Auto-repeat left/right is a no-op rather than an edge push.
        let cmd = state.select(&map, &mut hotspots, ring, Dir4::Left, false, true);
        assert_eq!(cmd, Command::Empty);
    }

    #[test]
    fn test_edge_push_yields_dir_command() {
        let profile = "\
[Menu.Main]
Style = List
1 = A: F1
2 = B: F2
R = : Close App
";
        let (map, mut hotspots, mut state) = setup(profile);
        let main = menu_of(&map, "Main");
        let cmd = state.select(&map, &mut hotspots, main, Dir4::Right, false, false);
        assert_eq!(cmd, Command::QuitApp);
    }

    #[test]
    fn test_edge_push_submenu_becomes_side_menu() {
        let profile = "\
[Menu.Main]
Style = List
1 = A: F1
R = Side

[Menu.Main.Side]
Style = List
1 = X: F1
2 = Y: F2
3 = Z: F3
";
        let (map, mut hotspots, mut state) = setup(profile);
        let main = menu_of(&map, "Main");
        let side = menu_of(&map, "Side");
        let cmd = state.select(&map, &mut hotspots, main, Dir4::Right, false, false);
        assert_eq!(
            cmd,
            Command::OpenSideMenu {
                menu: side,
                dir: Dir4::Right
            }
        );
        // Executing it enters the side menu with the selection unchanged
        // for a lateral entry into a list.
        state.open_side_menu(&map, &mut hotspots, side, Dir4::Right);
        let overlay = map.menu(main).unwrap().overlay;
        assert_eq!(state.active_menu(&map, overlay), side);
    }

    #[test]
    fn test_side_menu_entry_positions_opposite_edge() {
        let profile = "\
[Menu.Main]
Style = List
1 = A: F1
D = Lower

[Menu.Main.Lower]
Style = List
1 = X: F1
2 = Y: F2
3 = Z: F3
";
        let (map, mut hotspots, mut state) = setup(profile);
        let lower = menu_of(&map, "Lower");
        // Entering downward lands on the top item; upward on the bottom.
        state.open_side_menu(&map, &mut hotspots, lower, Dir4::Down);
        assert_eq!(state.selected_item(&map, lower), 0);
        state.open_side_menu(&map, &mut hotspots, lower, Dir4::Up);
        assert_eq!(state.selected_item(&map, lower), 2);
    }

    #[test]
    fn test_selected_command_flashes_only_non_submenu() {
        let profile = "\
[Menu.Main]
Style = List
1 = A: F1
2 = Sub

[Menu.Main.Sub]
Style = List
1 = X: F1
";
        let (map, _hotspots, mut state) = setup(profile);
        let main = menu_of(&map, "Main");
        let overlay = map.menu(main).unwrap().overlay;

        let cmd = state.selected_item_command(&map, main, 250);
        assert!(matches!(cmd, Command::TapKey { .. }));
        assert_eq!(state.flashing_item(overlay), Some(0));

        // Let the flash expire.
        state.update(250);
        assert_eq!(state.flashing_item(overlay), None);

        // A sub-menu open must not flash.
        state.selected[main.index()] = 1;
        let cmd = state.selected_item_command(&map, main, 250);
        assert!(matches!(cmd, Command::OpenSubMenu { .. }));
        assert_eq!(state.flashing_item(overlay), None);
    }

    #[test]
    fn test_open_close_and_reset() {
        let profile = "\
[Menu.Main]
Style = List
Default = 2
1 = A: F1
2 = Sub
3 = C: F3

[Menu.Main.Sub]
Style = List
1 = X: F1
";
        let (map, _hotspots, mut state) = setup(profile);
        let main = menu_of(&map, "Main");
        let sub = menu_of(&map, "Sub");
        let overlay = map.menu(main).unwrap().overlay;

        assert_eq!(state.selected_item(&map, main), 1, "default selection");

        state.open_sub_menu(&map, sub, 0);
        assert_eq!(state.active_menu(&map, overlay), sub);
        assert!(state.close_active_sub_menu(&map, main));
        assert_eq!(state.active_menu(&map, overlay), main);
        assert!(!state.close_active_sub_menu(&map, main), "root has no parent");

        state.selected[main.index()] = 0;
        state.open_sub_menu(&map, sub, 0);
        state.reset(&map, main);
        assert_eq!(state.active_menu(&map, overlay), main);
        assert_eq!(state.selected_item(&map, main), 1);
    }

    #[test]
    fn test_four_dir_flashes_direction() {
        let profile = "\
[Menu.Pad]
Style = 4Dir
U = : F1
D = : F2
L = : F3
R = : F4
";
        let (map, mut hotspots, mut state) = setup(profile);
        let pad = menu_of(&map, "Pad");
        let overlay = map.menu(pad).unwrap().overlay;
        let cmd = state.select(&map, &mut hotspots, pad, Dir4::Up, false, false);
        assert!(matches!(cmd, Command::TapKey { .. }));
        assert_eq!(state.flashing_item(overlay), Some(Dir4::Up.index()));
        // Auto-repeat does not re-fire.
        let cmd = state.select(&map, &mut hotspots, pad, Dir4::Up, false, true);
        assert_eq!(cmd, Command::Empty);
    }
}
