//! Component-rectangle computation for each overlay.
//!
//! Index 0 of the result is the whole window; the item list holds one
//! rectangle per menu item (or per direction for the 4-dir style). All
//! rectangles are absolute in target-window coordinates and clipped to it.

use padmux_core::{MenuId, OverlayId, Point, Rect, Size};
use padmux_map::{InputMap, MenuStyle};
use padmux_menus::MenuState;

use crate::appearance::{AppearanceCache, MenuLayout, MenuPosition};

/// The computed rectangles for one overlay.
#[derive(Debug, Clone, Default)]
pub struct OverlayLayout {
    /// The whole overlay window.
    pub window: Rect,
    /// One rectangle per item (4-dir: per direction, U/D/L/R order).
    pub items: Vec<Rect>,
    /// Optional title strip at the top of the window.
    pub title: Option<Rect>,
    /// The alt-label slot next to the top `Slots` item.
    pub alt_label: Option<Rect>,
}

fn scaled(value: i32, ui_scale: f64) -> i32 {
    (f64::from(value) * ui_scale).round() as i32
}

/// Resolves the window origin from its position description, alignment,
/// and size.
fn window_origin(
    position: MenuPosition,
    layout: MenuLayout,
    window_size: Size,
    target: Size,
    ui_scale: f64,
) -> Point {
    // Round the anchor resolution so a 100% anchor reaches the far edge.
    let mut x = (i64::from(target.w) * i64::from(position.x.anchor) + 0x8000) / 0x1_0000;
    let mut y = (i64::from(target.h) * i64::from(position.y.anchor) + 0x8000) / 0x1_0000;
    let (off_x, off_y) = if position.scale_offsets {
        (
            scaled(i32::from(position.x.offset), ui_scale),
            scaled(i32::from(position.y.offset), ui_scale),
        )
    } else {
        (i32::from(position.x.offset), i32::from(position.y.offset))
    };
    x += i64::from(off_x);
    y += i64::from(off_y);
    x -= i64::from(layout.align_x.shift(window_size.w));
    y -= i64::from(layout.align_y.shift(window_size.h));
    Point::new(x as i32, y as i32)
}

/// Lays out a row/column grid of items, returning (window size, rects
/// relative to the window).
fn grid_rects(
    count: usize,
    cols: usize,
    rows: usize,
    column_major: bool,
    layout: MenuLayout,
    ui_scale: f64,
) -> (Size, Vec<Rect>) {
    let item_w = scaled(layout.item_width, ui_scale).max(1);
    let item_h = scaled(layout.item_height, ui_scale).max(1);
    let gap_x = scaled(layout.gap_x, ui_scale);
    let gap_y = scaled(layout.gap_y, ui_scale);
    let title_h = scaled(layout.title_height, ui_scale).max(0);

    let span_x = |n: usize| item_w * n as i32 + gap_x * (n as i32 - 1).max(0);
    let span_y = |n: usize| item_h * n as i32 + gap_y * (n as i32 - 1).max(0);
    let window = Size::new(span_x(cols).max(item_w), (span_y(rows) + title_h).max(item_h));

    let mut rects = Vec::with_capacity(count);
    for idx in 0..count {
        let (col, row) = if column_major {
            (idx / rows, idx % rows)
        } else {
            (idx % cols, idx / cols)
        };
        rects.push(Rect::new(
            (item_w + gap_x) * col as i32,
            title_h + (item_h + gap_y) * row as i32,
            item_w,
            item_h,
        ));
    }
    (window, rects)
}

/// Computes an overlay's full layout.
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn compute_overlay_layout(
    map: &InputMap,
    menus: &MenuState,
    cache: &AppearanceCache,
    overlay: OverlayId,
    target: Size,
    ui_scale: f64,
) -> OverlayLayout {
    let menu = menus.active_menu(map, overlay);
    let Some(menu_def) = map.menu(menu) else {
        return OverlayLayout::default();
    };
    let style = cache.style_of(menu);
    let layout = cache.layout(style.layout);
    let position = cache.position(style.position);
    let count = menu_def.items.len();
    let target_rect = Rect::new(0, 0, target.w, target.h);

    let mut out = OverlayLayout::default();
    match menu_def.style {
        MenuStyle::List | MenuStyle::Bar | MenuStyle::Grid | MenuStyle::Columns
        | MenuStyle::Slots => {
            let (cols, rows, column_major) = match menu_def.style {
                MenuStyle::List | MenuStyle::Slots => (1, count.max(1), false),
                MenuStyle::Bar => (count.max(1), 1, false),
                MenuStyle::Grid => {
                    let w = menu_def.effective_grid_width().max(1);
                    (w, count.max(1).div_ceil(w), false)
                }
                _ => {
                    let h = menu_def.effective_grid_height().max(1);
                    (count.max(1).div_ceil(h), h, true)
                }
            };
            let (window_size, rects) =
                grid_rects(count, cols, rows, column_major, layout, ui_scale);
            let origin = window_origin(position, layout, window_size, target, ui_scale);
            out.window = Rect::new(origin.x, origin.y, window_size.w, window_size.h)
                .intersect(target_rect);
            out.items = rects
                .into_iter()
                .map(|r| r.offset(origin.x, origin.y).intersect(target_rect))
                .collect();
            if layout.title_height > 0 {
                out.title = Some(
                    Rect::new(
                        origin.x,
                        origin.y,
                        window_size.w,
                        scaled(layout.title_height, ui_scale),
                    )
                    .intersect(target_rect),
                );
            }
            if menu_def.style == MenuStyle::Slots && !out.items.is_empty() {
                // The alt label hangs off the top slot, opposite the
                // horizontal alignment.
                let top = out.items[0];
                let alt = if layout.align_x == crate::appearance::Alignment::Max {
                    top.offset(-top.size.w, 0)
                } else {
                    top.offset(top.size.w, 0)
                };
                out.alt_label = Some(alt.intersect(target_rect));
            }
        }

        MenuStyle::FourDir => {
            let item_w = scaled(layout.item_width, ui_scale).max(1);
            let item_h = scaled(layout.item_height, ui_scale).max(1);
            let gap_x = scaled(layout.gap_x, ui_scale);
            let gap_y = scaled(layout.gap_y, ui_scale);
            let window_size = Size::new(item_w * 3 + gap_x * 2, item_h * 3 + gap_y * 2);
            let origin = window_origin(position, layout, window_size, target, ui_scale);
            out.window = Rect::new(origin.x, origin.y, window_size.w, window_size.h)
                .intersect(target_rect);
            // Cross layout in U/D/L/R (Dir4 index) order: Left, Right,
            // Up, Down.
            let cell = |cx: i32, cy: i32| {
                Rect::new(
                    origin.x + (item_w + gap_x) * cx,
                    origin.y + (item_h + gap_y) * cy,
                    item_w,
                    item_h,
                )
                .intersect(target_rect)
            };
            out.items = vec![cell(0, 1), cell(2, 1), cell(1, 0), cell(1, 2)];
            if layout.title_height > 0 {
                out.title = Some(cell(1, 1));
            }
        }

        MenuStyle::Hotspots => {
            let item_w = scaled(layout.item_width, ui_scale).max(1);
            let item_h = scaled(layout.item_height, ui_scale).max(1);
            let mut union = Rect::default();
            for item in &menu_def.items {
                let hotspot = map.hotspots.hotspot(item.hotspot);
                if hotspot.is_zero() {
                    // Items on invalidated hotspots vanish but keep their
                    // slots for later restoration.
                    out.items.push(Rect::default());
                    continue;
                }
                let center = hotspot.resolve(target);
                let w = if hotspot.w > 0 {
                    scaled(i32::from(hotspot.w), ui_scale)
                } else {
                    item_w
                };
                let h = if hotspot.h > 0 {
                    scaled(i32::from(hotspot.h), ui_scale)
                } else {
                    item_h
                };
                let rect = Rect::new(center.x - w / 2, center.y - h / 2, w, h)
                    .intersect(target_rect);
                union = union.union(rect);
                out.items.push(rect);
            }
            out.window = union;
        }

        MenuStyle::Highlight => {
            let selected = menus.selected_item(map, menu);
            let hotspot = menu_def
                .items
                .get(selected)
                .map(|i| map.hotspots.hotspot(i.hotspot))
                .unwrap_or_default();
            if !hotspot.is_zero() {
                let center = hotspot.resolve(target);
                let w = scaled(i32::from(hotspot.w.max(8)), ui_scale);
                let h = scaled(i32::from(hotspot.h.max(8)), ui_scale);
                let rect = Rect::new(center.x - w / 2, center.y - h / 2, w, h)
                    .intersect(target_rect);
                out.window = rect;
                out.items = vec![rect];
            }
        }

        MenuStyle::KbCycleLast | MenuStyle::KbCycleDefault | MenuStyle::Hud => {
            let item_w = scaled(layout.item_width, ui_scale).max(1);
            let item_h = scaled(layout.item_height, ui_scale).max(1);
            // At the cycle's active hotspot when known, else the configured
            // position.
            let center = cycle_hotspot_pos(map, menu_def.cycle, menu_def.style, target)
                .unwrap_or_else(|| {
                    let size = Size::new(item_w, item_h);
                    let origin = window_origin(position, layout, size, target, ui_scale);
                    Point::new(origin.x + item_w / 2, origin.y + item_h / 2)
                });
            let rect = Rect::new(
                center.x - item_w / 2,
                center.y - item_h / 2,
                item_w,
                item_h,
            )
            .intersect(target_rect);
            out.window = rect;
            out.items = vec![rect];
        }

        MenuStyle::HotspotGuide | MenuStyle::System => {
            out.window = target_rect;
        }
    }
    out
}

/// Pixel position of the cycle's default entry hotspot, if linked.
fn cycle_hotspot_pos(
    map: &InputMap,
    cycle: Option<padmux_core::CycleId>,
    style: MenuStyle,
    target: Size,
) -> Option<Point> {
    let cycle_id = cycle?;
    let cycle = map.cycle(cycle_id)?;
    let index = match style {
        MenuStyle::KbCycleLast => map
            .cycle_state
            .last_index(cycle_id)
            .unwrap_or_else(|| map.cycle_state.default_index(cycle_id)),
        _ => map.cycle_state.default_index(cycle_id),
    };
    let entry = cycle.entries.get(usize::from(index))?;
    if entry.hotspot.0 == 0 {
        return None;
    }
    let hotspot = map.hotspots.hotspot(entry.hotspot);
    if hotspot.is_zero() {
        return None;
    }
    Some(hotspot.resolve(target))
}

/// Keys describing everything a layout depends on; when unchanged the
/// cached layout stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutKey {
    pub target: (i32, i32),
    pub ui_scale_milli: i64,
    pub menu: MenuId,
    pub item_count: usize,
    pub selected: usize,
    pub style: crate::appearance::PaintStyle,
}

impl LayoutKey {
    /// The current key for an overlay.
    #[must_use]
    pub fn of(
        map: &InputMap,
        menus: &MenuState,
        cache: &AppearanceCache,
        overlay: OverlayId,
        target: Size,
        ui_scale: f64,
    ) -> LayoutKey {
        let menu = menus.active_menu(map, overlay);
        LayoutKey {
            target: (target.w, target.h),
            ui_scale_milli: (ui_scale * 1000.0) as i64,
            menu,
            item_count: map.menu_item_count(menu),
            selected: menus.selected_item(map, menu),
            style: cache.style_of(menu),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padmux_core::Dir4;
    use padmux_profile::Profile;

    const TARGET: Size = Size { w: 1000, h: 800 };

    fn setup(text: &str) -> (InputMap, MenuState, AppearanceCache) {
        let mut profile = Profile::new();
        profile.load_from_str(text).expect("profile parses");
        let mut map = InputMap::new();
        map.load_profile(&profile);
        let menus = MenuState::new(&map);
        let mut cache = AppearanceCache::default();
        cache.load(&profile, &map);
        (map, menus, cache)
    }

    #[test]
    fn test_grid_layout_row_major() {
        let (map, menus, cache) = setup(
            "\
[Menu.Board]
Style = Grid
GridWidth = 3
ItemWidth = 50
ItemHeight = 20
GapX = 10
GapY = 5
Position = 0, 0
1 = A: F1
2 = B: F2
3 = C: F3
4 = D: F4
5 = E: F5
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        // 3 columns, 2 rows.
        assert_eq!(layout.window.size, Size::new(50 * 3 + 10 * 2, 20 * 2 + 5));
        assert_eq!(layout.items.len(), 5);
        assert_eq!(layout.items[0], Rect::new(0, 0, 50, 20));
        assert_eq!(layout.items[1], Rect::new(60, 0, 50, 20));
        assert_eq!(layout.items[3], Rect::new(0, 25, 50, 20));
    }

    #[test]
    fn test_columns_layout_column_major() {
        let (map, menus, cache) = setup(
            "\
[Menu.Cols]
Style = Columns
GridHeight = 2
ItemWidth = 40
ItemHeight = 10
GapX = 0
GapY = 0
Position = 0, 0
1 = A: F1
2 = B: F2
3 = C: F3
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        // Column-major: item 1 goes below item 0, item 2 starts column 2.
        assert_eq!(layout.items[0].pos, Point::new(0, 0));
        assert_eq!(layout.items[1].pos, Point::new(0, 10));
        assert_eq!(layout.items[2].pos, Point::new(40, 0));
    }

    #[test]
    fn test_alignment_and_anchor_position() {
        let (map, menus, cache) = setup(
            "\
[Menu.List]
Style = List
ItemWidth = 100
ItemHeight = 20
GapY = 0
Position = 50%, 100%
AlignX = Center
AlignY = Bottom
1 = A: F1
2 = B: F2
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        // Window 100x40 centered at x=500, bottom at y=800.
        assert_eq!(layout.window, Rect::new(450, 760, 100, 40));
    }

    #[test]
    fn test_clipping_to_target() {
        let (map, menus, cache) = setup(
            "\
[Menu.List]
Style = List
ItemWidth = 100
ItemHeight = 50
Position = 100%-20, 0
1 = A: F1
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        assert_eq!(layout.window.right(), TARGET.w);
        assert!(layout.window.size.w < 100);
    }

    #[test]
    fn test_ui_scale_scales_items_not_anchor() {
        let (map, menus, cache) = setup(
            "\
[Menu.List]
Style = List
ItemWidth = 100
ItemHeight = 20
GapY = 0
Position = 50%, 0
1 = A: F1
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 2.0);
        assert_eq!(layout.window.size, Size::new(200, 40));
        // The anchor stays at x=500 (alignment Min).
        assert_eq!(layout.window.pos.x, 500);
    }

    #[test]
    fn test_negative_gap_overlaps() {
        let (map, menus, cache) = setup(
            "\
[Menu.List]
Style = List
ItemWidth = 80
ItemHeight = 30
GapY = -10
Position = 0, 0
1 = A: F1
2 = B: F2
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        // Second item starts before the first ends.
        assert!(layout.items[1].top() < layout.items[0].bottom());
    }

    #[test]
    fn test_hotspots_layout_union_window() {
        let (map, menus, cache) = setup(
            "\
[Hotspots]
Spot1 = 0%+100, 0%+100, 40x20
Spot2 = 0%+300, 0%+200, 40x20

[Menu.Spots]
Style = Hotspots
Spot1 = A: F1
Spot2 = B: F2
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        assert_eq!(layout.items.len(), 2);
        let union = layout.items[0].union(layout.items[1]);
        assert_eq!(layout.window, union);
        // Rects centered on the hotspots.
        assert_eq!(layout.items[0].center(), Point::new(100, 100));
    }

    #[test]
    fn test_four_dir_cross() {
        let (map, menus, cache) = setup(
            "\
[Menu.Pad]
Style = 4Dir
ItemWidth = 30
ItemHeight = 30
GapX = 0
GapY = 0
Position = 0, 0
U = : F1
D = : F2
L = : F3
R = : F4
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        assert_eq!(layout.items.len(), 4);
        // Left cell is west of the right cell; up north of down.
        assert!(layout.items[Dir4::Left.index()].left() < layout.items[Dir4::Right.index()].left());
        assert!(layout.items[Dir4::Up.index()].top() < layout.items[Dir4::Down.index()].top());
    }

    #[test]
    fn test_system_style_covers_target() {
        let (map, menus, cache) = setup(
            "\
[Menu.Notices]
Style = System
",
        );
        let layout =
            compute_overlay_layout(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        assert_eq!(layout.window, Rect::new(0, 0, TARGET.w, TARGET.h));
    }

    #[test]
    fn test_layout_key_changes_with_selection() {
        let (map, mut menus, cache) = setup(
            "\
[Hotspots]
Spot1 = 0%+100, 0%+100, 40x20
Spot2 = 0%+300, 0%+200, 40x20

[Menu.Spots]
Style = Highlight
Spot1 = A: F1
Spot2 = B: F2
",
        );
        let before = LayoutKey::of(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        let mut hotspots = padmux_hotspots::HotspotMap::new(
            &map,
            TARGET,
            1.0,
        );
        let menu = menus.active_menu(&map, OverlayId(0));
        let _ = menus.select(&map, &mut hotspots, menu, Dir4::Right, false, false);
        let after = LayoutKey::of(&map, &menus, &cache, OverlayId(0), TARGET, 1.0);
        assert_ne!(before.selected, after.selected);
    }
}
