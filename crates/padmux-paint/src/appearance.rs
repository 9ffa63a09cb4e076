//! Parsed menu appearance, layout, position, and alpha descriptions,
//! deduplicated by content hash.
//!
//! Menus inherit from the global `[Appearance]` section, then their root
//! menu's section, then their own. Each menu ends up holding small indices
//! into the shared caches; identical configurations share one entry. When a
//! root menu's properties change every descendant re-derives.

use padmux_core::{Coord, MenuId, OverlayId};
use padmux_map::InputMap;
use padmux_profile::Profile;
use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Window-edge alignment along one axis: shift by 0, half, or the whole
/// window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    #[default]
    Min,
    Center,
    Max,
}

impl Alignment {
    fn from_name(name: &str) -> Option<Alignment> {
        Some(match name.to_ascii_lowercase().as_str() {
            "left" | "top" | "min" => Alignment::Min,
            "center" | "centre" | "middle" => Alignment::Center,
            "right" | "bottom" | "max" => Alignment::Max,
            _ => return None,
        })
    }

    /// The pixel shift for a window of the given extent.
    #[must_use]
    pub fn shift(self, extent: i32) -> i32 {
        match self {
            Alignment::Min => 0,
            Alignment::Center => extent / 2,
            Alignment::Max => extent,
        }
    }
}

/// Colors, font, and flash timing for a menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuAppearance {
    pub font_name: String,
    pub font_size: u16,
    pub text_color: u32,
    pub selected_text_color: u32,
    pub back_color: u32,
    pub selected_back_color: u32,
    pub flash_color: u32,
    pub border_color: u32,
    pub border_width: u8,
    pub flash_time_ms: u32,
}

impl Default for MenuAppearance {
    fn default() -> Self {
        Self {
            font_name: "Tahoma".to_string(),
            font_size: 14,
            text_color: 0x00FF_FFFF,
            selected_text_color: 0x0000_0000,
            back_color: 0x2020_2020,
            selected_back_color: 0x00E0_E0E0,
            flash_color: 0x00FF_FF00,
            border_color: 0x0060_6060,
            border_width: 1,
            flash_time_ms: 300,
        }
    }
}

/// Item sizing and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuLayout {
    pub item_width: i32,
    pub item_height: i32,
    /// Gaps may be negative: items then overlap and the selection is drawn
    /// last.
    pub gap_x: i32,
    pub gap_y: i32,
    pub title_height: i32,
    pub align_x: Alignment,
    pub align_y: Alignment,
}

impl Default for MenuLayout {
    fn default() -> Self {
        Self {
            item_width: 120,
            item_height: 24,
            gap_x: 2,
            gap_y: 2,
            title_height: 0,
            align_x: Alignment::Min,
            align_y: Alignment::Min,
        }
    }
}

/// Where a menu window sits: an anchored base plus a UI-scaled pixel part,
/// kept separate so scale changes do not move the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MenuPosition {
    pub x: Coord,
    pub y: Coord,
    /// Whether the offset part scales with the UI scale.
    pub scale_offsets: bool,
}

/// Fade timings for an overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowAlphaInfo {
    pub max_alpha: u8,
    pub fade_in_delay_ms: u32,
    pub fade_in_time_ms: u32,
    pub fade_out_delay_ms: u32,
    pub fade_out_time_ms: u32,
    pub inactive_delay_ms: u32,
    pub inactive_alpha: u8,
}

impl Default for WindowAlphaInfo {
    fn default() -> Self {
        Self {
            max_alpha: 255,
            fade_in_delay_ms: 0,
            fade_in_time_ms: 100,
            fade_out_delay_ms: 0,
            fade_out_time_ms: 200,
            inactive_delay_ms: 4000,
            inactive_alpha: 160,
        }
    }
}

/// The four cache indices a menu holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStyle {
    pub appearance: u16,
    pub layout: u16,
    pub position: u16,
    pub alpha: u16,
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Interning table for one kind of appearance value.
#[derive(Debug, Default)]
struct Interner<T> {
    values: Vec<T>,
    index: FxHashMap<u64, u16>,
}

impl<T: Hash + Clone + PartialEq> Interner<T> {
    fn intern(&mut self, value: T) -> u16 {
        let key = hash_of(&value);
        if let Some(&idx) = self.index.get(&key) {
            if self.values[usize::from(idx)] == value {
                return idx;
            }
        }
        self.values.push(value);
        let idx = (self.values.len() - 1) as u16;
        self.index.insert(key, idx);
        idx
    }

    fn get(&self, idx: u16) -> Option<&T> {
        self.values.get(usize::from(idx))
    }
}

/// All deduplicated appearance data plus each menu's indices.
#[derive(Debug, Default)]
pub struct AppearanceCache {
    appearances: Interner<MenuAppearance>,
    layouts: Interner<MenuLayout>,
    positions: Interner<MenuPosition>,
    alphas: Interner<WindowAlphaInfo>,
    styles: Vec<PaintStyle>,
}

impl AppearanceCache {
    /// Rebuilds every menu's style from the profile: `[Appearance]`
    /// defaults, overridden by the root menu's section, overridden by the
    /// menu's own section.
    pub fn load(&mut self, profile: &Profile, map: &InputMap) {
        *self = Self::default();
        for idx in 0..map.menu_count() {
            let menu = MenuId(idx as u16);
            let Some(menu_def) = map.menu(menu) else {
                self.styles.push(PaintStyle::default());
                continue;
            };
            let root_section = map
                .menu(menu_def.root)
                .map(|m| m.section.clone())
                .unwrap_or_default();

            let mut appearance = MenuAppearance::default();
            let mut layout = MenuLayout::default();
            let mut position = MenuPosition::default();
            let mut alpha = WindowAlphaInfo::default();
            for section in ["Appearance", root_section.as_str(), menu_def.section.as_str()] {
                if section.is_empty() {
                    continue;
                }
                apply_appearance(profile, section, &mut appearance);
                apply_layout(profile, section, &mut layout);
                apply_position(profile, section, &mut position);
                apply_alpha(profile, section, &mut alpha);
            }
            self.styles.push(PaintStyle {
                appearance: self.appearances.intern(appearance),
                layout: self.layouts.intern(layout),
                position: self.positions.intern(position),
                alpha: self.alphas.intern(alpha),
            });
        }
        debug!(
            "appearance cache: {} menus, {} unique appearances, {} layouts",
            self.styles.len(),
            self.appearances.values.len(),
            self.layouts.values.len()
        );
    }

    #[must_use]
    pub fn style_of(&self, menu: MenuId) -> PaintStyle {
        self.styles.get(menu.index()).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn appearance(&self, idx: u16) -> MenuAppearance {
        self.appearances.get(idx).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn layout(&self, idx: u16) -> MenuLayout {
        self.layouts.get(idx).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn position(&self, idx: u16) -> MenuPosition {
        self.positions.get(idx).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn alpha(&self, idx: u16) -> WindowAlphaInfo {
        self.alphas.get(idx).copied().unwrap_or_default()
    }

    /// The alpha info for an overlay (its root menu's).
    #[must_use]
    pub fn overlay_alpha(&self, map: &InputMap, overlay: OverlayId) -> WindowAlphaInfo {
        map.overlay_root(overlay)
            .map(|root| self.alpha(self.style_of(root).alpha))
            .unwrap_or_default()
    }

    /// The flash duration for a menu.
    #[must_use]
    pub fn flash_time_ms(&self, menu: MenuId) -> u32 {
        self.appearance(self.style_of(menu).appearance).flash_time_ms
    }
}

fn parse_color(text: &str) -> Option<u32> {
    let text = text.trim().trim_start_matches('#');
    u32::from_str_radix(text, 16).ok()
}

fn apply_appearance(profile: &Profile, section: &str, out: &mut MenuAppearance) {
    let get = |key: &str| -> String { profile.get_str(section, key, "") };
    let font = get("FontName");
    if !font.is_empty() {
        out.font_name = font;
    }
    let size = profile.get_int(section, "FontSize", 0);
    if size > 0 {
        out.font_size = size.clamp(1, 400) as u16;
    }
    for (key, slot) in [
        ("TextColor", &mut out.text_color),
        ("SelectedTextColor", &mut out.selected_text_color),
        ("BackColor", &mut out.back_color),
        ("SelectedBackColor", &mut out.selected_back_color),
        ("FlashColor", &mut out.flash_color),
        ("BorderColor", &mut out.border_color),
    ] {
        if let Some(color) = parse_color(&get(key)) {
            *slot = color;
        }
    }
    let border = profile.get_int(section, "BorderWidth", -1);
    if border >= 0 {
        out.border_width = border.clamp(0, 255) as u8;
    }
    let flash = profile.get_int(section, "FlashTime", -1);
    if flash >= 0 {
        out.flash_time_ms = flash as u32;
    }
}

fn apply_layout(profile: &Profile, section: &str, out: &mut MenuLayout) {
    for (key, slot) in [
        ("ItemWidth", &mut out.item_width),
        ("ItemHeight", &mut out.item_height),
        ("GapX", &mut out.gap_x),
        ("GapY", &mut out.gap_y),
        ("TitleHeight", &mut out.title_height),
    ] {
        let value = profile.get_str(section, key, "");
        if let Ok(parsed) = value.trim().parse::<i32>() {
            *slot = parsed;
        }
    }
    if let Some(align) = Alignment::from_name(&profile.get_str(section, "AlignX", "")) {
        out.align_x = align;
    }
    if let Some(align) = Alignment::from_name(&profile.get_str(section, "AlignY", "")) {
        out.align_y = align;
    }
}

fn apply_position(profile: &Profile, section: &str, out: &mut MenuPosition) {
    let value = profile.get_str(section, "Position", "");
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if let Some((x, y)) = parse_position(value) {
        out.x = x;
        out.y = y;
    }
    let scaled = profile.get_str(section, "ScalePosition", "");
    if !scaled.is_empty() {
        out.scale_offsets = matches!(
            scaled.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
}

/// Parses `X, Y` where each part is `A%+B` or a bare pixel offset.
fn parse_position(text: &str) -> Option<(Coord, Coord)> {
    let (x_part, y_part) = text.split_once(',')?;
    Some((parse_coord_text(x_part)?, parse_coord_text(y_part)?))
}

fn parse_coord_text(text: &str) -> Option<Coord> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some((pct, rest)) = text.split_once('%') {
        let pct: f64 = pct.parse().ok()?;
        let anchor = (pct * 65536.0 / 100.0).round().clamp(0.0, 65535.0) as u16;
        let offset = if rest.is_empty() {
            0
        } else {
            rest.parse::<i32>().ok()?.clamp(-32768, 32767)
        };
        Some(Coord::new(anchor, offset as i16))
    } else {
        let offset: i32 = text.parse().ok()?;
        Some(Coord::new(0, offset.clamp(-32768, 32767) as i16))
    }
}

fn apply_alpha(profile: &Profile, section: &str, out: &mut WindowAlphaInfo) {
    for (key, slot) in [
        ("FadeInDelay", &mut out.fade_in_delay_ms),
        ("FadeInTime", &mut out.fade_in_time_ms),
        ("FadeOutDelay", &mut out.fade_out_delay_ms),
        ("FadeOutTime", &mut out.fade_out_time_ms),
        ("InactiveDelay", &mut out.inactive_delay_ms),
    ] {
        let value = profile.get_int(section, key, -1);
        if value >= 0 {
            *slot = value as u32;
        }
    }
    for (key, slot) in [
        ("MaxAlpha", &mut out.max_alpha),
        ("InactiveAlpha", &mut out.inactive_alpha),
    ] {
        let value = profile.get_int(section, key, -1);
        if (0..=255).contains(&value) {
            *slot = value as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_cache(text: &str) -> (AppearanceCache, InputMap) {
        let mut profile = Profile::new();
        profile.load_from_str(text).expect("profile parses");
        let mut map = InputMap::new();
        map.load_profile(&profile);
        let mut cache = AppearanceCache::default();
        cache.load(&profile, &map);
        (cache, map)
    }

    fn menu_of(map: &InputMap, name: &str) -> MenuId {
        padmux_command::ParseContext::menu_id(map, name).expect("menu exists")
    }

    #[test]
    fn test_identical_configs_share_entries() {
        let (cache, map) = load_cache(
            "\
[Appearance]
FontSize = 16

[Menu.A]
Style = List
1 = X: F1

[Menu.B]
Style = List
1 = Y: F2
",
        );
        let a = cache.style_of(menu_of(&map, "A"));
        let b = cache.style_of(menu_of(&map, "B"));
        assert_eq!(a.appearance, b.appearance);
        assert_eq!(a.layout, b.layout);
        assert_eq!(cache.appearance(a.appearance).font_size, 16);
    }

    #[test]
    fn test_sub_menu_inherits_from_root() {
        let (cache, map) = load_cache(
            "\
[Menu.A]
Style = List
FontSize = 20
1 = Sub

[Menu.A.Sub]
Style = List
1 = X: F1
",
        );
        let sub = cache.style_of(menu_of(&map, "Sub"));
        assert_eq!(cache.appearance(sub.appearance).font_size, 20);
    }

    #[test]
    fn test_own_section_overrides_root() {
        let (cache, map) = load_cache(
            "\
[Menu.A]
Style = List
FontSize = 20
1 = Sub

[Menu.A.Sub]
Style = List
FontSize = 11
1 = X: F1
",
        );
        let root = cache.style_of(menu_of(&map, "A"));
        let sub = cache.style_of(menu_of(&map, "Sub"));
        assert_ne!(root.appearance, sub.appearance);
        assert_eq!(cache.appearance(sub.appearance).font_size, 11);
    }

    #[test]
    fn test_position_parse_forms() {
        let (x, y) = parse_position("50%+10, 25%-5").unwrap();
        assert_eq!(x.anchor, 0x8000);
        assert_eq!(x.offset, 10);
        assert_eq!(y.anchor, 0x4000);
        assert_eq!(y.offset, -5);
        let (x, y) = parse_position("30, 40").unwrap();
        assert_eq!((x.anchor, x.offset), (0, 30));
        assert_eq!((y.anchor, y.offset), (0, 40));
    }

    #[test]
    fn test_alpha_properties() {
        let (cache, map) = load_cache(
            "\
[Menu.A]
Style = List
MaxAlpha = 200
FadeInTime = 50
InactiveAlpha = 90
1 = X: F1
",
        );
        let alpha = cache.overlay_alpha(&map, padmux_core::OverlayId(0));
        assert_eq!(alpha.max_alpha, 200);
        assert_eq!(alpha.fade_in_time_ms, 50);
        assert_eq!(alpha.inactive_alpha, 90);
        let _ = map;
    }

    #[test]
    fn test_colors_parse_hex() {
        let (cache, map) = load_cache(
            "\
[Menu.A]
Style = List
TextColor = #FF8800
1 = X: F1
",
        );
        let style = cache.style_of(menu_of(&map, "A"));
        assert_eq!(cache.appearance(style.appearance).text_color, 0x00FF_8800);
    }
}
