//! The input map: owner of every persistent entity and the profile loader
//! that populates them.
//!
//! Load order matters: hotspot arrays, then key binds, then cycles, then
//! menus (empty entries first so dotted sub-menu names resolve), then
//! layers. Parsing a command needs to know which names are hotspots versus
//! binds versus layers versus menus, and this order makes each stage's
//! names available to the next.

use padmux_command::{
    Command, ParseContext, ParseFlags, SeqToken, decode_sequence, parse_command,
    parse_keybind_command,
};
use padmux_core::{
    BitSet, CycleId, Dir4, HotspotId, KeyBindId, LayerId, MenuId, OverlayId, StringId, VariableId,
};
use padmux_profile::Profile;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::buttons::{
    BUTTON_COUNT, ButtonPhase, PadButton, split_phase_prefix, split_time_suffix,
};
use crate::cycles::{CycleEntry, CycleState, KeyBindCycle};
use crate::error_log::ErrorLog;
use crate::hotspots::{HotspotStore, fetch_range_suffix};
use crate::layers::{COMBO_DELIMITER, ControlsLayer, MouseMode, validate_layer};
use crate::menus::{Menu, MenuItem, MenuStyle};

/// The reserved movement bind names and the commands they stand for.
const SPECIAL_BINDS: [(&str, Command); 7] = [
    ("movef", Command::MoveTurn { dir: Dir4::Up }),
    ("moveb", Command::MoveTurn { dir: Dir4::Down }),
    ("turnl", Command::MoveTurn { dir: Dir4::Left }),
    ("turnr", Command::MoveTurn { dir: Dir4::Right }),
    ("strafel", Command::MoveStrafe { dir: Dir4::Left }),
    ("strafer", Command::MoveStrafe { dir: Dir4::Right }),
    ("autorun", Command::StartAutoRun { multi_dir: false }),
];

/// Everything loaded from the profile, owned in dense tables.
#[derive(Debug, Default)]
pub struct InputMap {
    pub errors: ErrorLog,
    pub hotspots: HotspotStore,

    keybind_names: Vec<String>,
    keybind_commands: Vec<Command>,
    keybind_index: FxHashMap<String, usize>,

    cycles: Vec<KeyBindCycle>,
    cycle_index: FxHashMap<String, usize>,
    pub cycle_state: CycleState,

    layers: Vec<ControlsLayer>,
    layer_index: FxHashMap<String, usize>,

    menus: Vec<Menu>,
    menu_index: FxHashMap<String, usize>,
    overlay_roots: Vec<MenuId>,

    strings: Vec<Vec<u8>>,
    string_index: FxHashMap<Vec<u8>, u16>,

    /// Variable names mirrored from the profile so commands can reference
    /// them by ID.
    variables: Vec<String>,

    /// Menu whose properties are being parsed (scopes sub-menu names).
    parse_scope_menu: Option<MenuId>,
}

impl InputMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hotspots: HotspotStore::new(),
            ..Self::default()
        }
    }

    /// Full load from a profile, in the required stage order.
    pub fn load_profile(&mut self, profile: &Profile) {
        *self = Self::new();
        self.load_variables(profile);
        self.load_hotspots(profile);
        self.load_keybinds(profile);
        self.load_cycles(profile);
        self.load_menus(profile);
        self.load_layers(profile);
    }

    fn load_variables(&mut self, profile: &Profile) {
        self.variables.clear();
        let mut id = 0;
        while let Some(name) = profile.variable_name(id) {
            self.variables.push(name.to_string());
            id += 1;
        }
    }

    #[must_use]
    pub fn variable_name(&self, variable: VariableId) -> &str {
        self.variables
            .get(variable.index())
            .map_or("", String::as_str)
    }

    /// Re-applies only the profile's changed sections.
    ///
    /// Hotspot changes are applied incrementally; anything structural
    /// (binds, cycles, menus, layers) reloads its whole stage.
    pub fn load_profile_changes(&mut self, profile: &Profile) {
        let changed = profile.changed_sections().clone();
        if changed.is_empty() {
            return;
        }
        let mut reload_structural = false;
        for (section, keys) in &changed {
            if section.eq_ignore_ascii_case("hotspots") {
                for key in keys {
                    let value = profile.get_str(section, key, "");
                    self.hotspots.apply_property(key, &value, &mut self.errors);
                }
                self.mark_menu_hotspots_changed();
            } else if section.eq_ignore_ascii_case("variables") {
                // Re-expansion may have touched anything.
                reload_structural = true;
            } else {
                reload_structural = true;
            }
        }
        if reload_structural {
            debug!("structural profile change: reloading input map");
            let mut fresh = Self::new();
            fresh.load_profile(profile);
            fresh.cycle_state = std::mem::take(&mut self.cycle_state);
            for (idx, cycle) in fresh.cycles.iter().enumerate() {
                fresh.cycle_state.clamp_to(CycleId(idx as u16), cycle.len());
            }
            *self = fresh;
        }
    }

    fn mark_menu_hotspots_changed(&mut self) {
        for menu in &mut self.menus {
            if menu
                .items
                .iter()
                .any(|item| self.hotspots.changed.test(item.hotspot.index()))
            {
                menu.hotspots_changed = true;
            }
        }
    }

    // ── Hotspots stage ──────────────────────────────────────────────

    fn load_hotspots(&mut self, profile: &Profile) {
        let Some(section) = profile.section_by_name("Hotspots") else {
            return;
        };
        let props: Vec<(String, String)> = section
            .iter()
            .map(|(k, p)| (k.to_string(), p.value.clone()))
            .collect();
        for (key, _) in &props {
            self.hotspots.declare_key(key, &mut self.errors);
        }
        self.hotspots.allocate(&mut self.errors);
        for (key, value) in &props {
            self.hotspots.apply_property(key, value, &mut self.errors);
        }
    }

    // ── Key binds stage ─────────────────────────────────────────────

    fn load_keybinds(&mut self, profile: &Profile) {
        let Some(section) = profile.section_by_name("KeyBinds") else {
            return;
        };
        let props: Vec<(String, String)> = section
            .iter()
            .map(|(k, p)| (k.to_string(), p.value.clone()))
            .collect();
        // Names first so binds can reference each other in any order.
        for (key, _) in &props {
            self.add_keybind_name(key);
        }
        for (key, value) in &props {
            let idx = self.keybind_index[&key.to_ascii_lowercase()];
            let cmd = parse_keybind_command(self, value);
            self.keybind_commands[idx] = cmd;
        }
        self.validate_keybinds();
    }

    fn add_keybind_name(&mut self, name: &str) -> usize {
        let lower = name.to_ascii_lowercase();
        if let Some(&idx) = self.keybind_index.get(&lower) {
            return idx;
        }
        self.keybind_names.push(name.to_string());
        self.keybind_commands.push(Command::Empty);
        let idx = self.keybind_names.len() - 1;
        self.keybind_index.insert(lower, idx);
        idx
    }

    /// Demotes any bind that can re-enter itself through trigger edges.
    fn validate_keybinds(&mut self) {
        let count = self.keybind_commands.len();
        for start in 0..count {
            let mut visited = BitSet::with_capacity(count);
            let mut frontier = vec![start];
            let mut cyclic = false;
            while let Some(bind) = frontier.pop() {
                for next in self.trigger_edges(self.keybind_commands[bind]) {
                    if next == start {
                        cyclic = true;
                        frontier.clear();
                        break;
                    }
                    if !visited.test(next) {
                        visited.set(next);
                        frontier.push(next);
                    }
                }
            }
            if cyclic {
                self.errors.push(format!(
                    "key bind '{}' triggers itself through a chain; disabling it",
                    self.keybind_names[start]
                ));
                self.keybind_commands[start] = Command::DoNothing;
            }
        }
    }

    fn trigger_edges(&self, cmd: Command) -> Vec<usize> {
        match cmd {
            Command::TriggerKeyBind { bind } => vec![bind.index()],
            Command::VkSequence { string } => decode_sequence(self.string_bytes(string))
                .into_iter()
                .filter_map(|t| match t {
                    SeqToken::TriggerKeyBind(idx) => Some(usize::from(idx)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    // ── Cycles stage ────────────────────────────────────────────────

    fn load_cycles(&mut self, profile: &Profile) {
        let Some(section) = profile.section_by_name("KeyBindCycles") else {
            return;
        };
        let props: Vec<(String, String)> = section
            .iter()
            .map(|(k, p)| (k.to_string(), p.value.clone()))
            .collect();
        for (name, list) in &props {
            self.apply_cycle_property(name, list);
        }
        self.cycle_state.ensure_len(self.cycles.len());
    }

    fn apply_cycle_property(&mut self, name: &str, list: &str) {
        let mut entries: Vec<CycleEntry> = Vec::new();
        let mut max_len = usize::from(u16::MAX);
        let mut min_len = 1usize;
        let mut body = list.trim();

        // An "N:" prefix pins the cycle length.
        if let Some((head, tail)) = body.split_once(':') {
            if let Ok(len) = head.trim().parse::<i32>() {
                if len <= 0 {
                    self.errors
                        .push(format!("{name}: specified length ({len}) must be >= 1"));
                    max_len = 1;
                } else {
                    max_len = len as usize;
                }
                min_len = max_len;
                body = tail.trim();
            }
        }

        for part in body.split(',') {
            if entries.len() >= max_len {
                break;
            }
            let part = part.trim();
            if part.is_empty() {
                entries.push(CycleEntry::default());
                continue;
            }
            if let Some(&idx) = self.keybind_index.get(&part.to_ascii_lowercase()) {
                entries.push(CycleEntry {
                    bind: Some(KeyBindId(idx as u16)),
                    hotspot: HotspotId(0),
                });
                continue;
            }
            // Range form: "TargetGroup1-5" expands to the numbered binds.
            let (base, start, end, is_range) = fetch_range_suffix(part);
            if is_range {
                let mut ok = true;
                for i in start..=end {
                    if entries.len() >= max_len {
                        break;
                    }
                    let bind_name = format!("{base}{i}");
                    match self.keybind_index.get(&bind_name.to_ascii_lowercase()) {
                        Some(&idx) => entries.push(CycleEntry {
                            bind: Some(KeyBindId(idx as u16)),
                            hotspot: HotspotId(0),
                        }),
                        None => {
                            self.errors.push(format!(
                                "cannot find key bind '{bind_name}' for cycle '{name}'"
                            ));
                            ok = false;
                            break;
                        }
                    }
                }
                if ok {
                    continue;
                }
                break;
            }
            self.errors
                .push(format!("cannot find key bind '{part}' for cycle '{name}'"));
            break;
        }
        if entries.len() < min_len {
            entries.resize(min_len.min(max_len), CycleEntry::default());
        }

        // A hotspot sharing a bind's name links to that entry.
        for entry in &mut entries {
            if let Some(bind) = entry.bind {
                let bind_name = &self.keybind_names[bind.index()];
                if let Some(id) = self.hotspots.hotspot_id(bind_name) {
                    entry.hotspot = id;
                }
            }
        }

        let lower = name.to_ascii_lowercase();
        let idx = match self.cycle_index.get(&lower) {
            Some(&i) => i,
            None => {
                self.cycles.push(KeyBindCycle::default());
                let i = self.cycles.len() - 1;
                self.cycle_index.insert(lower, i);
                i
            }
        };
        self.cycles[idx] = KeyBindCycle {
            name: name.to_string(),
            entries,
        };
        self.cycle_state
            .clamp_to(CycleId(idx as u16), self.cycles[idx].len());
    }

    // ── Menus stage ─────────────────────────────────────────────────

    fn load_menus(&mut self, profile: &Profile) {
        let section_ids = profile.sections_with_prefix("Menu.");
        // Create every menu (and implicit ancestors) before parsing any
        // property so sub-menu names resolve regardless of order.
        for &sid in &section_ids {
            let name = profile.section(sid).expect("listed").name.clone();
            self.create_menu_path(&name);
        }
        for &sid in &section_ids {
            let section = profile.section(sid).expect("listed");
            let section_name = section.name.clone();
            let Some(&menu_idx) = self.menu_index.get(&section_name.to_ascii_lowercase()) else {
                continue;
            };
            let props: Vec<(String, String)> = section
                .iter()
                .map(|(k, p)| (k.to_string(), p.value.clone()))
                .collect();
            self.parse_scope_menu = Some(MenuId(menu_idx as u16));
            for (key, value) in &props {
                self.apply_menu_property(MenuId(menu_idx as u16), key, value);
            }
            self.parse_scope_menu = None;
        }
        for idx in 0..self.menus.len() {
            self.validate_menu(MenuId(idx as u16));
        }
    }

    fn create_menu_path(&mut self, section_name: &str) -> Option<usize> {
        let lower = section_name.to_ascii_lowercase();
        if let Some(&idx) = self.menu_index.get(&lower) {
            return Some(idx);
        }
        let rest = section_name.get("Menu.".len()..)?;
        if rest.is_empty() {
            return None;
        }
        let parent = match rest.rfind('.') {
            Some(dot) => {
                let parent_section = format!("Menu.{}", &rest[..dot]);
                Some(MenuId(self.create_menu_path(&parent_section)? as u16))
            }
            None => None,
        };
        let leaf = rest.rsplit('.').next().unwrap_or(rest).to_string();
        let idx = self.menus.len();
        let root = match parent {
            Some(p) => self.menus[p.index()].root,
            None => MenuId(idx as u16),
        };
        let overlay = match parent {
            Some(p) => self.menus[p.index()].overlay,
            None => {
                self.overlay_roots.push(MenuId(idx as u16));
                OverlayId((self.overlay_roots.len() - 1) as u16)
            }
        };
        self.menus.push(Menu {
            name: leaf,
            section: section_name.to_string(),
            parent,
            root,
            overlay,
            ..Menu::default()
        });
        self.menu_index.insert(lower, idx);
        Some(idx)
    }

    fn apply_menu_property(&mut self, menu: MenuId, key: &str, value: &str) {
        match key.to_ascii_lowercase().as_str() {
            "style" => {
                match MenuStyle::from_name(value.trim()) {
                    Some(style) => self.menus[menu.index()].style = style,
                    None => {
                        self.errors.push(format!(
                            "{}: unknown menu style '{}'",
                            self.menus[menu.index()].section,
                            value
                        ));
                    }
                }
                return;
            }
            "gridwidth" => {
                self.menus[menu.index()].grid_width =
                    value.trim().parse::<i32>().unwrap_or(0).clamp(0, 255) as u8;
                return;
            }
            "gridheight" => {
                self.menus[menu.index()].grid_height =
                    value.trim().parse::<i32>().unwrap_or(0).clamp(0, 255) as u8;
                return;
            }
            "default" => {
                let idx = value.trim().parse::<i32>().unwrap_or(1).max(1) - 1;
                self.menus[menu.index()].default_item = idx as u16;
                return;
            }
            "keybindcycle" => {
                match self.cycle_index.get(&value.trim().to_ascii_lowercase()) {
                    Some(&idx) => {
                        self.menus[menu.index()].cycle = Some(CycleId(idx as u16));
                    }
                    None => self.errors.push(format!(
                        "{}: unknown key bind cycle '{}'",
                        self.menus[menu.index()].section,
                        value
                    )),
                }
                return;
            }
            "position" => {
                match self.hotspots.hotspot_id(value.trim()) {
                    Some(id) => self.menus[menu.index()].origin_hotspot = id,
                    None => self.errors.push(format!(
                        "{}: unknown position hotspot '{}'",
                        self.menus[menu.index()].section,
                        value
                    )),
                }
                return;
            }
            "auto" => {
                let cmd = self.parse_menu_command(value);
                self.menus[menu.index()].auto_command = cmd;
                return;
            }
            "back" => {
                let cmd = self.parse_menu_command(value);
                self.menus[menu.index()].back_command = cmd;
                return;
            }
            _ => {}
        }

        // Directional items.
        let dir = match key.to_ascii_lowercase().as_str() {
            "l" | "left" => Some(Dir4::Left),
            "r" | "right" => Some(Dir4::Right),
            "u" | "up" => Some(Dir4::Up),
            "d" | "down" => Some(Dir4::Down),
            _ => None,
        };
        if let Some(dir) = dir {
            let item = self.parse_menu_item(menu, value);
            self.menus[menu.index()].dir_items[dir.index()] = item;
            return;
        }

        // Numbered (or hotspot-named) items.
        match self.menu_item_slot(menu, key) {
            Some(slot) => {
                let item = self.parse_menu_item(menu, value);
                let existing = &mut self.menus[menu.index()].items[slot];
                let hotspot = existing.hotspot;
                *existing = item;
                if existing.hotspot.0 == 0 {
                    existing.hotspot = hotspot;
                }
                self.menus[menu.index()].hotspots_changed = true;
            }
            None => {
                self.errors.push(format!(
                    "{}: '{}' is neither an item number nor a hotspot",
                    self.menus[menu.index()].section,
                    key
                ));
            }
        }
    }

    /// Resolves a menu property key to an item slot, growing the item list.
    fn menu_item_slot(&mut self, menu: MenuId, key: &str) -> Option<usize> {
        if let Ok(n) = key.trim().parse::<usize>() {
            if n == 0 {
                return None;
            }
            let items = &mut self.menus[menu.index()].items;
            if n > items.len() {
                items.resize_with(n, MenuItem::default);
            }
            return Some(n - 1);
        }
        let hotspot = self.hotspots.hotspot_id(key)?;
        let items = &mut self.menus[menu.index()].items;
        if let Some(i) = items.iter().position(|item| item.hotspot == hotspot) {
            return Some(i);
        }
        items.push(MenuItem {
            hotspot,
            ..MenuItem::default()
        });
        Some(items.len() - 1)
    }

    fn parse_menu_command(&mut self, value: &str) -> Command {
        parse_command(self, value, ParseFlags::default())
    }

    /// Parses one menu item value: `Label: command`, `Label|Alt: command`,
    /// a bare sub-menu name, `..`/`Back`, or `Close`.
    fn parse_menu_item(&mut self, menu: MenuId, value: &str) -> MenuItem {
        let root = self.menus[menu.index()].root;
        let value = value.trim();
        let mut item = MenuItem::default();
        if value.is_empty() {
            return item;
        }

        let (label_only, label_part, mut rest) = match value.split_once(':') {
            Some((label, rest)) => (false, label.trim().to_string(), rest.trim().to_string()),
            None => (true, String::new(), value.to_string()),
        };
        if !label_part.is_empty() {
            match label_part.split_once('|') {
                Some((main, alt)) => {
                    item.label = main.trim().to_string();
                    item.alt_label = alt.trim().to_string();
                }
                None => item.label = label_part,
            }
        }
        item.command = Command::Unassigned;
        if rest.is_empty() {
            return item;
        }

        let lower = rest.to_ascii_lowercase();
        if rest == ".." || lower == "back" {
            item.command = Command::MenuBack { menu: root };
            return item;
        }
        if lower == "close" {
            item.command = Command::MenuClose { menu: root };
            return item;
        }
        if lower == "nothing" {
            item.command = Command::DoNothing;
            return item;
        }
        if matches!(lower.as_str(), "skip" | "empty" | "none" | "blank") {
            item.command = Command::Empty;
            return item;
        }

        if label_only || rest.starts_with('.') {
            // A sub-menu transfer, optionally with an initial item
            // ("SubMenu, 3").
            let mut initial_item = 0u16;
            let mut target = self.resolve_menu_name(&rest);
            if target.is_none() {
                if let Some((head, param)) = rest.rsplit_once(',') {
                    let head = head.trim().to_string();
                    if let Some(sub) = self.resolve_menu_name(&head) {
                        if let Some(slot) = self.menu_item_slot(sub, param.trim()) {
                            initial_item = (slot + 1) as u16;
                            target = Some(sub);
                            rest = head;
                        }
                    }
                }
            }
            match target {
                Some(sub) => {
                    item.command = Command::OpenSubMenu {
                        menu: sub,
                        item: initial_item,
                    };
                    if item.label.is_empty() && !rest.starts_with('.') {
                        item.label = rest.clone();
                    }
                }
                None => {
                    self.errors.push(format!(
                        "'{rest}' looks like a sub-menu but none matches; treating as a label"
                    ));
                    item.command = Command::Unassigned;
                    if item.label.is_empty() {
                        item.label = rest.clone();
                    }
                }
            }
            return item;
        }

        let errors_before = self.errors.total();
        item.command = parse_command(self, &rest, ParseFlags::default());
        if item.command == Command::DoNothing && self.errors.total() > errors_before {
            // Unrecognized: likely a plain string missing its chat marker.
            let chat = format!(">{rest}");
            item.command = parse_command(self, &chat, ParseFlags::default());
        }
        item
    }

    fn validate_menu(&mut self, menu: MenuId) {
        let is_root = self.menus[menu.index()].root == menu;
        let style = self.menus[menu.index()].style;
        if style.root_only() && !is_root {
            self.errors.push(format!(
                "{}: style {:?} is only valid on root menus; using List",
                self.menus[menu.index()].section,
                style
            ));
            self.menus[menu.index()].style = MenuStyle::List;
        }
        let style = self.menus[menu.index()].style;
        if style.requires_cycle() && self.menus[menu.index()].cycle.is_none() {
            self.errors.push(format!(
                "{}: style {:?} requires a KeyBindCycle property; using List",
                self.menus[menu.index()].section,
                style
            ));
            self.menus[menu.index()].style = MenuStyle::List;
        }
        let style = self.menus[menu.index()].style;
        if matches!(
            style,
            MenuStyle::List
                | MenuStyle::Bar
                | MenuStyle::Grid
                | MenuStyle::Columns
                | MenuStyle::Slots
        ) {
            // Trailing empty items are trimmed; interior ones are holes.
            let menu_ref = &mut self.menus[menu.index()];
            while menu_ref.items.last().is_some_and(MenuItem::is_empty) {
                menu_ref.items.pop();
            }
            let section = menu_ref.section.clone();
            let holes: Vec<usize> = menu_ref
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.is_empty())
                .map(|(i, _)| i + 1)
                .collect();
            for hole in holes {
                self.errors
                    .push(format!("{section}: menu item {hole} is missing"));
            }
        }
    }

    // ── Layers stage ────────────────────────────────────────────────

    fn load_layers(&mut self, profile: &Profile) {
        // The base scheme is layer 0, then each Layer.* section in order.
        let mut sections: Vec<(String, String)> = Vec::new();
        if profile.section_by_name("Scheme").is_some() {
            sections.push(("Scheme".to_string(), "Scheme".to_string()));
        } else {
            // Always have a base layer, even with no [Scheme] section.
            sections.push(("Scheme".to_string(), String::new()));
        }
        for sid in profile.sections_with_prefix("Layer.") {
            let section = profile.section(sid).expect("listed");
            let layer_name = section.name["Layer.".len()..].to_string();
            if !layer_name.is_empty() {
                sections.push((layer_name, section.name.clone()));
            }
        }

        for (layer_name, _) in &sections {
            self.add_layer_name(layer_name);
        }
        // Link combos; linking may append synthesized placeholder combos,
        // which the loop then reaches and links in turn.
        let mut idx = 0;
        while idx < self.layers.len() {
            self.link_combo_layer(idx);
            idx += 1;
        }

        for (layer_name, section_name) in &sections {
            if section_name.is_empty() {
                continue;
            }
            let layer_idx = self.layer_index[&layer_name.to_ascii_lowercase()];
            let Some(section) = profile.section_by_name(section_name) else {
                continue;
            };
            let props: Vec<(String, String)> = section
                .iter()
                .map(|(k, p)| (k.to_string(), p.value.clone()))
                .collect();
            for (key, value) in &props {
                self.apply_layer_property(layer_idx, key, value);
            }
        }

        for idx in 0..self.layers.len() {
            for cleared in validate_layer(&mut self.layers, LayerId(idx as u16)) {
                self.errors.push(format!(
                    "layer '{}' closes a parent cycle; clearing its parent link",
                    self.layers[cleared.index()].name
                ));
            }
        }
    }

    fn add_layer_name(&mut self, name: &str) -> usize {
        let lower = name.to_ascii_lowercase();
        if let Some(&idx) = self.layer_index.get(&lower) {
            return idx;
        }
        self.layers.push(ControlsLayer {
            name: name.to_string(),
            pending_combo: name.contains(COMBO_DELIMITER),
            ..ControlsLayer::default()
        });
        let idx = self.layers.len() - 1;
        self.layer_index.insert(lower, idx);
        idx
    }

    fn link_combo_layer(&mut self, idx: usize) {
        if !self.layers[idx].pending_combo {
            return;
        }
        self.layers[idx].pending_combo = false;
        let full_name = self.layers[idx].name.clone();
        let Some((first_name, second_name)) = full_name.split_once(COMBO_DELIMITER) else {
            return;
        };
        if first_name.is_empty() || second_name.is_empty() {
            return;
        }
        let Some(&first) = self.layer_index.get(&first_name.to_ascii_lowercase()) else {
            self.errors.push(format!(
                "base layer '{first_name}' not found for combo layer '{full_name}'"
            ));
            return;
        };
        let second = match self.layer_index.get(&second_name.to_ascii_lowercase()) {
            Some(&i) => i,
            None => {
                // The second segment may itself be a combo that was never
                // declared; synthesize it so N-way combos chain.
                if !second_name.contains(COMBO_DELIMITER) {
                    self.errors.push(format!(
                        "base layer '{second_name}' not found for combo layer '{full_name}'"
                    ));
                    return;
                }
                self.add_layer_name(second_name)
            }
        };
        if first == second {
            self.errors.push(format!(
                "combo layer '{full_name}' names the same layer twice"
            ));
            return;
        }
        self.layers[idx].parent = Some(LayerId(first as u16));
        self.layers[idx].combo_parent = Some(LayerId(second as u16));
    }

    #[allow(clippy::too_many_lines)]
    fn apply_layer_property(&mut self, layer_idx: usize, key: &str, value: &str) {
        let lower_key = key.to_ascii_lowercase();
        match lower_key.as_str() {
            "parent" => {
                match self.layer_index.get(&value.trim().to_ascii_lowercase()) {
                    Some(&parent) if parent != layer_idx => {
                        self.layers[layer_idx].parent = Some(LayerId(parent as u16));
                    }
                    _ => self.errors.push(format!(
                        "layer '{}': unknown parent layer '{}'",
                        self.layers[layer_idx].name, value
                    )),
                }
                return;
            }
            "priority" => {
                self.layers[layer_idx].priority = value.trim().parse().unwrap_or(0);
                return;
            }
            "mousemode" => {
                self.layers[layer_idx].mouse_mode = match value.trim().to_ascii_lowercase().as_str()
                {
                    "cursor" => Some(MouseMode::Cursor),
                    "mouselook" | "look" => Some(MouseMode::MouseLook),
                    "hidden" | "hide" => Some(MouseMode::Hidden),
                    "" | "default" => None,
                    other => {
                        self.errors.push(format!(
                            "layer '{}': unknown mouse mode '{other}'",
                            self.layers[layer_idx].name
                        ));
                        None
                    }
                };
                return;
            }
            "showoverlays" | "hideoverlays" => {
                let show = lower_key.as_str() == "showoverlays";
                let mut mask = BitSet::new();
                for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match self.overlay_for_root_name(name) {
                        Some(overlay) => mask.set(overlay.index()),
                        None => self.errors.push(format!(
                            "layer '{}': unknown overlay menu '{name}'",
                            self.layers[layer_idx].name
                        )),
                    }
                }
                if show {
                    self.layers[layer_idx].show_overlays = mask;
                } else {
                    self.layers[layer_idx].hide_overlays = mask;
                }
                return;
            }
            "enablehotspots" | "disablehotspots" => {
                let enable = lower_key.as_str() == "enablehotspots";
                let mut mask = BitSet::new();
                for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match self.hotspots.array_id(name) {
                        Some(array) => mask.set(array),
                        None => self.errors.push(format!(
                            "layer '{}': unknown hotspot array '{name}'",
                            self.layers[layer_idx].name
                        )),
                    }
                }
                if enable {
                    self.layers[layer_idx].enable_arrays = mask;
                } else {
                    self.layers[layer_idx].disable_arrays = mask;
                }
                return;
            }
            "autoadd" | "autoremove" => {
                let add = lower_key.as_str() == "autoadd";
                let mut ids = Vec::new();
                for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match self.layer_index.get(&name.to_ascii_lowercase()) {
                        Some(&idx) => ids.push(LayerId(idx as u16)),
                        None => self.errors.push(format!(
                            "layer '{}': unknown layer '{name}'",
                            self.layers[layer_idx].name
                        )),
                    }
                }
                if add {
                    self.layers[layer_idx].auto_add = ids;
                } else {
                    self.layers[layer_idx].auto_remove = ids;
                }
                return;
            }
            _ => {}
        }

        if let Some(signal_name) = strip_prefix_ci(key, "when ") {
            self.apply_when_signal(layer_idx, signal_name.trim(), value);
            return;
        }
        if let Some(remap_name) = strip_prefix_ci(key, "remap") {
            let Some(from) = PadButton::from_name(remap_name.trim()) else {
                self.errors.push(format!(
                    "layer '{}': unknown remap source button '{remap_name}'",
                    self.layers[layer_idx].name
                ));
                return;
            };
            let Some(to) = PadButton::from_name(value.trim()) else {
                self.errors.push(format!(
                    "layer '{}': unknown remap target button '{value}'",
                    self.layers[layer_idx].name
                ));
                return;
            };
            self.layers[layer_idx].remap.insert(from, to);
            return;
        }

        self.apply_button_action(layer_idx, key, value);
    }

    fn apply_when_signal(&mut self, layer_idx: usize, name: &str, value: &str) {
        let mut signals = Vec::new();
        if let Some(&bind) = self.keybind_index.get(&name.to_ascii_lowercase()) {
            signals.push(BUTTON_COUNT + bind as u16);
        } else {
            // An array name fires one signal per numbered bind.
            let prefix = name.to_ascii_lowercase();
            for (bind_name, &idx) in &self.keybind_index {
                if let Some(tail) = bind_name.strip_prefix(&prefix) {
                    if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
                        signals.push(BUTTON_COUNT + idx as u16);
                    }
                }
            }
        }
        if signals.is_empty() {
            self.errors.push(format!(
                "layer '{}': no key bind matches signal '{name}'",
                self.layers[layer_idx].name
            ));
            return;
        }
        let cmd = parse_command(
            self,
            value,
            ParseFlags {
                allow_button_actions: true,
                allow_hold_actions: false,
                allow_4dir_actions: false,
            },
        );
        for signal in signals {
            let layer = &mut self.layers[layer_idx];
            match layer.signals.iter_mut().find(|(s, _)| *s == signal) {
                Some(slot) => slot.1 = cmd,
                None => layer.signals.push((signal, cmd)),
            }
        }
    }

    fn apply_button_action(&mut self, layer_idx: usize, key: &str, value: &str) {
        let (phase, rest) = split_phase_prefix(key.trim());
        let (base, mut hold_time) = split_time_suffix(rest);
        let mut button = PadButton::from_name(base);
        if button.is_none() {
            // The digits may belong to the button name itself (L2, R3):
            // re-absorb them one at a time until a button matches.
            for split in base.len() + 1..=rest.len() {
                if let Some(b) = PadButton::from_name(&rest[..split]) {
                    button = Some(b);
                    hold_time = rest[split..].parse().ok();
                    break;
                }
            }
        }
        let Some(button) = button else {
            self.errors.push(format!(
                "layer '{}': cannot identify a gamepad button in '{key}'",
                self.layers[layer_idx].name
            ));
            return;
        };

        if button.is_multi_dir() {
            // Expand over the four member buttons, appending the direction
            // word so directional templates ("Move", "Hotspot") resolve.
            for dir in Dir4::ALL {
                let member = button.member_for_dir(dir).expect("multi-dir");
                let dir_word = match dir {
                    Dir4::Left => "Left",
                    Dir4::Right => "Right",
                    Dir4::Up => "Up",
                    Dir4::Down => "Down",
                };
                let attempt = format!("{value} {dir_word}");
                let mut cmd = parse_command(
                    self,
                    &attempt,
                    ParseFlags {
                        allow_button_actions: true,
                        allow_hold_actions: phase == ButtonPhase::Down,
                        allow_4dir_actions: true,
                    },
                );
                if !cmd.takes_effect() {
                    cmd = parse_command(
                        self,
                        value,
                        ParseFlags {
                            allow_button_actions: true,
                            allow_hold_actions: phase == ButtonPhase::Down,
                            allow_4dir_actions: false,
                        },
                    );
                }
                self.assign_button_command(layer_idx, member, phase, cmd, hold_time);
            }
            return;
        }

        let cmd = parse_command(
            self,
            value,
            ParseFlags {
                allow_button_actions: true,
                allow_hold_actions: phase == ButtonPhase::Down,
                allow_4dir_actions: false,
            },
        );
        self.assign_button_command(layer_idx, button, phase, cmd, hold_time);
    }

    fn assign_button_command(
        &mut self,
        layer_idx: usize,
        button: PadButton,
        phase: ButtonPhase,
        cmd: Command,
        hold_time: Option<u32>,
    ) {
        let layer = &mut self.layers[layer_idx];
        if cmd == Command::Empty {
            // An explicit empty clears the phase, dropping the entry when
            // nothing else remains bound.
            if let Some(actions) = layer.buttons.get_mut(&button) {
                actions.commands[phase.index()] = Command::Unassigned;
                if actions.is_vacant() {
                    layer.buttons.remove(&button);
                }
            }
            return;
        }
        let actions = layer.buttons.entry(button).or_default();
        // Assigning any phase masks the others from lower layers.
        for slot in &mut actions.commands {
            if slot.is_placeholder() {
                *slot = Command::Unassigned;
            }
        }
        actions.commands[phase.index()] = cmd;
        if phase == ButtonPhase::Hold {
            actions.hold_time_ms = hold_time.unwrap_or(0);
        }
    }

    // ── Name resolution ─────────────────────────────────────────────

    /// Resolves a menu name relative to the current parse scope: `.Sub`
    /// under the scope menu, then a sibling/child, then a root name, then
    /// any unique leaf.
    fn resolve_menu_name(&self, name: &str) -> Option<MenuId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(scope) = self.parse_scope_menu {
            let scope_section = &self.menus[scope.index()].section;
            let candidate = if let Some(rel) = name.strip_prefix('.') {
                format!("{scope_section}.{rel}")
            } else {
                format!("{scope_section}.{name}")
            };
            if let Some(&idx) = self.menu_index.get(&candidate.to_ascii_lowercase()) {
                return Some(MenuId(idx as u16));
            }
        }
        if name.starts_with('.') {
            return None;
        }
        if let Some(&idx) = self.menu_index.get(&format!("menu.{name}").to_ascii_lowercase()) {
            return Some(MenuId(idx as u16));
        }
        self.menus
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
            .map(|idx| MenuId(idx as u16))
    }

    fn overlay_for_root_name(&self, name: &str) -> Option<OverlayId> {
        let menu = self.resolve_menu_name(name)?;
        let menu = &self.menus[menu.index()];
        if menu.root.index() < self.menus.len() {
            Some(self.menus[menu.root.index()].overlay)
        } else {
            None
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn keybind_count(&self) -> usize {
        self.keybind_commands.len()
    }

    #[must_use]
    pub fn keybind_command(&self, bind: KeyBindId) -> Command {
        self.keybind_commands
            .get(bind.index())
            .copied()
            .unwrap_or(Command::Empty)
    }

    #[must_use]
    pub fn keybind_name(&self, bind: KeyBindId) -> &str {
        self.keybind_names
            .get(bind.index())
            .map_or("", String::as_str)
    }

    /// Signal ID for a key bind (`button_count + bind_index`).
    #[must_use]
    pub fn keybind_signal(&self, bind: KeyBindId) -> u16 {
        BUTTON_COUNT + bind.0
    }

    #[must_use]
    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    #[must_use]
    pub fn cycle(&self, cycle: CycleId) -> Option<&KeyBindCycle> {
        self.cycles.get(cycle.index())
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn layer(&self, layer: LayerId) -> Option<&ControlsLayer> {
        self.layers.get(layer.index())
    }

    #[must_use]
    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.layer_index
            .get(&name.to_ascii_lowercase())
            .map(|&i| LayerId(i as u16))
    }

    /// The command for a button phase, falling back through the layer's
    /// parent chain.
    #[must_use]
    pub fn layer_button_command(
        &self,
        layer: LayerId,
        button: PadButton,
        phase: ButtonPhase,
    ) -> Command {
        let mut current = Some(layer);
        let mut guard = 0;
        while let Some(id) = current {
            if guard > self.layers.len() {
                break;
            }
            guard += 1;
            let Some(def) = self.layer(id) else { break };
            if let Some(actions) = def.buttons.get(&button) {
                let cmd = actions.commands[phase.index()];
                if cmd != Command::Empty {
                    return cmd;
                }
            }
            current = def.parent;
        }
        Command::Empty
    }

    /// Hold time for a button's `Hold` phase, walking parents like the
    /// command lookup.
    #[must_use]
    pub fn layer_button_hold_time(&self, layer: LayerId, button: PadButton) -> u32 {
        let mut current = Some(layer);
        let mut guard = 0;
        while let Some(id) = current {
            if guard > self.layers.len() {
                break;
            }
            guard += 1;
            let Some(def) = self.layer(id) else { break };
            if let Some(actions) = def.buttons.get(&button) {
                if actions.hold_time_ms > 0 {
                    return actions.hold_time_ms;
                }
            }
            current = def.parent;
        }
        0
    }

    /// The layer's remap of a button, if any (checked on the layer only,
    /// not its parents).
    #[must_use]
    pub fn remapped_button(&self, layer: LayerId, button: PadButton) -> PadButton {
        self.layer(layer)
            .and_then(|d| d.remap.get(&button).copied())
            .unwrap_or(button)
    }

    #[must_use]
    pub fn menu_count(&self) -> usize {
        self.menus.len()
    }

    #[must_use]
    pub fn menu(&self, menu: MenuId) -> Option<&Menu> {
        self.menus.get(menu.index())
    }

    #[must_use]
    pub fn menu_mut(&mut self, menu: MenuId) -> Option<&mut Menu> {
        self.menus.get_mut(menu.index())
    }

    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlay_roots.len()
    }

    #[must_use]
    pub fn overlay_root(&self, overlay: OverlayId) -> Option<MenuId> {
        self.overlay_roots.get(overlay.index()).copied()
    }

    #[must_use]
    pub fn root_menu_of(&self, menu: MenuId) -> MenuId {
        self.menu(menu).map_or(menu, |m| m.root)
    }

    #[must_use]
    pub fn menu_item_count(&self, menu: MenuId) -> usize {
        self.menu(menu).map_or(0, |m| m.items.len())
    }

    #[must_use]
    pub fn menu_item_hotspot(&self, menu: MenuId, item: usize) -> HotspotId {
        self.menu(menu)
            .and_then(|m| m.items.get(item))
            .map_or(HotspotId(0), |i| i.hotspot)
    }

    #[must_use]
    pub fn string_bytes(&self, string: StringId) -> &[u8] {
        self.strings
            .get(string.index())
            .map_or(&[], Vec::as_slice)
    }

    /// The dispatchable byte sequence behind a key bind, if it has one.
    #[must_use]
    pub fn keybind_sequence(&self, bind: KeyBindId) -> Option<Vec<u8>> {
        match self.keybind_command(bind) {
            Command::TapKey { combo } => Some(combo.to_sequence_bytes()),
            Command::VkSequence { string } => Some(self.string_bytes(string).to_vec()),
            Command::TriggerKeyBind { bind } => self.keybind_sequence(bind),
            _ => None,
        }
    }
}

impl padmux_command::ParseContext for InputMap {
    fn hotspot_id(&self, name: &str) -> Option<HotspotId> {
        self.hotspots.hotspot_id(name)
    }

    fn keybind_id(&self, name: &str) -> Option<KeyBindId> {
        self.keybind_index
            .get(&name.to_ascii_lowercase())
            .map(|&i| KeyBindId(i as u16))
    }

    fn special_movement_command(&self, name: &str) -> Option<Command> {
        let lower = name.to_ascii_lowercase();
        SPECIAL_BINDS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|&(_, cmd)| cmd)
    }

    fn cycle_id(&self, name: &str) -> Option<CycleId> {
        self.cycle_index
            .get(&name.to_ascii_lowercase())
            .map(|&i| CycleId(i as u16))
    }

    fn layer_id(&self, name: &str) -> Option<LayerId> {
        InputMap::layer_id(self, name)
    }

    fn menu_id(&self, name: &str) -> Option<MenuId> {
        self.resolve_menu_name(name)
    }

    fn variable_id(&self, name: &str) -> Option<VariableId> {
        self.variables
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .map(|i| VariableId(i as u16))
    }

    fn intern_bytes(&mut self, bytes: &[u8]) -> StringId {
        if let Some(&idx) = self.string_index.get(bytes) {
            return StringId(idx);
        }
        self.strings.push(bytes.to_vec());
        let idx = (self.strings.len() - 1) as u16;
        self.string_index.insert(bytes.to_vec(), idx);
        StringId(idx)
    }

    fn report_error(&mut self, message: String) {
        self.errors.push(message);
    }
}

impl padmux_dispatch::BindSequences for InputMap {
    fn sequence_for(&self, bind_index: u16) -> Option<Vec<u8>> {
        self.keybind_sequence(KeyBindId(bind_index))
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}
