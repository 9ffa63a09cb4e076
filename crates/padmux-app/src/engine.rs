//! The per-frame engine: owns every subsystem and runs the tick in the
//! required order.
//!
//! Within a tick: profile changes propagate to the input map and then to
//! the dependent caches (hotspot index, menu state, appearance, overlay
//! alpha), gamepad events resolve through the layer stack into commands,
//! commands drive the menus and hotspot index and enqueue key work, the
//! dispatcher drains one key step, and finally overlay alpha and layouts
//! refresh for whatever went dirty. A command issued at tick T reaches the
//! sink no earlier than T.

use std::path::PathBuf;

use padmux_command::Command;
use padmux_core::{
    Dir4, Dir8, HOTSPOT_LAST_CURSOR_POS, HotspotId, KeyBindId, LayerId, MenuId, OverlayId, Size,
};
use padmux_dispatch::{
    DispatcherConfig, InputDispatcher, InputSink, SyntheticEvent, UsLayoutKeyScan,
};
use padmux_hotspots::HotspotMap;
use padmux_map::{ButtonPhase, ControlsStack, InputMap, MenuStyle, PadButton};
use padmux_menus::MenuState;
use padmux_overlay::OverlayStates;
use padmux_paint::{AppearanceCache, LayoutKey, OverlayLayout, compute_overlay_layout};
use padmux_profile::{Profile, ProfileError};
use tracing::{debug, info};

use crate::gamepad::{ButtonTracker, PadEdge, PhaseEvent};

/// Pixels moved per `MoveMouse` command step.
const MOUSE_STEP_PX: i32 = 16;
/// Wheel delta per stepped notch.
const WHEEL_NOTCH: i32 = 120;

/// Guard against pathological command recursion (menu commands yielding
/// menu commands).
const MAX_COMMAND_DEPTH: u32 = 8;

/// Everything the application simulates.
pub struct Engine {
    pub profile: Profile,
    pub profile_path: PathBuf,
    pub map: InputMap,
    pub stack: ControlsStack,
    pub hotspots: HotspotMap,
    pub menus: MenuState,
    pub appearance: AppearanceCache,
    pub overlays: OverlayStates,
    pub dispatcher: InputDispatcher,
    pub tracker: ButtonTracker,
    scan: UsLayoutKeyScan,
    target: Size,
    ui_scale: f64,
    held_layers: Vec<(PadButton, LayerId)>,
    layouts: Vec<Option<(LayoutKey, OverlayLayout)>>,
    quit: bool,
}

impl Engine {
    /// Builds an engine from profile text.
    ///
    /// # Errors
    /// Returns an error when the profile cannot be parsed at all (anything
    /// recoverable lands in the error log instead).
    pub fn from_profile_text(
        text: &str,
        profile_path: PathBuf,
        target: Size,
        ui_scale: f64,
    ) -> Result<Self, ProfileError> {
        let mut profile = Profile::new();
        profile.load_from_str(text)?;

        let mut map = InputMap::new();
        map.load_profile(&profile);

        let mut hotspots = HotspotMap::new(&map, target, ui_scale);
        hotspots.load_profile_changes(
            &mut map,
            profile.get_float("Mouse", "DefaultHotspotDistance", 200.0),
        );

        let menus = MenuState::new(&map);
        let mut appearance = AppearanceCache::default();
        appearance.load(&profile, &map);
        let mut overlays = OverlayStates::new(map.overlay_count());
        for overlay in 0..map.overlay_count() {
            let id = OverlayId(overlay as u16);
            overlays.set_alpha_info(id, appearance.overlay_alpha(&map, id));
        }
        let dispatcher = InputDispatcher::new(dispatcher_config(&profile));
        let layouts = vec![None; map.overlay_count()];

        let mut engine = Self {
            profile,
            profile_path,
            map,
            stack: ControlsStack::new(),
            hotspots,
            menus,
            appearance,
            overlays,
            dispatcher,
            tracker: ButtonTracker::new(),
            scan: UsLayoutKeyScan,
            target,
            ui_scale,
            held_layers: Vec::new(),
            layouts,
            quit: false,
        };
        engine.sync_stack_outputs();
        Ok(engine)
    }

    /// Loads an engine from a profile file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_profile_file(
        path: &PathBuf,
        target: Size,
        ui_scale: f64,
    ) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path).map_err(ProfileError::Read)?;
        Self::from_profile_text(&text, path.clone(), target, ui_scale)
    }

    /// True once a quit command has been executed.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    #[must_use]
    pub fn target_size(&self) -> Size {
        self.target
    }

    pub fn set_target_size(&mut self, target: Size) {
        self.target = target;
    }

    /// The cached layout for an overlay, if computed this tick.
    #[must_use]
    pub fn overlay_layout(&self, overlay: OverlayId) -> Option<&OverlayLayout> {
        self.layouts
            .get(overlay.index())
            .and_then(|slot| slot.as_ref().map(|(_, layout)| layout))
    }

    /// One simulation tick.
    pub fn tick(&mut self, dt_ms: u32, edges: &[PadEdge], sink: &mut dyn InputSink) {
        // 1. Profile changes ripple through the stores and caches.
        if !self.profile.changed_sections().is_empty() {
            self.apply_profile_changes();
        }

        // 2. The hotspot index advances one cooperative step.
        self.hotspots.update(&self.map, self.target, self.ui_scale);

        // 3. Gamepad edges resolve to commands through the layer stack.
        let mut phase_events: Vec<PhaseEvent> = Vec::new();
        for &edge in edges {
            match edge {
                PadEdge::Pressed(button) => phase_events.extend(self.tracker.press(button)),
                PadEdge::Released(button) => phase_events.extend(self.tracker.release(button)),
            }
        }
        let map = &self.map;
        let stack = &self.stack;
        phase_events.extend(self.tracker.update(dt_ms, |button| {
            let top = stack
                .active()
                .last()
                .copied()
                .unwrap_or(LayerId(0));
            map.layer_button_hold_time(top, button)
        }));
        for event in phase_events {
            self.handle_phase_event(event, sink);
        }

        // 4. Menu flash timers.
        self.menus.update(dt_ms);

        // 5. Dispatcher drains one key step and flushes the sink.
        self.dispatcher
            .update(dt_ms, &self.map, &self.scan, sink);

        // 6. Layer-stack outputs: overlay visibility and enabled arrays.
        self.sync_stack_outputs();

        // 7. Overlay alpha and layout refresh.
        for overlay in self.menus.take_dirty() {
            self.overlays.mark_dirty(overlay);
        }
        self.overlays.update(dt_ms);
        self.refresh_layouts();
    }

    fn apply_profile_changes(&mut self) {
        debug!("applying profile changes");
        self.map.load_profile_changes(&self.profile);
        self.hotspots.load_profile_changes(
            &mut self.map,
            self.profile.get_float("Mouse", "DefaultHotspotDistance", 200.0),
        );
        self.menus.load_profile_changes(&self.map);
        self.appearance.load(&self.profile, &self.map);
        self.overlays.resize(self.map.overlay_count());
        for overlay in 0..self.map.overlay_count() {
            let id = OverlayId(overlay as u16);
            self.overlays
                .set_alpha_info(id, self.appearance.overlay_alpha(&self.map, id));
        }
        self.dispatcher.set_config(dispatcher_config(&self.profile));
        self.stack.resort_with(&self.map);
        self.layouts.resize(self.map.overlay_count(), None);
        for slot in &mut self.layouts {
            *slot = None;
        }
        self.profile.clear_changed_sections();
    }

    fn sync_stack_outputs(&mut self) {
        let visible = self.stack.visible_overlays(&self.map);
        for overlay in 0..self.map.overlay_count() {
            self.overlays
                .set_visible(OverlayId(overlay as u16), visible.test(overlay));
        }
        self.hotspots
            .set_enabled_arrays(&self.stack.enabled_arrays(&self.map));
    }

    fn refresh_layouts(&mut self) {
        for overlay_idx in 0..self.map.overlay_count() {
            let overlay = OverlayId(overlay_idx as u16);
            if self.overlays.is_hidden(overlay) {
                continue;
            }
            let key = LayoutKey::of(
                &self.map,
                &self.menus,
                &self.appearance,
                overlay,
                self.target,
                self.ui_scale,
            );
            let slot = &mut self.layouts[overlay_idx];
            let stale = slot.as_ref().is_none_or(|(cached, _)| *cached != key);
            if stale {
                let layout = compute_overlay_layout(
                    &self.map,
                    &self.menus,
                    &self.appearance,
                    overlay,
                    self.target,
                    self.ui_scale,
                );
                *slot = Some((key, layout));
                self.overlays.mark_dirty(overlay);
            }
        }
    }

    fn handle_phase_event(&mut self, event: PhaseEvent, sink: &mut dyn InputSink) {
        // Releasing a button drops any layer it was holding.
        if event.phase == ButtonPhase::Release {
            let mut released = Vec::new();
            self.held_layers.retain(|&(button, layer)| {
                if button == event.button {
                    released.push(layer);
                    false
                } else {
                    true
                }
            });
            for layer in released {
                self.stack.release_held(&self.map, layer);
            }
        }

        let resolved = self.stack.resolve(&self.map, event.button, event.phase);
        match resolved.command {
            Command::HoldControlsLayer { layer } => {
                self.stack.hold(&self.map, layer);
                self.held_layers.push((event.button, layer));
            }
            cmd => self.execute(cmd, resolved.source, sink, 0),
        }
    }

    /// Executes one command. `source` is the layer it came from (for
    /// self-removal).
    #[allow(clippy::too_many_lines)]
    pub fn execute(
        &mut self,
        command: Command,
        source: LayerId,
        sink: &mut dyn InputSink,
        depth: u32,
    ) {
        if depth > MAX_COMMAND_DEPTH {
            self.map
                .errors
                .push("command recursion limit reached".to_string());
            return;
        }
        match command {
            Command::Empty
            | Command::Unassigned
            | Command::DoNothing
            | Command::Invalid
            | Command::Defer => {}

            Command::TapKey { combo } => self.dispatcher.queue_key(combo),
            Command::VkSequence { string } => {
                let bytes = self.map.string_bytes(string).to_vec();
                self.dispatcher.queue_sequence(&bytes);
            }
            Command::TriggerKeyBind { bind } => self.execute_keybind(bind, sink, depth + 1),
            Command::ChatBoxString { string } => {
                let text = String::from_utf8_lossy(self.map.string_bytes(string)).into_owned();
                self.dispatcher.queue_chat(&text);
            }
            Command::SetVariable {
                variable,
                string,
                temporary,
            } => {
                let name = self.map.variable_name(variable).to_string();
                let value =
                    String::from_utf8_lossy(self.map.string_bytes(string)).into_owned();
                if !name.is_empty() {
                    self.profile.set_variable(&name, &value, temporary);
                }
            }

            Command::AddControlsLayer { layer } => self.stack.add(&self.map, layer),
            Command::RemoveControlsLayer { layer, forced } => {
                let target = if layer.0 == 0 { source } else { layer };
                self.stack.remove(&self.map, target, forced);
            }
            Command::ReplaceControlsLayer { old, new } => {
                self.stack.replace(&self.map, old, new);
            }
            Command::HoldControlsLayer { layer } => {
                // Without a button to bind the hold to, treat as add.
                self.stack.add(&self.map, layer);
            }
            Command::ToggleControlsLayer { layer } => self.stack.toggle(&self.map, layer),

            Command::OpenSubMenu { menu, item } => {
                self.menus.open_sub_menu(&self.map, menu, item);
                self.touch_overlay_of(menu);
            }
            Command::OpenSideMenu { menu, dir } => {
                self.menus
                    .open_side_menu(&self.map, &mut self.hotspots, menu, dir);
                self.touch_overlay_of(menu);
            }
            Command::MenuReset { menu } | Command::MenuClose { menu } => {
                self.menus.reset(&self.map, menu);
            }
            Command::MenuConfirm { menu, close } => {
                let flash = self.appearance.flash_time_ms(self.active_menu_of(menu));
                let cmd = self.menus.selected_item_command(&self.map, menu, flash);
                self.touch_overlay_of(menu);
                self.execute(cmd, source, sink, depth + 1);
                if close {
                    self.menus.reset(&self.map, menu);
                }
            }
            Command::MenuBack { menu } => {
                let cmd = self.menus.back_command(&self.map, menu);
                if cmd.takes_effect() {
                    self.execute(cmd, source, sink, depth + 1);
                } else {
                    self.menus.close_active_sub_menu(&self.map, menu);
                }
                self.touch_overlay_of(menu);
            }
            Command::MenuSelect {
                menu,
                dir,
                wrap,
                and_close,
            } => {
                let cmd = self
                    .menus
                    .select(&self.map, &mut self.hotspots, menu, dir, wrap, false);
                self.touch_overlay_of(menu);
                self.execute(cmd, source, sink, depth + 1);
                if and_close {
                    self.menus.reset(&self.map, menu);
                }
            }
            Command::MenuEdit { menu, dir } => {
                // Layout-edit dialogs are external; surface a notice.
                let _ = dir;
                self.map.errors.push(format!(
                    "menu editing for '{}' requires the layout editor",
                    self.map
                        .menu(menu)
                        .map_or("?", |m| m.section.as_str())
                ));
            }

            Command::HotspotSelect { dir, wrap: _ } => {
                let found = self.hotspots.next_hotspot_in_dir(&self.map, dir);
                if found.0 != 0 {
                    self.jump_cursor_to(found, sink);
                }
            }
            Command::MoveTurn { dir } => self.queue_movement_bind(dir, false, sink, depth),
            Command::MoveStrafe { dir } => self.queue_movement_bind(dir, true, sink, depth),
            Command::MoveLook { dir } => {
                let (dx, dy) = dir_step(Dir8::from(dir));
                sink.push(SyntheticEvent::CursorMove { dx, dy });
            }
            Command::StartAutoRun { multi_dir: _ } => {
                if let Some(bind) = padmux_command::ParseContext::keybind_id(&self.map, "AutoRun")
                {
                    self.execute_keybind(bind, sink, depth + 1);
                }
            }
            Command::MoveMouse { dir } => {
                let (dx, dy) = dir_step(dir);
                sink.push(SyntheticEvent::CursorMove { dx, dy });
            }
            Command::MoveMouseToHotspot { hotspot } => self.jump_cursor_to(hotspot, sink),
            Command::MouseWheel { dir, motion, count } => {
                let sign = match dir {
                    Dir4::Up => 1,
                    Dir4::Down => -1,
                    Dir4::Left => -1,
                    Dir4::Right => 1,
                };
                let magnitude = match motion {
                    padmux_command::WheelMotion::Stepped => WHEEL_NOTCH * i32::from(count),
                    padmux_command::WheelMotion::Smooth => i32::from(count).max(1) * 20,
                    padmux_command::WheelMotion::Jump => WHEEL_NOTCH * 3 * i32::from(count),
                };
                sink.push(SyntheticEvent::Wheel {
                    delta: sign * magnitude,
                });
            }

            Command::KeyBindCycleNext { cycle, wrap, count } => {
                self.cycle_step(cycle, true, wrap, count, sink, depth);
            }
            Command::KeyBindCyclePrev { cycle, wrap, count } => {
                self.cycle_step(cycle, false, wrap, count, sink, depth);
            }
            Command::KeyBindCycleLast { cycle } => {
                let len = self.map.cycle(cycle).map_or(0, |c| c.len());
                if let Some(idx) = self.map.cycle_state.last_or_default(cycle, len) {
                    self.fire_cycle_entry(cycle, idx, sink, depth);
                }
            }
            Command::KeyBindCycleReset { cycle } => self.map.cycle_state.reset(cycle),
            Command::KeyBindCycleSetDefault { cycle } => {
                self.map.cycle_state.set_default_to_last(cycle);
            }

            Command::ChangeProfile => {
                self.map
                    .errors
                    .push("profile switching requires the profile picker".to_string());
            }
            Command::EditLayout => {
                self.map
                    .errors
                    .push("layout editing requires the layout editor".to_string());
            }
            Command::ChangeTargetConfigSyncFile => {
                self.map
                    .errors
                    .push("config-sync file selection is external".to_string());
            }
            Command::QuitApp => {
                info!("quit requested");
                self.quit = true;
            }
        }
    }

    fn execute_keybind(&mut self, bind: KeyBindId, sink: &mut dyn InputSink, depth: u32) {
        if depth > MAX_COMMAND_DEPTH {
            return;
        }
        let command = self.map.keybind_command(bind);
        match command {
            Command::TapKey { combo } => self.dispatcher.queue_key(combo),
            Command::VkSequence { string } => {
                let bytes = self.map.string_bytes(string).to_vec();
                self.dispatcher.queue_sequence(&bytes);
            }
            Command::ChatBoxString { string } => {
                let text = String::from_utf8_lossy(self.map.string_bytes(string)).into_owned();
                self.dispatcher.queue_chat(&text);
            }
            Command::TriggerKeyBind { bind: next } => {
                self.execute_keybind(next, sink, depth + 1);
            }
            _ => {}
        }
        // Triggering a bind fires its signal through the layer stack.
        let signal = self.map.keybind_signal(bind);
        if let Some(resolved) = self.stack.resolve_signal(&self.map, signal) {
            self.execute(resolved.command, resolved.source, sink, depth + 1);
        }
    }

    fn cycle_step(
        &mut self,
        cycle: padmux_core::CycleId,
        forward: bool,
        wrap: bool,
        count: i16,
        sink: &mut dyn InputSink,
        depth: u32,
    ) {
        let len = self.map.cycle(cycle).map_or(0, |c| c.len());
        let Some(idx) = self
            .map
            .cycle_state
            .advance(cycle, len, forward, wrap, count.max(1) as u16)
        else {
            return;
        };
        self.fire_cycle_entry(cycle, idx, sink, depth);
    }

    fn fire_cycle_entry(
        &mut self,
        cycle: padmux_core::CycleId,
        idx: u16,
        sink: &mut dyn InputSink,
        depth: u32,
    ) {
        let Some(entry) = self
            .map
            .cycle(cycle)
            .and_then(|c| c.entries.get(usize::from(idx)))
            .copied()
        else {
            return;
        };
        if entry.hotspot.0 != 0 {
            self.jump_cursor_to(entry.hotspot, sink);
        }
        if let Some(bind) = entry.bind {
            self.execute_keybind(bind, sink, depth + 1);
        }
    }

    fn jump_cursor_to(&mut self, hotspot: HotspotId, sink: &mut dyn InputSink) {
        let value = self.map.hotspots.hotspot(hotspot);
        if value.is_zero() {
            return;
        }
        self.map
            .hotspots
            .set_special_hotspot(HOTSPOT_LAST_CURSOR_POS, value);
        sink.push(SyntheticEvent::CursorJump { hotspot });
    }

    fn queue_movement_bind(
        &mut self,
        dir: Dir4,
        strafe: bool,
        sink: &mut dyn InputSink,
        depth: u32,
    ) {
        let name = match (strafe, dir) {
            (false, Dir4::Up) => "MoveF",
            (false, Dir4::Down) => "MoveB",
            (false, Dir4::Left) => "TurnL",
            (false, Dir4::Right) => "TurnR",
            (true, Dir4::Left) => "StrafeL",
            (true, Dir4::Right) => "StrafeR",
            (true, _) => return,
        };
        if let Some(bind) = padmux_command::ParseContext::keybind_id(&self.map, name) {
            self.execute_keybind(bind, sink, depth + 1);
        }
    }

    fn active_menu_of(&self, root: MenuId) -> MenuId {
        let overlay = self.map.menu(root).map_or(OverlayId(0), |m| m.overlay);
        self.menus.active_menu(&self.map, overlay)
    }

    fn touch_overlay_of(&mut self, menu: MenuId) {
        if let Some(overlay) = self.map.menu(menu).map(|m| m.overlay) {
            self.overlays.set_active(overlay);
            self.overlays.mark_dirty(overlay);
        }
    }

    /// True when a menu's style wants full directional navigation.
    #[must_use]
    pub fn menu_uses_link_map(&self, menu: MenuId) -> bool {
        self.map
            .menu(menu)
            .is_some_and(|m| matches!(m.style, MenuStyle::Hotspots | MenuStyle::Highlight))
    }
}

fn dispatcher_config(profile: &Profile) -> DispatcherConfig {
    DispatcherConfig {
        max_task_queued_time: profile.get_int("System", "MaxKeyQueueTime", 1000).max(0) as u32,
        post_first_key_delay: profile.get_int("System", "PostSlashKeyDelay", 0).max(0) as u32,
        mod_release_lock_time: profile.get_int("System", "MinModKeyHoldTime", 0).max(0) as u32,
    }
}

fn dir_step(dir: Dir8) -> (i32, i32) {
    let (dx, dy) = match dir {
        Dir8::Left => (-1, 0),
        Dir8::Right => (1, 0),
        Dir8::Up => (0, -1),
        Dir8::Down => (0, 1),
        Dir8::UpLeft => (-1, -1),
        Dir8::UpRight => (1, -1),
        Dir8::DownLeft => (-1, 1),
        Dir8::DownRight => (1, 1),
    };
    (dx * MOUSE_STEP_PX, dy * MOUSE_STEP_PX)
}
