//! The runtime layer stack: which layers are active and how buttons resolve
//! through them.
//!
//! Layer 0 (the base scheme) is always active and cannot be removed. Layers
//! stack by priority, then recency. Resolution walks top-down: `Empty`
//! falls through, `Unassigned` blocks lower layers, and `Defer` passes
//! through explicitly. Within one layer a button falls back through the
//! layer's parent chain before the stack moves on.

use padmux_command::Command;
use padmux_core::{BitSet, LayerId};
use tracing::debug;

use crate::buttons::{ButtonPhase, PadButton};
use crate::map::InputMap;

#[derive(Debug, Clone, Copy)]
struct ActiveEntry {
    layer: LayerId,
    /// Active only while a button is held (`Hold <layer>`).
    held: bool,
    /// Cached from the layer definition at activation time.
    priority: i16,
    /// Monotonic counter for recency ordering.
    order: u32,
}

/// A resolved command plus the layer it came from (so `Remove Layer` with
/// no name can remove its own source layer).
#[derive(Debug, Clone, Copy)]
pub struct ResolvedCommand {
    pub command: Command,
    pub source: LayerId,
}

/// The active layer set, ordered bottom to top.
#[derive(Debug, Default)]
pub struct ControlsStack {
    entries: Vec<ActiveEntry>,
    next_order: u32,
}

impl ControlsStack {
    /// A stack with the base scheme active.
    #[must_use]
    pub fn new() -> Self {
        let mut stack = Self::default();
        stack.entries.push(ActiveEntry {
            layer: LayerId(0),
            held: false,
            priority: i16::MIN,
            order: 0,
        });
        stack.next_order = 1;
        stack
    }

    /// Active layer IDs, bottom to top.
    #[must_use]
    pub fn active(&self) -> Vec<LayerId> {
        self.entries.iter().map(|e| e.layer).collect()
    }

    #[must_use]
    pub fn is_active(&self, layer: LayerId) -> bool {
        self.entries.iter().any(|e| e.layer == layer)
    }

    /// Adds a layer (no-op when already active), then applies its auto
    /// add/remove sets and re-syncs combo layers.
    pub fn add(&mut self, map: &InputMap, layer: LayerId) {
        self.add_inner(map, layer, false);
        self.apply_auto(map, layer);
        self.sync_combos(map);
    }

    /// Adds a layer that stays active only until [`release_held`](Self::release_held).
    pub fn hold(&mut self, map: &InputMap, layer: LayerId) {
        self.add_inner(map, layer, true);
        self.apply_auto(map, layer);
        self.sync_combos(map);
    }

    fn add_inner(&mut self, map: &InputMap, layer: LayerId, held: bool) {
        let Some(def) = map.layer(layer) else {
            return;
        };
        if let Some(entry) = self.entries.iter_mut().find(|e| e.layer == layer) {
            entry.held = entry.held && held;
            return;
        }
        debug!("adding controls layer '{}'", def.name);
        self.entries.push(ActiveEntry {
            layer,
            held,
            priority: def.priority,
            order: self.next_order,
        });
        self.next_order += 1;
        self.sort();
    }

    /// Removes a layer. Layer 0 never leaves; combo layers only leave via
    /// combo sync unless `forced`.
    pub fn remove(&mut self, map: &InputMap, layer: LayerId, forced: bool) {
        if layer.0 == 0 {
            return;
        }
        let is_combo = map
            .layer(layer)
            .is_some_and(crate::layers::ControlsLayer::is_combo);
        if is_combo && !forced {
            return;
        }
        self.entries.retain(|e| e.layer != layer);
        self.sync_combos(map);
    }

    /// Removes a held layer when its button releases.
    pub fn release_held(&mut self, map: &InputMap, layer: LayerId) {
        self.entries.retain(|e| !(e.layer == layer && e.held));
        self.sync_combos(map);
    }

    pub fn toggle(&mut self, map: &InputMap, layer: LayerId) {
        if self.is_active(layer) {
            self.remove(map, layer, false);
        } else {
            self.add(map, layer);
        }
    }

    pub fn replace(&mut self, map: &InputMap, old: LayerId, new: LayerId) {
        if old.0 != 0 {
            self.entries.retain(|e| e.layer != old);
        }
        self.add(map, new);
    }

    fn apply_auto(&mut self, map: &InputMap, layer: LayerId) {
        let Some(def) = map.layer(layer) else {
            return;
        };
        let adds = def.auto_add.clone();
        let removes = def.auto_remove.clone();
        for id in adds {
            self.add_inner(map, id, false);
        }
        for id in removes {
            if id.0 != 0 {
                self.entries.retain(|e| e.layer != id);
            }
        }
    }

    /// Activates every combo layer whose two parents are both active and
    /// deactivates those whose parents are not. Chained combos settle in a
    /// few passes.
    fn sync_combos(&mut self, map: &InputMap) {
        loop {
            let mut changed = false;
            for idx in 0..map.layer_count() {
                let id = LayerId(idx as u16);
                let Some(def) = map.layer(id) else { continue };
                let (Some(a), Some(b)) = (def.parent, def.combo_parent) else {
                    continue;
                };
                let should = self.is_active(a) && self.is_active(b);
                if should && !self.is_active(id) {
                    self.entries.push(ActiveEntry {
                        layer: id,
                        held: false,
                        priority: def.priority,
                        order: self.next_order,
                    });
                    self.next_order += 1;
                    changed = true;
                } else if !should && self.is_active(id) {
                    self.entries.retain(|e| e.layer != id);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        self.sort();
    }

    fn sort(&mut self) {
        // Layer 0 stays at the bottom; ties in priority keep recency order.
        self.entries
            .sort_by_key(|e| (e.layer.0 != 0, e.priority, e.order));
    }

    /// Re-caches priorities from the map and re-sorts. Call after a profile
    /// reload may have changed layer priorities.
    pub fn resort_with(&mut self, map: &InputMap) {
        for entry in &mut self.entries {
            if entry.layer.0 != 0 {
                entry.priority = map.layer(entry.layer).map_or(0, |d| d.priority);
            }
        }
        self.sort();
    }

    /// Resolves a button phase through the stack.
    ///
    /// Returns [`Command::Empty`] when nothing anywhere binds the phase.
    #[must_use]
    pub fn resolve(
        &self,
        map: &InputMap,
        button: PadButton,
        phase: ButtonPhase,
    ) -> ResolvedCommand {
        for entry in self.entries.iter().rev() {
            let button = map.remapped_button(entry.layer, button);
            match map.layer_button_command(entry.layer, button, phase) {
                Command::Empty | Command::Defer => {}
                Command::Unassigned => {
                    return ResolvedCommand {
                        command: Command::DoNothing,
                        source: entry.layer,
                    };
                }
                cmd => {
                    return ResolvedCommand {
                        command: cmd,
                        source: entry.layer,
                    };
                }
            }
        }
        ResolvedCommand {
            command: Command::Empty,
            source: LayerId(0),
        }
    }

    /// Resolves a `When <signal>` command through the stack (walking each
    /// layer's parent chain).
    #[must_use]
    pub fn resolve_signal(&self, map: &InputMap, signal: u16) -> Option<ResolvedCommand> {
        for entry in self.entries.iter().rev() {
            let mut current = Some(entry.layer);
            let mut guard = 0;
            while let Some(id) = current {
                if guard > map.layer_count() {
                    break;
                }
                guard += 1;
                let def = map.layer(id)?;
                if let Some(cmd) = def.signal_command(signal) {
                    if cmd.takes_effect() {
                        return Some(ResolvedCommand {
                            command: cmd,
                            source: entry.layer,
                        });
                    }
                }
                current = def.parent;
            }
        }
        None
    }

    /// Union of overlays shown minus hidden, bottom to top.
    #[must_use]
    pub fn visible_overlays(&self, map: &InputMap) -> BitSet {
        let mut mask = BitSet::new();
        for entry in &self.entries {
            if let Some(def) = map.layer(entry.layer) {
                mask.union_with(&def.show_overlays);
                for bit in def.hide_overlays.iter().collect::<Vec<_>>() {
                    mask.reset(bit);
                }
            }
        }
        mask
    }

    /// Union of hotspot arrays enabled minus disabled, bottom to top.
    #[must_use]
    pub fn enabled_arrays(&self, map: &InputMap) -> BitSet {
        let mut mask = BitSet::new();
        for entry in &self.entries {
            if let Some(def) = map.layer(entry.layer) {
                mask.union_with(&def.enable_arrays);
                for bit in def.disable_arrays.iter().collect::<Vec<_>>() {
                    mask.reset(bit);
                }
            }
        }
        mask
    }

    /// Topmost mouse-mode override, if any.
    #[must_use]
    pub fn mouse_mode(&self, map: &InputMap) -> Option<crate::layers::MouseMode> {
        self.entries
            .iter()
            .rev()
            .find_map(|e| map.layer(e.layer).and_then(|d| d.mouse_mode))
    }
}
