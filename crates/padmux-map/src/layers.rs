//! Controls layers: stackable sets of button/signal bindings.
//!
//! A layer binds buttons (five action phases each) and signals to commands,
//! declares overlays to show or hide and hotspot arrays to enable or
//! disable while active, and may auto-add or auto-remove other layers.
//! Combo layers (`A+B` section names) activate automatically while both
//! parents are active; an unknown second segment that itself contains `+`
//! is synthesized as another combo layer, which is how N-way combos chain.

use padmux_command::Command;
use padmux_core::{BitSet, LayerId};
use rustc_hash::FxHashMap;

use crate::buttons::{PHASE_COUNT, PadButton};

/// The delimiter composing combo-layer names.
pub const COMBO_DELIMITER: char = '+';

/// Mouse handling while a layer is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseMode {
    /// Free cursor.
    Cursor,
    /// Hold right mouse to steer the camera.
    MouseLook,
    /// Cursor parked and hidden.
    Hidden,
}

/// Commands for the five phases of one button.
#[derive(Debug, Clone, Default)]
pub struct ButtonActions {
    pub commands: [Command; PHASE_COUNT],
    /// Hold time in ms before the `Hold` phase fires (0 = default).
    pub hold_time_ms: u32,
}

impl ButtonActions {
    /// True when every phase is back to a placeholder.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.commands.iter().all(|c| c.is_placeholder())
    }
}

/// One controls layer.
#[derive(Debug, Clone, Default)]
pub struct ControlsLayer {
    pub name: String,
    pub buttons: FxHashMap<PadButton, ButtonActions>,
    /// `(signal, command)` pairs fired by `When <name> =` properties.
    pub signals: Vec<(u16, Command)>,
    pub show_overlays: BitSet,
    pub hide_overlays: BitSet,
    pub enable_arrays: BitSet,
    pub disable_arrays: BitSet,
    pub auto_add: Vec<LayerId>,
    pub auto_remove: Vec<LayerId>,
    pub mouse_mode: Option<MouseMode>,
    pub remap: FxHashMap<PadButton, PadButton>,
    pub parent: Option<LayerId>,
    pub combo_parent: Option<LayerId>,
    /// Set during load for names containing the combo delimiter, before the
    /// parents are linked.
    pub pending_combo: bool,
    pub priority: i16,
}

impl ControlsLayer {
    /// True once this layer is linked as a combo of two parents.
    #[must_use]
    pub fn is_combo(&self) -> bool {
        self.combo_parent.is_some()
    }

    /// The command for a signal, if bound.
    #[must_use]
    pub fn signal_command(&self, signal: u16) -> Option<Command> {
        self.signals
            .iter()
            .find(|(s, _)| *s == signal)
            .map(|(_, c)| *c)
    }
}

/// Walks parent links from `layer`, clearing the edge that closes a cycle.
///
/// Returns the IDs whose parent link was cleared (empty when acyclic).
pub fn validate_layer(layers: &mut [ControlsLayer], layer: LayerId) -> Vec<LayerId> {
    let mut cleared = Vec::new();
    let mut visited = BitSet::with_capacity(layers.len());
    let mut current = layer;
    visited.set(current.index());
    loop {
        let Some(parent) = layers[current.index()].parent else {
            break;
        };
        if visited.test(parent.index()) {
            layers[current.index()].parent = None;
            cleared.push(current);
            break;
        }
        visited.set(parent.index());
        current = parent;
    }
    // The combo parent chain can close a cycle of its own.
    let mut visited = BitSet::with_capacity(layers.len());
    let mut current = layer;
    visited.set(current.index());
    loop {
        let Some(parent) = layers[current.index()].combo_parent else {
            break;
        };
        if visited.test(parent.index()) {
            layers[current.index()].combo_parent = None;
            cleared.push(current);
            break;
        }
        visited.set(parent.index());
        current = parent;
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> ControlsLayer {
        ControlsLayer {
            name: name.to_string(),
            ..ControlsLayer::default()
        }
    }

    #[test]
    fn test_validate_acyclic_chain() {
        let mut layers = vec![named("root"), named("a"), named("b")];
        layers[2].parent = Some(LayerId(1));
        layers[1].parent = Some(LayerId(0));
        assert!(validate_layer(&mut layers, LayerId(2)).is_empty());
        assert_eq!(layers[2].parent, Some(LayerId(1)));
    }

    #[test]
    fn test_validate_breaks_cycle() {
        // A -> B -> C -> A: the edge reached when the walk returns to a
        // visited layer is cleared.
        let mut layers = vec![named("a"), named("b"), named("c")];
        layers[0].parent = Some(LayerId(1));
        layers[1].parent = Some(LayerId(2));
        layers[2].parent = Some(LayerId(0));
        let cleared = validate_layer(&mut layers, LayerId(0));
        assert_eq!(cleared.len(), 1);
        // The walk terminates for every start afterwards.
        for i in 0..3 {
            assert!(validate_layer(&mut layers, LayerId(i)).is_empty());
        }
    }

    #[test]
    fn test_self_parent_cleared() {
        let mut layers = vec![named("a")];
        layers[0].parent = Some(LayerId(0));
        let cleared = validate_layer(&mut layers, LayerId(0));
        assert_eq!(cleared, vec![LayerId(0)]);
        assert_eq!(layers[0].parent, None);
    }

    #[test]
    fn test_vacant_buttons() {
        let mut actions = ButtonActions::default();
        assert!(actions.is_vacant());
        actions.commands[0] = Command::DoNothing;
        assert!(!actions.is_vacant());
    }
}
