//! The [`Command`] sum type.

use padmux_core::{CycleId, Dir4, Dir8, HotspotId, KeyBindId, LayerId, MenuId, StringId, VariableId};

use crate::keys::VkCombo;

/// Mouse-wheel motion style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelMotion {
    /// Discrete notches.
    Stepped,
    /// Continuous scrolling while held.
    Smooth,
    /// A single large jump.
    Jump,
}

/// Everything a button, signal, or menu item can be bound to.
///
/// Every ID payload indexes a live entity in the input map or its
/// command-string intern table; the parser guarantees this and demotes
/// anything unresolvable to [`Command::DoNothing`] after reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Command {
    /// No assignment at all; lower layers may still apply.
    #[default]
    Empty,
    /// Explicitly blocked: masks lower layers without doing anything.
    Unassigned,
    /// Parsed but intentionally inert.
    DoNothing,
    /// Parse failure; never escapes the parser.
    Invalid,
    /// Pass this button through to lower layers.
    Defer,

    /// Press and release one key combination.
    TapKey { combo: VkCombo },
    /// Run an encoded multi-key sequence (interned byte string).
    VkSequence { string: StringId },
    /// Execute another key bind by ID.
    TriggerKeyBind { bind: KeyBindId },
    /// Type a chat-box macro (interned text starting with `/` or `>`).
    ChatBoxString { string: StringId },
    /// Assign a profile variable.
    SetVariable {
        variable: VariableId,
        string: StringId,
        temporary: bool,
    },

    AddControlsLayer { layer: LayerId },
    /// Layer 0 means "the layer this command came from".
    RemoveControlsLayer { layer: LayerId, forced: bool },
    ReplaceControlsLayer { old: LayerId, new: LayerId },
    /// Active only while the button is held.
    HoldControlsLayer { layer: LayerId },
    ToggleControlsLayer { layer: LayerId },

    /// `item` is a 1-based initial selection; 0 keeps the menu's own.
    OpenSubMenu { menu: MenuId, item: u16 },
    /// Internal rewrite of an edge-push sub-menu open; enters at the
    /// opposite edge so the cursor appears to cross over.
    OpenSideMenu { menu: MenuId, dir: Dir4 },
    MenuReset { menu: MenuId },
    MenuConfirm { menu: MenuId, close: bool },
    MenuBack { menu: MenuId },
    MenuClose { menu: MenuId },
    MenuSelect {
        menu: MenuId,
        dir: Dir4,
        wrap: bool,
        and_close: bool,
    },
    MenuEdit { menu: MenuId, dir: Option<Dir4> },

    /// Jump the cursor to the nearest hotspot in a direction.
    HotspotSelect { dir: Dir8, wrap: bool },
    MoveTurn { dir: Dir4 },
    MoveStrafe { dir: Dir4 },
    MoveLook { dir: Dir4 },
    StartAutoRun { multi_dir: bool },
    MoveMouse { dir: Dir8 },
    MoveMouseToHotspot { hotspot: HotspotId },
    MouseWheel {
        dir: Dir4,
        motion: WheelMotion,
        count: i16,
    },

    KeyBindCycleNext { cycle: CycleId, wrap: bool, count: i16 },
    KeyBindCyclePrev { cycle: CycleId, wrap: bool, count: i16 },
    /// Re-trigger the cycle's last-used (or default) entry.
    KeyBindCycleLast { cycle: CycleId },
    KeyBindCycleReset { cycle: CycleId },
    /// `Set <cycle> Default to Last`.
    KeyBindCycleSetDefault { cycle: CycleId },

    ChangeProfile,
    EditLayout,
    ChangeTargetConfigSyncFile,
    QuitApp,
}

impl Command {
    /// True for the placeholder states that carry no behavior at all.
    #[must_use]
    pub fn is_placeholder(self) -> bool {
        matches!(
            self,
            Command::Empty | Command::Unassigned | Command::Invalid
        )
    }

    /// True when the command does something when executed (everything except
    /// placeholders and [`Command::DoNothing`]).
    #[must_use]
    pub fn takes_effect(self) -> bool {
        !self.is_placeholder() && self != Command::DoNothing
    }

    /// True when executing from a menu item keeps the same active sub-menu
    /// (and should therefore flash the item as confirmation).
    #[must_use]
    pub fn flashes_menu_item(self) -> bool {
        !matches!(
            self,
            Command::OpenSubMenu { .. }
                | Command::OpenSideMenu { .. }
                | Command::MenuBack { .. }
                | Command::MenuClose { .. }
        ) && self.takes_effect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert!(Command::Empty.is_placeholder());
        assert!(Command::Unassigned.is_placeholder());
        assert!(Command::Invalid.is_placeholder());
        assert!(!Command::DoNothing.is_placeholder());
        assert!(!Command::DoNothing.takes_effect());
        assert!(Command::QuitApp.takes_effect());
    }

    #[test]
    fn test_submenu_commands_do_not_flash() {
        let open = Command::OpenSubMenu {
            menu: MenuId(3),
            item: 0,
        };
        assert!(!open.flashes_menu_item());
        assert!(Command::ChangeProfile.flashes_menu_item());
        assert!(!Command::Empty.flashes_menu_item());
    }
}
