//! The input map: hotspots, key binds, key-bind cycles, controls layers,
//! and menus, loaded and validated from the profile, plus the runtime layer
//! stack that resolves buttons to commands.

mod buttons;
mod cycles;
mod error_log;
mod hotspots;
mod layers;
mod map;
mod menus;
mod stack;

pub use buttons::{
    BUTTON_COUNT, ButtonPhase, PHASE_COUNT, PadButton, split_phase_prefix, split_time_suffix,
};
pub use cycles::{CycleEntry, CycleState, KeyBindCycle};
pub use error_log::ErrorLog;
pub use hotspots::{HotspotArray, HotspotRange, HotspotStore, fetch_range_suffix};
pub use layers::{ButtonActions, COMBO_DELIMITER, ControlsLayer, MouseMode, validate_layer};
pub use map::InputMap;
pub use menus::{Menu, MenuItem, MenuStyle};
pub use stack::{ControlsStack, ResolvedCommand};

#[cfg(test)]
mod tests {
    use super::*;
    use padmux_command::Command;
    use padmux_core::{CycleId, Dir4, KeyBindId, LayerId, MenuId};
    use padmux_profile::Profile;

    const PROFILE: &str = "\
[Hotspots]
Slot = 50%+0, 50%+0, 24x24
Slot1-6 = 30, 0
TargetGroup1 = 10%+0, 10%+0
TargetGroup2 = 20%+0, 10%+0

[KeyBinds]
Attack = Shift2
Heal = H
Chain = Attack
TargetGroup1 = F1
TargetGroup2 = F2
LoopA = LoopB
LoopB = LoopA

[KeyBindCycles]
TargetGroup = TargetGroup1-2, Heal

[Menu.Main]
Style = Grid
GridWidth = 3
1 = Attack: Attack
2 = Heal: Heal
3 = Spells
4 = Wave: /wave
5 = Back: ..
6 = Leave: Close
U = Nothing

[Menu.Main.Spells]
Style = List
1 = Fire: F3
2 = Ice: F4

[Menu.Status]
Style = HUD
KeyBindCycle = TargetGroup

[Scheme]
A = Attack
B = Defer
LB = Hold Layer Combat
HoldRB500 = Heal

[Layer.Combat]
Priority = 10
A = Heal
B = Nothing
When Attack = Add Layer Combat

[Layer.Travel]
Parent = Combat

[Layer.Combat+Travel]
A = Close App
";

    fn loaded() -> (InputMap, Profile) {
        let mut profile = Profile::new();
        profile.load_from_str(PROFILE).expect("profile parses");
        let mut map = InputMap::new();
        map.load_profile(&profile);
        (map, profile)
    }

    #[test]
    fn test_load_order_names_resolve() {
        let (map, _) = loaded();
        assert!(map.hotspots.array_id("Slot").is_some());
        assert_eq!(map.keybind_count(), 7);
        assert_eq!(map.cycle_count(), 1);
        assert_eq!(map.menu_count(), 3);
        assert!(map.layer_count() >= 4);
    }

    #[test]
    fn test_keybind_commands() {
        let (map, _) = loaded();
        let attack = padmux_command::ParseContext::keybind_id(&map, "Attack").unwrap();
        assert!(matches!(
            map.keybind_command(attack),
            Command::TapKey { .. }
        ));
        let chain = padmux_command::ParseContext::keybind_id(&map, "Chain").unwrap();
        assert_eq!(
            map.keybind_command(chain),
            Command::TriggerKeyBind { bind: attack }
        );
    }

    #[test]
    fn test_keybind_cycle_detection() {
        let (map, _) = loaded();
        let a = padmux_command::ParseContext::keybind_id(&map, "LoopA").unwrap();
        let b = padmux_command::ParseContext::keybind_id(&map, "LoopB").unwrap();
        // Both ends of the loop are demoted.
        assert_eq!(map.keybind_command(a), Command::DoNothing);
        assert_eq!(map.keybind_command(b), Command::DoNothing);
        // Legitimate chains survive.
        let chain = padmux_command::ParseContext::keybind_id(&map, "Chain").unwrap();
        assert!(matches!(
            map.keybind_command(chain),
            Command::TriggerKeyBind { .. }
        ));
    }

    #[test]
    fn test_cycle_expansion_and_hotspot_links() {
        let (map, _) = loaded();
        let cycle = map.cycle(CycleId(0)).unwrap();
        assert_eq!(cycle.len(), 3);
        // TargetGroup1/2 also name hotspots, so those entries link to them.
        assert_ne!(cycle.entries[0].hotspot.0, 0);
        assert_ne!(cycle.entries[1].hotspot.0, 0);
        assert_eq!(cycle.entries[2].hotspot.0, 0);
    }

    #[test]
    fn test_menu_forest_and_items() {
        let (map, _) = loaded();
        let main = padmux_command::ParseContext::menu_id(&map, "Main").unwrap();
        let spells = padmux_command::ParseContext::menu_id(&map, "Spells").unwrap();
        assert_eq!(map.root_menu_of(spells), main);
        assert_eq!(map.root_menu_of(main), main);
        let menu = map.menu(main).unwrap();
        assert_eq!(menu.items.len(), 6);
        assert_eq!(menu.items[0].label, "Attack");
        assert!(matches!(
            menu.items[2].command,
            Command::OpenSubMenu { menu, .. } if menu == spells
        ));
        assert!(matches!(menu.items[3].command, Command::ChatBoxString { .. }));
        assert_eq!(menu.items[4].command, Command::MenuBack { menu: main });
        assert_eq!(menu.items[5].command, Command::MenuClose { menu: main });
    }

    #[test]
    fn test_root_menu_fixed_point() {
        let (map, _) = loaded();
        for idx in 0..map.menu_count() {
            let id = MenuId(idx as u16);
            let root = map.root_menu_of(id);
            assert_eq!(map.root_menu_of(root), root);
        }
    }

    #[test]
    fn test_hud_style_requires_cycle_and_has_one() {
        let (map, _) = loaded();
        let status = padmux_command::ParseContext::menu_id(&map, "Status").unwrap();
        assert_eq!(map.menu(status).unwrap().style, MenuStyle::Hud);
    }

    #[test]
    fn test_layer_stack_resolution() {
        let (map, _) = loaded();
        let mut stack = ControlsStack::new();
        // Base scheme: A = Attack keybind.
        let resolved = stack.resolve(&map, PadButton::South, ButtonPhase::Down);
        assert!(matches!(resolved.command, Command::TriggerKeyBind { .. }));

        let combat = map.layer_id("Combat").unwrap();
        stack.add(&map, combat);
        // Combat overrides A with Heal and masks B.
        let resolved = stack.resolve(&map, PadButton::South, ButtonPhase::Down);
        let heal = padmux_command::ParseContext::keybind_id(&map, "Heal").unwrap();
        assert_eq!(
            resolved.command,
            Command::TriggerKeyBind { bind: heal }
        );
        assert_eq!(resolved.source, combat);
        let resolved = stack.resolve(&map, PadButton::East, ButtonPhase::Down);
        assert_eq!(resolved.command, Command::DoNothing);
    }

    #[test]
    fn test_defer_falls_through() {
        let (map, _) = loaded();
        let stack = ControlsStack::new();
        // Scheme binds B = Defer with nothing below: resolves to Empty.
        let resolved = stack.resolve(&map, PadButton::East, ButtonPhase::Down);
        assert_eq!(resolved.command, Command::Empty);
    }

    #[test]
    fn test_combo_layer_auto_activation() {
        let (map, _) = loaded();
        let combat = map.layer_id("Combat").unwrap();
        let travel = map.layer_id("Travel").unwrap();
        let combo = map.layer_id("Combat+Travel").unwrap();
        let def = map.layer(combo).unwrap();
        assert_eq!(def.parent, Some(combat));
        assert_eq!(def.combo_parent, Some(travel));

        let mut stack = ControlsStack::new();
        stack.add(&map, combat);
        assert!(!stack.is_active(combo));
        stack.add(&map, travel);
        assert!(stack.is_active(combo));
        // The combo's binding now wins.
        let resolved = stack.resolve(&map, PadButton::South, ButtonPhase::Down);
        assert_eq!(resolved.command, Command::QuitApp);
        stack.remove(&map, travel, false);
        assert!(!stack.is_active(combo));
    }

    #[test]
    fn test_hold_layer_binding() {
        let (map, _) = loaded();
        let cmd =
            map.layer_button_command(LayerId(0), PadButton::LeftShoulder, ButtonPhase::Down);
        let combat = map.layer_id("Combat").unwrap();
        assert_eq!(cmd, Command::HoldControlsLayer { layer: combat });
        // A HoldXX500 key binds the hold phase with its time suffix.
        let hold_cmd =
            map.layer_button_command(LayerId(0), PadButton::RightShoulder, ButtonPhase::Hold);
        let heal = padmux_command::ParseContext::keybind_id(&map, "Heal").unwrap();
        assert_eq!(hold_cmd, Command::TriggerKeyBind { bind: heal });
        assert_eq!(
            map.layer_button_hold_time(LayerId(0), PadButton::RightShoulder),
            500
        );
    }

    #[test]
    fn test_when_signal_resolution() {
        let (map, _) = loaded();
        let attack = padmux_command::ParseContext::keybind_id(&map, "Attack").unwrap();
        let signal = map.keybind_signal(attack);
        let combat = map.layer_id("Combat").unwrap();
        let mut stack = ControlsStack::new();
        assert!(stack.resolve_signal(&map, signal).is_none());
        stack.add(&map, combat);
        let resolved = stack.resolve_signal(&map, signal).unwrap();
        assert_eq!(
            resolved.command,
            Command::AddControlsLayer { layer: combat }
        );
    }

    #[test]
    fn test_bind_sequences_for_dispatcher() {
        use padmux_dispatch::BindSequences;
        let (map, _) = loaded();
        let heal = padmux_command::ParseContext::keybind_id(&map, "Heal").unwrap();
        let seq = map.sequence_for(heal.0).unwrap();
        assert_eq!(seq, vec![b'H']);
        // Chained binds resolve through to the target.
        let chain = padmux_command::ParseContext::keybind_id(&map, "Chain").unwrap();
        let seq = map.sequence_for(chain.0).unwrap();
        assert!(!seq.is_empty());
    }

    #[test]
    fn test_parent_layer_fallback() {
        let (map, _) = loaded();
        let travel = map.layer_id("Travel").unwrap();
        // Travel has no A binding of its own; its parent Combat supplies it.
        let cmd = map.layer_button_command(travel, PadButton::South, ButtonPhase::Down);
        let heal = padmux_command::ParseContext::keybind_id(&map, "Heal").unwrap();
        assert_eq!(cmd, Command::TriggerKeyBind { bind: heal });
    }

    #[test]
    fn test_structural_change_reload_preserves_cycle_state() {
        let (mut map, mut profile) = loaded();
        map.cycle_state.advance(CycleId(0), 3, true, true, 2);
        assert_eq!(map.cycle_state.last_index(CycleId(0)), Some(1));
        profile.set_str("KeyBinds", "Extra", "E", true);
        map.load_profile_changes(&profile);
        assert_eq!(map.cycle_state.last_index(CycleId(0)), Some(1));
        assert!(padmux_command::ParseContext::keybind_id(&map, "Extra").is_some());
    }

    #[test]
    fn test_hotspot_change_marks_menus() {
        let (mut map, mut profile) = loaded();
        profile.clear_changed_sections();
        profile.set_str("Hotspots", "Slot2", "10%+0, 10%+0", true);
        map.load_profile_changes(&profile);
        // No menu references Slot2, so no menu is marked, but the hotspot
        // itself moved.
        let id = map.hotspots.hotspot_id("Slot2").unwrap();
        assert!(map.hotspots.changed.test(id.index()));
    }

    #[test]
    fn test_button_names_with_digits() {
        let mut profile = Profile::new();
        profile
            .load_from_str("[KeyBinds]\nAttack = X\n\n[Scheme]\nL2 = Attack\nHoldR2350 = Attack\n")
            .unwrap();
        let mut map = InputMap::new();
        map.load_profile(&profile);
        assert!(matches!(
            map.layer_button_command(LayerId(0), PadButton::LeftTrigger, ButtonPhase::Down),
            Command::TriggerKeyBind { .. }
        ));
        assert!(matches!(
            map.layer_button_command(LayerId(0), PadButton::RightTrigger, ButtonPhase::Hold),
            Command::TriggerKeyBind { .. }
        ));
        assert_eq!(
            map.layer_button_hold_time(LayerId(0), PadButton::RightTrigger),
            350
        );
    }

    #[test]
    fn test_keybind_id_is_case_insensitive() {
        let (map, _) = loaded();
        let a = padmux_command::ParseContext::keybind_id(&map, "attack");
        let b = padmux_command::ParseContext::keybind_id(&map, "ATTACK");
        assert!(a.is_some());
        assert_eq!(a, b);
    }
}
