//! Gamepad buttons and button-action phases.
//!
//! Button names follow common pad shorthand (`A`, `LB`, `R3`, `DPadUp`,
//! `LSLeft`) plus the four "any direction" pseudo-buttons that accept a
//! whole stick or pad and get expanded to one command per direction.

use padmux_core::Dir4;

/// One physical (or pseudo) gamepad button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    South,
    East,
    West,
    North,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    LeftStickClick,
    RightStickClick,
    Start,
    Select,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    LStickUp,
    LStickDown,
    LStickLeft,
    LStickRight,
    RStickUp,
    RStickDown,
    RStickLeft,
    RStickRight,
    /// Whole left stick: expands to the four `LStick*` directions.
    LStickAny,
    /// Whole right stick.
    RStickAny,
    /// Whole directional pad.
    DPadAny,
    /// The four face buttons as a directional pad (N/S/E/W).
    FPadAny,
}

/// Number of real buttons, used as the base of the signal ID space
/// (`signal = BUTTON_COUNT + keybind_index`).
pub const BUTTON_COUNT: u16 = 28;

impl PadButton {
    /// Dense index in `0..BUTTON_COUNT` (pseudo-buttons share the tail).
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for the four whole-stick/pad pseudo-buttons.
    #[must_use]
    pub fn is_multi_dir(self) -> bool {
        matches!(
            self,
            PadButton::LStickAny | PadButton::RStickAny | PadButton::DPadAny | PadButton::FPadAny
        )
    }

    /// The per-direction member of a multi-direction pseudo-button.
    #[must_use]
    pub fn member_for_dir(self, dir: Dir4) -> Option<PadButton> {
        let group = match self {
            PadButton::LStickAny => [
                PadButton::LStickLeft,
                PadButton::LStickRight,
                PadButton::LStickUp,
                PadButton::LStickDown,
            ],
            PadButton::RStickAny => [
                PadButton::RStickLeft,
                PadButton::RStickRight,
                PadButton::RStickUp,
                PadButton::RStickDown,
            ],
            PadButton::DPadAny => [
                PadButton::DPadLeft,
                PadButton::DPadRight,
                PadButton::DPadUp,
                PadButton::DPadDown,
            ],
            PadButton::FPadAny => [
                PadButton::West,
                PadButton::East,
                PadButton::North,
                PadButton::South,
            ],
            _ => return None,
        };
        Some(group[dir.index()])
    }

    /// Parses a button name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<PadButton> {
        let b = match name.to_ascii_uppercase().as_str() {
            "A" | "CROSS" | "SOUTH" => PadButton::South,
            "B" | "CIRCLE" | "EAST" => PadButton::East,
            "X" | "SQUARE" | "WEST" => PadButton::West,
            "Y" | "TRIANGLE" | "NORTH" => PadButton::North,
            "LB" | "L1" | "LBUMPER" | "LSHOULDER" => PadButton::LeftShoulder,
            "RB" | "R1" | "RBUMPER" | "RSHOULDER" => PadButton::RightShoulder,
            "LT" | "L2" | "LTRIGGER" => PadButton::LeftTrigger,
            "RT" | "R2" | "RTRIGGER" => PadButton::RightTrigger,
            "L3" | "LSCLICK" | "LSTICKCLICK" => PadButton::LeftStickClick,
            "R3" | "RSCLICK" | "RSTICKCLICK" => PadButton::RightStickClick,
            "START" => PadButton::Start,
            "SELECT" | "BACK" | "VIEW" => PadButton::Select,
            "DPADUP" | "DUP" => PadButton::DPadUp,
            "DPADDOWN" | "DDOWN" => PadButton::DPadDown,
            "DPADLEFT" | "DLEFT" => PadButton::DPadLeft,
            "DPADRIGHT" | "DRIGHT" => PadButton::DPadRight,
            "LSUP" | "LSTICKUP" => PadButton::LStickUp,
            "LSDOWN" | "LSTICKDOWN" => PadButton::LStickDown,
            "LSLEFT" | "LSTICKLEFT" => PadButton::LStickLeft,
            "LSRIGHT" | "LSTICKRIGHT" => PadButton::LStickRight,
            "RSUP" | "RSTICKUP" => PadButton::RStickUp,
            "RSDOWN" | "RSTICKDOWN" => PadButton::RStickDown,
            "RSLEFT" | "RSTICKLEFT" => PadButton::RStickLeft,
            "RSRIGHT" | "RSTICKRIGHT" => PadButton::RStickRight,
            "LSANY" | "LSTICK" => PadButton::LStickAny,
            "RSANY" | "RSTICK" => PadButton::RStickAny,
            "DPAD" | "DPADANY" => PadButton::DPadAny,
            "FPAD" | "FPADANY" | "FACEPAD" => PadButton::FPadAny,
            _ => return None,
        };
        Some(b)
    }
}

/// The five per-button action phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonPhase {
    /// Fires on the initial press edge.
    Down,
    /// Fires on press, may start a hold-layer.
    Press,
    /// Fires after the button has been held for its hold time.
    Hold,
    /// Fires on release only if the button was not held long enough for
    /// `Hold`.
    Tap,
    /// Fires on every release.
    Release,
}

/// Number of phases.
pub const PHASE_COUNT: usize = 5;

impl ButtonPhase {
    pub const ALL: [ButtonPhase; PHASE_COUNT] = [
        ButtonPhase::Down,
        ButtonPhase::Press,
        ButtonPhase::Hold,
        ButtonPhase::Tap,
        ButtonPhase::Release,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Splits a leading action-phase prefix off a button key name.
///
/// `HoldLB` parses as (`Hold`, `"LB"`); a bare button name defaults to the
/// `Down` phase.
#[must_use]
pub fn split_phase_prefix(name: &str) -> (ButtonPhase, &str) {
    const PREFIXES: [(&str, ButtonPhase); 5] = [
        ("DOWN", ButtonPhase::Down),
        ("PRESS", ButtonPhase::Press),
        ("HOLD", ButtonPhase::Hold),
        ("TAP", ButtonPhase::Tap),
        ("RELEASE", ButtonPhase::Release),
    ];
    let upper = name.to_ascii_uppercase();
    for (prefix, phase) in PREFIXES {
        if upper.starts_with(prefix) && name.len() > prefix.len() {
            return (phase, &name[prefix.len()..]);
        }
    }
    (ButtonPhase::Down, name)
}

/// Splits a trailing integer (hold time in ms) off a button key name.
/// `HoldLB500` yields `("HoldLB", Some(500))`.
#[must_use]
pub fn split_time_suffix(name: &str) -> (&str, Option<u32>) {
    let digits = name
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 || digits == name.len() {
        return (name, None);
    }
    let (head, tail) = name.split_at(name.len() - digits);
    (head, tail.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_aliases() {
        assert_eq!(PadButton::from_name("a"), Some(PadButton::South));
        assert_eq!(PadButton::from_name("Cross"), Some(PadButton::South));
        assert_eq!(PadButton::from_name("L1"), Some(PadButton::LeftShoulder));
        assert_eq!(PadButton::from_name("DPad"), Some(PadButton::DPadAny));
        assert_eq!(PadButton::from_name("NopeButton"), None);
    }

    #[test]
    fn test_multi_dir_members() {
        assert_eq!(
            PadButton::DPadAny.member_for_dir(Dir4::Up),
            Some(PadButton::DPadUp)
        );
        assert_eq!(
            PadButton::FPadAny.member_for_dir(Dir4::Down),
            Some(PadButton::South)
        );
        assert_eq!(PadButton::South.member_for_dir(Dir4::Up), None);
    }

    #[test]
    fn test_phase_prefix() {
        let (phase, rest) = split_phase_prefix("HoldLB");
        assert_eq!(phase, ButtonPhase::Hold);
        assert_eq!(rest, "LB");
        let (phase, rest) = split_phase_prefix("LB");
        assert_eq!(phase, ButtonPhase::Down);
        assert_eq!(rest, "LB");
        // A bare phase word is a button name, not a phase.
        let (phase, rest) = split_phase_prefix("Hold");
        assert_eq!(phase, ButtonPhase::Down);
        assert_eq!(rest, "Hold");
    }

    #[test]
    fn test_time_suffix() {
        assert_eq!(split_time_suffix("HoldLB500"), ("HoldLB", Some(500)));
        assert_eq!(split_time_suffix("LB"), ("LB", None));
        // All-digit names keep their digits (they are not a time).
        assert_eq!(split_time_suffix("123"), ("123", None));
    }
}
