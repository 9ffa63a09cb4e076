//! Virtual-key vocabulary: name lookup, modifier packing, and the reserved
//! bytes of the sequence wire format.
//!
//! Only codes below 0x80 are representable in a key sequence (the wire
//! format reserves the high bit for encoded operands), so the name table
//! stops at `F16` and omits lock keys and OEM punctuation. Chat macros are
//! unaffected: their characters are mapped at dispatch time and may use any
//! code.

/// Modifier bit for Shift in a [`VkCombo`].
pub const MOD_SHIFT: u16 = 0x0100;
/// Modifier bit for Control.
pub const MOD_CTRL: u16 = 0x0200;
/// Modifier bit for Alt.
pub const MOD_ALT: u16 = 0x0400;
/// Modifier bit for the Win/Super key.
pub const MOD_WIN: u16 = 0x0800;
/// Mask selecting the base key byte of a combo.
pub const VK_BASE_MASK: u16 = 0x00FF;

/// Pseudo base key used when a combo names only modifiers ("Ctrl" alone).
pub const MOD_ONLY_BASE: u16 = 0x00FF;

/// Left mouse button.
pub const VK_LBUTTON: u8 = 0x01;
/// Right mouse button.
pub const VK_RBUTTON: u8 = 0x02;
/// Middle mouse button.
pub const VK_MBUTTON: u8 = 0x04;

/// Reserved: release all held modifiers before the next key.
pub const VK_FORCE_RELEASE: u8 = 0x07;
/// Reserved: followed by a 14-bit hotspot index; jump the cursor there.
pub const VK_MOUSE_JUMP: u8 = 0x0E;
/// Reserved: followed by a 14-bit key-bind index; enqueue that bind.
pub const VK_TRIGGER_KEYBIND: u8 = 0x0F;
/// Reserved: followed by a 14-bit millisecond delay.
pub const VK_PAUSE_TAG: u8 = 0x13;

pub(crate) const VK_SHIFT: u8 = 0x10;
pub(crate) const VK_CONTROL: u8 = 0x11;
pub(crate) const VK_ALT: u8 = 0x12;
pub(crate) const VK_LWIN: u8 = 0x5B;

/// A packed key combination: modifier flags in the high byte, base VK in the
/// low byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VkCombo(pub u16);

impl VkCombo {
    #[must_use]
    pub fn base(self) -> u8 {
        (self.0 & VK_BASE_MASK) as u8
    }

    #[must_use]
    pub fn has_shift(self) -> bool {
        self.0 & MOD_SHIFT != 0
    }

    #[must_use]
    pub fn has_ctrl(self) -> bool {
        self.0 & MOD_CTRL != 0
    }

    #[must_use]
    pub fn has_alt(self) -> bool {
        self.0 & MOD_ALT != 0
    }

    #[must_use]
    pub fn has_win(self) -> bool {
        self.0 & MOD_WIN != 0
    }

    /// True when the combo names only modifiers, no base key.
    #[must_use]
    pub fn is_modifiers_only(self) -> bool {
        self.0 & VK_BASE_MASK == MOD_ONLY_BASE
    }

    /// Emits the combo as wire bytes: modifier VKs, then the base key.
    #[must_use]
    pub fn to_sequence_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5);
        if self.has_shift() {
            out.push(VK_SHIFT);
        }
        if self.has_ctrl() {
            out.push(VK_CONTROL);
        }
        if self.has_alt() {
            out.push(VK_ALT);
        }
        if self.has_win() {
            out.push(VK_LWIN);
        }
        // Modifier-only combos still carry their dummy base byte so the
        // dispatcher sees a complete key step.
        out.push(self.base());
        out
    }
}

/// True for the three mouse-button virtual keys.
#[must_use]
pub fn is_mouse_button_vk(vk: u8) -> bool {
    matches!(vk, VK_LBUTTON | VK_RBUTTON | VK_MBUTTON)
}

/// Looks up a key name (case-insensitive) in the VK table.
///
/// Returns `None` for unrecognized names; modifier names return their plain
/// VK codes (`Shift` = 0x10 etc.) which callers fold into combo flags.
#[must_use]
pub fn key_name_to_vk(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    // Single characters: letters and digits map directly.
    if upper.len() == 1 {
        let c = upper.as_bytes()[0];
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            return Some(c);
        }
    }
    let vk = match upper.as_str() {
        "LMB" | "LBUTTON" | "LCLICK" | "LEFTCLICK" => VK_LBUTTON,
        "RMB" | "RBUTTON" | "RCLICK" | "RIGHTCLICK" => VK_RBUTTON,
        "MMB" | "MBUTTON" | "MCLICK" | "MIDDLECLICK" => VK_MBUTTON,
        "BACK" | "BACKSPACE" | "BS" => 0x08,
        "TAB" => 0x09,
        "CLEAR" => 0x0C,
        "ENTER" | "RETURN" => 0x0D,
        "SHIFT" => VK_SHIFT,
        "CTRL" | "CONTROL" => VK_CONTROL,
        "ALT" | "MENU" => VK_ALT,
        "CAPSLOCK" | "CAPS" => 0x14,
        "ESC" | "ESCAPE" => 0x1B,
        "SPACE" | "SPACEBAR" => 0x20,
        "PGUP" | "PAGEUP" | "PRIOR" => 0x21,
        "PGDN" | "PAGEDOWN" | "NEXT" => 0x22,
        "END" => 0x23,
        "HOME" => 0x24,
        "LEFT" | "LEFTARROW" => 0x25,
        "UP" | "UPARROW" => 0x26,
        "RIGHT" | "RIGHTARROW" => 0x27,
        "DOWN" | "DOWNARROW" => 0x28,
        "PRINTSCREEN" | "PRTSC" => 0x2C,
        "INS" | "INSERT" => 0x2D,
        "DEL" | "DELETE" => 0x2E,
        "WIN" | "LWIN" | "SUPER" => VK_LWIN,
        "APPS" => 0x5D,
        "NUM0" | "NUMPAD0" => 0x60,
        "NUM1" | "NUMPAD1" => 0x61,
        "NUM2" | "NUMPAD2" => 0x62,
        "NUM3" | "NUMPAD3" => 0x63,
        "NUM4" | "NUMPAD4" => 0x64,
        "NUM5" | "NUMPAD5" => 0x65,
        "NUM6" | "NUMPAD6" => 0x66,
        "NUM7" | "NUMPAD7" => 0x67,
        "NUM8" | "NUMPAD8" => 0x68,
        "NUM9" | "NUMPAD9" => 0x69,
        "MULTIPLY" | "NUMMULTIPLY" => 0x6A,
        "ADD" | "NUMPLUS" => 0x6B,
        "SUBTRACT" | "NUMMINUS" => 0x6D,
        "DECIMAL" | "NUMDOT" => 0x6E,
        "DIVIDE" | "NUMDIVIDE" => 0x6F,
        "F1" => 0x70,
        "F2" => 0x71,
        "F3" => 0x72,
        "F4" => 0x73,
        "F5" => 0x74,
        "F6" => 0x75,
        "F7" => 0x76,
        "F8" => 0x77,
        "F9" => 0x78,
        "F10" => 0x79,
        "F11" => 0x7A,
        "F12" => 0x7B,
        "F13" => 0x7C,
        "F14" => 0x7D,
        "F15" => 0x7E,
        "F16" => 0x7F,
        "FORCERELEASE" => VK_FORCE_RELEASE,
        _ => return None,
    };
    Some(vk)
}

/// Folds a plain modifier VK into its combo flag, if it is one.
#[must_use]
pub(crate) fn modifier_flag(vk: u8) -> Option<u16> {
    match vk {
        VK_SHIFT => Some(MOD_SHIFT),
        VK_CONTROL => Some(MOD_CTRL),
        VK_ALT => Some(MOD_ALT),
        VK_LWIN => Some(MOD_WIN),
        _ => None,
    }
}

/// Recognizes one-word modifier+key combos like `Shift2` or `CtrlAltA`.
///
/// Walks the word left to right accumulating the longest modifier-name
/// prefixes, then requires the remainder to be a valid key (or, recursively,
/// another combo).
#[must_use]
pub(crate) fn joined_combo(word: &str) -> Option<u16> {
    for split in 2..word.len() {
        let (head, tail) = word.split_at(split);
        let Some(vk) = key_name_to_vk(head) else {
            continue;
        };
        let Some(flag) = modifier_flag(vk) else {
            continue;
        };
        if let Some(main) = key_name_to_vk(tail) {
            if modifier_flag(main).is_none() {
                return Some(flag | u16::from(main));
            }
            continue;
        }
        if let Some(rest) = joined_combo(tail) {
            return Some(flag | rest);
        }
    }
    None
}

/// Combines a list of words into a single key combo, if they form one:
/// any number of modifier names followed by at most one non-modifier key.
#[must_use]
pub(crate) fn names_to_combo(words: &[String]) -> Option<VkCombo> {
    let mut result: u16 = 0;
    for word in words {
        if result & VK_BASE_MASK != 0 {
            // Nothing may follow the base key.
            return None;
        }
        match key_name_to_vk(word) {
            Some(vk) => match modifier_flag(vk) {
                Some(flag) => result |= flag,
                None => {
                    if vk == VK_FORCE_RELEASE || vk == VK_MOUSE_JUMP {
                        return None;
                    }
                    result |= u16::from(vk);
                }
            },
            None => {
                let combo = joined_combo(word)?;
                result |= combo;
            }
        }
    }
    if result == 0 {
        return None;
    }
    // Modifier-only combos get a dummy base so the low byte is non-zero.
    if result & VK_BASE_MASK == 0 {
        result |= MOD_ONLY_BASE;
    }
    Some(VkCombo(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo_of(words: &[&str]) -> Option<VkCombo> {
        let owned: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        names_to_combo(&owned)
    }

    #[test]
    fn test_single_letters_and_digits() {
        assert_eq!(key_name_to_vk("a"), Some(b'A'));
        assert_eq!(key_name_to_vk("Z"), Some(b'Z'));
        assert_eq!(key_name_to_vk("5"), Some(b'5'));
        assert_eq!(key_name_to_vk("?"), None);
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(key_name_to_vk("Enter"), Some(0x0D));
        assert_eq!(key_name_to_vk("spacebar"), Some(0x20));
        assert_eq!(key_name_to_vk("F12"), Some(0x7B));
        assert_eq!(key_name_to_vk("NotAKey"), None);
    }

    #[test]
    fn test_modifier_plus_key() {
        let c = combo_of(&["Shift", "F1"]).unwrap();
        assert!(c.has_shift());
        assert_eq!(c.base(), 0x70);
    }

    #[test]
    fn test_joined_modifier_combo() {
        let c = combo_of(&["Shift2"]).unwrap();
        assert!(c.has_shift());
        assert_eq!(c.base(), b'2');

        let c = combo_of(&["CtrlAltA"]).unwrap();
        assert!(c.has_ctrl());
        assert!(c.has_alt());
        assert_eq!(c.base(), b'A');
    }

    #[test]
    fn test_modifiers_only_get_dummy_base() {
        let c = combo_of(&["Ctrl"]).unwrap();
        assert!(c.has_ctrl());
        assert!(c.is_modifiers_only());
    }

    #[test]
    fn test_word_after_base_key_rejects() {
        assert!(combo_of(&["A", "B"]).is_none());
        assert!(combo_of(&["Shift", "A", "B"]).is_none());
    }

    #[test]
    fn test_sequence_bytes_order_modifiers_first() {
        let c = combo_of(&["Ctrl", "Shift", "X"]).unwrap();
        assert_eq!(c.to_sequence_bytes(), vec![VK_SHIFT, VK_CONTROL, b'X']);
    }
}
