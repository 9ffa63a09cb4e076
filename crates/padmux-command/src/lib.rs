//! The command model: a typed sum over everything a gamepad button, menu
//! item, or signal can do, plus the parser that turns free-form profile
//! strings into commands.
//!
//! Parsing is keyword-driven and order-insensitive; name lookups (hotspots,
//! key binds, layers, menus, cycles) go through the [`ParseContext`] trait,
//! implemented by the input map so that this crate stays independent of the
//! entity stores.

mod command;
mod keys;
mod parse;
mod vkseq;
mod words;

pub use command::{Command, WheelMotion};
pub use keys::{
    MOD_ALT, MOD_CTRL, MOD_ONLY_BASE, MOD_SHIFT, MOD_WIN, VK_FORCE_RELEASE, VK_LBUTTON,
    VK_MBUTTON, VK_MOUSE_JUMP, VK_PAUSE_TAG, VK_RBUTTON, VK_TRIGGER_KEYBIND, VkCombo,
    is_mouse_button_vk, key_name_to_vk,
};
pub use parse::{
    ParseContext, ParseFlags, parse_command, parse_keybind_command, split_into_words,
};
pub use vkseq::{SeqToken, decode_sequence, encode_operand, encode_sequence};
