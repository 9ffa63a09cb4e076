//! The key-sequence wire format.
//!
//! A sequence is a byte string: plain bytes below 0x80 are virtual-key
//! codes, and three reserved codes introduce a 14-bit operand packed into
//! the following two bytes. Each operand byte has its high bit set so no
//! byte of a valid sequence is ever zero, keeping the string safe for
//! terminator-sensitive carriers. Profiles written against this encoding
//! stay portable.

use crate::keys::{
    self, VK_FORCE_RELEASE, VK_MOUSE_JUMP, VK_PAUSE_TAG, VK_TRIGGER_KEYBIND, is_mouse_button_vk,
    key_name_to_vk,
};
use crate::parse::ParseContext;

/// Maximum encodable operand (14 bits).
pub const MAX_OPERAND: u16 = 0x3FFF;

/// Appends a tag byte plus its 14-bit operand.
pub fn encode_operand(out: &mut Vec<u8>, tag: u8, value: u16) {
    let value = value.min(MAX_OPERAND);
    out.push(tag);
    out.push((((value >> 7) & 0x7F) as u8) | 0x80);
    out.push(((value & 0x7F) as u8) | 0x80);
}

/// One decoded element of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqToken {
    /// Press-and-release (or modifier prefix) of a virtual key.
    Key(u8),
    /// Pause the queue for this many milliseconds.
    Pause(u16),
    /// Enqueue the key bind with this index.
    TriggerKeyBind(u16),
    /// Move the cursor to the hotspot with this index before the next
    /// mouse-button key.
    MouseJump(u16),
    /// Release all currently held modifiers before continuing.
    ForceRelease,
}

/// Decodes a sequence byte string. Truncated operands end the iteration.
#[must_use]
pub fn decode_sequence(bytes: &[u8]) -> Vec<SeqToken> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            VK_PAUSE_TAG | VK_TRIGGER_KEYBIND | VK_MOUSE_JUMP => {
                if i + 2 >= bytes.len() {
                    break;
                }
                let hi = u16::from(bytes[i + 1] & 0x7F);
                let lo = u16::from(bytes[i + 2] & 0x7F);
                let value = (hi << 7) | lo;
                out.push(match b {
                    VK_PAUSE_TAG => SeqToken::Pause(value),
                    VK_TRIGGER_KEYBIND => SeqToken::TriggerKeyBind(value),
                    _ => SeqToken::MouseJump(value),
                });
                i += 3;
            }
            VK_FORCE_RELEASE => {
                out.push(SeqToken::ForceRelease);
                i += 1;
            }
            _ => {
                out.push(SeqToken::Key(b));
                i += 1;
            }
        }
    }
    out
}

/// Result of a partial word check while encoding.
enum WordCheck {
    Consumed,
    NeedsMore,
    NotMatched,
}

/// Checks a word for the `Pause|Delay|Wait [ms]` forms, including joined
/// digits (`P500`). `time_only` means the keyword was the previous word and
/// this one must be the digits.
fn check_pause(word: &str, out: &mut Vec<u8>, time_only: bool, ctx: &mut dyn ParseContext) -> WordCheck {
    let digits = if time_only {
        word
    } else {
        let upper = word.to_ascii_uppercase();
        let rest = if let Some(r) = upper.strip_prefix("PAUSE") {
            r.len()
        } else if let Some(r) = upper.strip_prefix("DELAY") {
            r.len()
        } else if let Some(r) = upper.strip_prefix("WAIT") {
            r.len()
        } else if matches!(upper.as_bytes().first(), Some(b'P' | b'D' | b'W'))
            && upper.len() > 1
            && upper.as_bytes()[1].is_ascii_digit()
        {
            upper.len() - 1
        } else {
            return WordCheck::NotMatched;
        };
        if rest == 0 {
            return WordCheck::NeedsMore;
        }
        &word[word.len() - rest..]
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return WordCheck::NotMatched;
    }
    let mut ms: u32 = 0;
    for b in digits.bytes() {
        ms = ms * 10 + u32::from(b - b'0');
        if ms > u32::from(MAX_OPERAND) {
            ctx.report_error(format!(
                "pause time in a key sequence cannot exceed {} ms",
                MAX_OPERAND
            ));
            ms = u32::from(MAX_OPERAND);
            break;
        }
    }
    // A zero delay is valid but adds nothing.
    if ms > 0 {
        encode_operand(out, VK_PAUSE_TAG, ms as u16);
    }
    WordCheck::Consumed
}

/// Checks a word for a hotspot name. With `after_click` the jump tag is
/// injected before the trailing click byte (and its modifier prefix).
fn check_hotspot(
    word: &str,
    out: &mut Vec<u8>,
    after_click: bool,
    ctx: &mut dyn ParseContext,
) -> WordCheck {
    // Connective words keep the scan going toward the actual name.
    if matches!(
        word.to_ascii_lowercase().as_str(),
        "mouse" | "cursor" | "to" | "at" | "hotspot" | "the"
    ) {
        return WordCheck::NeedsMore;
    }
    let Some(id) = ctx.hotspot_id(word) else {
        return WordCheck::NotMatched;
    };
    if id.0 == 0 {
        return WordCheck::NotMatched;
    }

    if after_click {
        // Hoist the click (and any modifier prefix) past the jump.
        let mut suffix = Vec::new();
        suffix.insert(0, out.pop().expect("click byte present"));
        while let Some(&last) = out.last() {
            if matches!(
                last,
                keys::VK_SHIFT | keys::VK_CONTROL | keys::VK_ALT | keys::VK_LWIN | VK_FORCE_RELEASE
            ) {
                suffix.insert(0, out.pop().expect("checked"));
            } else {
                break;
            }
        }
        encode_operand(out, VK_MOUSE_JUMP, id.0);
        out.extend_from_slice(&suffix);
        return WordCheck::Consumed;
    }

    // Explicit jump form: the tag byte is already at the tail; append the
    // operand bytes after it.
    let hi = (((id.0 >> 7) & 0x7F) as u8) | 0x80;
    let lo = ((id.0 & 0x7F) as u8) | 0x80;
    out.push(hi);
    out.push(lo);
    WordCheck::Consumed
}

/// Encodes a word list as a key-sequence byte string.
///
/// Returns `None` when any word fails to resolve; a sequence either encodes
/// completely or not at all (the whole command is then reported invalid by
/// the caller).
#[must_use]
pub fn encode_sequence(words: &[String], ctx: &mut dyn ParseContext) -> Option<Vec<u8>> {
    if words.is_empty() {
        return None;
    }
    let mut out: Vec<u8> = Vec::new();
    let mut expecting_wait_time = false;
    let mut expecting_jump_pos = false;

    for word in words {
        if expecting_wait_time {
            match check_pause(word, &mut out, true, ctx) {
                WordCheck::Consumed => {
                    expecting_wait_time = false;
                    continue;
                }
                _ => return None,
            }
        }
        if expecting_jump_pos {
            match check_hotspot(word, &mut out, false, ctx) {
                WordCheck::NeedsMore => continue,
                WordCheck::Consumed => {
                    expecting_jump_pos = false;
                    continue;
                }
                WordCheck::NotMatched => return None,
            }
        }

        if let Some(vk) = key_name_to_vk(word) {
            out.push(vk);
            continue;
        }

        // Explicit jump request starts scanning for a hotspot name.
        if matches!(
            word.to_ascii_lowercase().as_str(),
            "mousejump" | "jumpto" | "moveto"
        ) {
            out.push(VK_MOUSE_JUMP);
            expecting_jump_pos = true;
            continue;
        }

        // A hotspot name right after a mouse click means "click there":
        // jump first, then click.
        if let Some(&last) = out.last() {
            if is_mouse_button_vk(last) {
                match check_hotspot(word, &mut out, true, ctx) {
                    WordCheck::Consumed => continue,
                    WordCheck::NeedsMore => continue,
                    WordCheck::NotMatched => {}
                }
            }
        }

        match check_pause(word, &mut out, false, ctx) {
            WordCheck::Consumed => continue,
            WordCheck::NeedsMore => {
                expecting_wait_time = true;
                continue;
            }
            WordCheck::NotMatched => {}
        }

        if let Some(bind) = ctx.keybind_id(word) {
            encode_operand(&mut out, VK_TRIGGER_KEYBIND, bind.0);
            continue;
        }

        if let Some(combo) = keys::joined_combo(word) {
            out.extend_from_slice(&keys::VkCombo(combo).to_sequence_bytes());
            continue;
        }

        // Unresolvable word: the whole sequence is discarded.
        return None;
    }

    if out.is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tests_support::StubContext;

    #[test]
    fn test_operand_bytes_have_high_bit() {
        let mut out = Vec::new();
        encode_operand(&mut out, VK_PAUSE_TAG, 500);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], VK_PAUSE_TAG);
        assert!(out[1] & 0x80 != 0);
        assert!(out[2] & 0x80 != 0);
        assert_eq!(decode_sequence(&out), vec![SeqToken::Pause(500)]);
    }

    #[test]
    fn test_operand_clamps_to_14_bits() {
        let mut out = Vec::new();
        encode_operand(&mut out, VK_PAUSE_TAG, u16::MAX);
        assert_eq!(decode_sequence(&out), vec![SeqToken::Pause(MAX_OPERAND)]);
    }

    #[test]
    fn test_simple_key_run() {
        let mut ctx = StubContext::default();
        let words = vec!["A".to_string(), "B".to_string(), "Enter".to_string()];
        let seq = encode_sequence(&words, &mut ctx).unwrap();
        assert_eq!(
            decode_sequence(&seq),
            vec![
                SeqToken::Key(b'A'),
                SeqToken::Key(b'B'),
                SeqToken::Key(0x0D)
            ]
        );
    }

    #[test]
    fn test_pause_forms() {
        let mut ctx = StubContext::default();
        for words in [
            vec!["A".to_string(), "Pause".to_string(), "250".to_string()],
            vec!["A".to_string(), "Wait250".to_string()],
            vec!["A".to_string(), "P250".to_string()],
        ] {
            let seq = encode_sequence(&words, &mut ctx).unwrap();
            assert_eq!(
                decode_sequence(&seq),
                vec![SeqToken::Key(b'A'), SeqToken::Pause(250)],
                "words: {words:?}"
            );
        }
    }

    #[test]
    fn test_pause_keyword_without_time_fails() {
        let mut ctx = StubContext::default();
        let words = vec!["A".to_string(), "Pause".to_string()];
        assert!(encode_sequence(&words, &mut ctx).is_none());
    }

    #[test]
    fn test_keybind_reference_embeds_tag() {
        let mut ctx = StubContext::default();
        ctx.keybinds.insert("attack".to_string(), 7);
        let words = vec!["Attack".to_string(), "Enter".to_string()];
        let seq = encode_sequence(&words, &mut ctx).unwrap();
        assert_eq!(
            decode_sequence(&seq),
            vec![SeqToken::TriggerKeyBind(7), SeqToken::Key(0x0D)]
        );
    }

    #[test]
    fn test_hotspot_after_click_jumps_first() {
        let mut ctx = StubContext::default();
        ctx.hotspots.insert("minimap".to_string(), 12);
        let words = vec!["LMB".to_string(), "Minimap".to_string()];
        let seq = encode_sequence(&words, &mut ctx).unwrap();
        assert_eq!(
            decode_sequence(&seq),
            vec![SeqToken::MouseJump(12), SeqToken::Key(crate::VK_LBUTTON)]
        );
    }

    #[test]
    fn test_modified_click_keeps_modifier_with_click() {
        let mut ctx = StubContext::default();
        ctx.hotspots.insert("slot".to_string(), 3);
        let words = vec![
            "Shift".to_string(),
            "LMB".to_string(),
            "Slot".to_string(),
        ];
        let seq = encode_sequence(&words, &mut ctx).unwrap();
        assert_eq!(
            decode_sequence(&seq),
            vec![
                SeqToken::MouseJump(3),
                SeqToken::Key(keys::VK_SHIFT),
                SeqToken::Key(crate::VK_LBUTTON)
            ]
        );
    }

    #[test]
    fn test_unknown_word_discards_whole_sequence() {
        let mut ctx = StubContext::default();
        let words = vec!["A".to_string(), "NoSuchThing".to_string()];
        assert!(encode_sequence(&words, &mut ctx).is_none());
    }

    #[test]
    fn test_decode_skips_truncated_operand() {
        let bytes = [b'A', VK_PAUSE_TAG, 0x83];
        assert_eq!(decode_sequence(&bytes), vec![SeqToken::Key(b'A')]);
    }
}
