//! Output seams: synthetic events, the OS sink, and character scanning.

use padmux_core::HotspotId;

/// One synthetic input event bound for the OS queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    /// Press a virtual key (mouse buttons use their VK codes).
    KeyDown { vk: u16 },
    /// Release a virtual key.
    KeyUp { vk: u16 },
    /// Move the cursor to a hotspot before the next mouse-button event.
    CursorJump { hotspot: HotspotId },
    /// Move the cursor by a pixel delta.
    CursorMove { dx: i32, dy: i32 },
    /// Scroll the mouse wheel (positive = up/away).
    Wheel { delta: i32 },
}

/// Receives batched synthetic events. One `flush` per update tick.
pub trait InputSink {
    fn push(&mut self, event: SyntheticEvent);
    fn flush(&mut self);
}

/// An [`InputSink`] that records everything, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Every event pushed, in order.
    pub events: Vec<SyntheticEvent>,
    /// Number of flushes performed.
    pub flushes: usize,
}

impl InputSink for RecordingSink {
    fn push(&mut self, event: SyntheticEvent) {
        self.events.push(event);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// Maps a character to a `(virtual key, needs shift)` pair.
///
/// The platform layer can substitute the host keyboard layout; the default
/// is a US layout table, which matches what the original VkKeyScan-based
/// mapping produces on a US keyboard.
pub trait KeyScan {
    fn scan(&self, c: char) -> Option<(u16, bool)>;
}

/// US-layout character mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsLayoutKeyScan;

impl KeyScan for UsLayoutKeyScan {
    fn scan(&self, c: char) -> Option<(u16, bool)> {
        if c.is_ascii_uppercase() {
            return Some((u16::from(c as u8), true));
        }
        if c.is_ascii_lowercase() {
            return Some((u16::from(c.to_ascii_uppercase() as u8), false));
        }
        if c.is_ascii_digit() {
            return Some((u16::from(c as u8), false));
        }
        let (vk, shift) = match c {
            ' ' => (0x20, false),
            '\r' | '\n' => (0x0D, false),
            '\t' => (0x09, false),
            '!' => (u16::from(b'1'), true),
            '@' => (u16::from(b'2'), true),
            '#' => (u16::from(b'3'), true),
            '$' => (u16::from(b'4'), true),
            '%' => (u16::from(b'5'), true),
            '^' => (u16::from(b'6'), true),
            '&' => (u16::from(b'7'), true),
            '*' => (u16::from(b'8'), true),
            '(' => (u16::from(b'9'), true),
            ')' => (u16::from(b'0'), true),
            ';' => (0xBA, false),
            ':' => (0xBA, true),
            '=' => (0xBB, false),
            '+' => (0xBB, true),
            ',' => (0xBC, false),
            '<' => (0xBC, true),
            '-' => (0xBD, false),
            '_' => (0xBD, true),
            '.' => (0xBE, false),
            '>' => (0xBE, true),
            '/' => (0xBF, false),
            '?' => (0xBF, true),
            '`' => (0xC0, false),
            '~' => (0xC0, true),
            '[' => (0xDB, false),
            '{' => (0xDB, true),
            '\\' => (0xDC, false),
            '|' => (0xDC, true),
            ']' => (0xDD, false),
            '}' => (0xDD, true),
            '\'' => (0xDE, false),
            '"' => (0xDE, true),
            _ => return None,
        };
        Some((vk, shift))
    }
}
