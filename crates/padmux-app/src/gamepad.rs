//! Gamepad polling glue: wraps gilrs events into [`PadButton`] presses and
//! derives the five button-action phases from press/hold/release timing.
//!
//! Sticks become directional pseudo-buttons through a deadzone with
//! hysteresis so a wobbling axis does not chatter.

use gilrs::{Axis, Button, Event, EventType, Gilrs};
use glam::Vec2;
use padmux_map::{ButtonPhase, PadButton};
use tracing::{debug, warn};

/// Default hold time before the `Hold` phase fires (ms) when the binding
/// does not specify one.
pub const DEFAULT_HOLD_TIME_MS: u32 = 400;

/// Axis magnitude that engages a stick direction.
const STICK_ON_THRESHOLD: f32 = 0.5;
/// Axis magnitude that releases it (hysteresis).
const STICK_OFF_THRESHOLD: f32 = 0.35;

/// A press or release edge on a pad button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEdge {
    Pressed(PadButton),
    Released(PadButton),
}

fn unify(button: Button) -> Option<PadButton> {
    Some(match button {
        Button::South => PadButton::South,
        Button::East => PadButton::East,
        Button::North => PadButton::North,
        Button::West => PadButton::West,
        Button::LeftTrigger => PadButton::LeftShoulder,
        Button::RightTrigger => PadButton::RightShoulder,
        Button::LeftTrigger2 => PadButton::LeftTrigger,
        Button::RightTrigger2 => PadButton::RightTrigger,
        Button::LeftThumb => PadButton::LeftStickClick,
        Button::RightThumb => PadButton::RightStickClick,
        Button::Start => PadButton::Start,
        Button::Select => PadButton::Select,
        Button::DPadUp => PadButton::DPadUp,
        Button::DPadDown => PadButton::DPadDown,
        Button::DPadLeft => PadButton::DPadLeft,
        Button::DPadRight => PadButton::DPadRight,
        _ => return None,
    })
}

/// Per-stick direction engagement with hysteresis.
#[derive(Debug, Default)]
struct StickState {
    engaged: [bool; 4],
}

impl StickState {
    /// Applies a new axis pair, emitting press/release edges for the four
    /// direction pseudo-buttons.
    fn update(&mut self, pos: Vec2, buttons: [PadButton; 4], out: &mut Vec<PadEdge>) {
        // gilrs reports stick-up as positive Y.
        let values = [-pos.x, pos.x, pos.y, -pos.y];
        for (idx, value) in values.into_iter().enumerate() {
            let engaged = self.engaged[idx];
            if !engaged && value >= STICK_ON_THRESHOLD {
                self.engaged[idx] = true;
                out.push(PadEdge::Pressed(buttons[idx]));
            } else if engaged && value < STICK_OFF_THRESHOLD {
                self.engaged[idx] = false;
                out.push(PadEdge::Released(buttons[idx]));
            }
        }
    }
}

const LEFT_STICK_DIRS: [PadButton; 4] = [
    PadButton::LStickLeft,
    PadButton::LStickRight,
    PadButton::LStickUp,
    PadButton::LStickDown,
];
const RIGHT_STICK_DIRS: [PadButton; 4] = [
    PadButton::RStickLeft,
    PadButton::RStickRight,
    PadButton::RStickUp,
    PadButton::RStickDown,
];

/// Polls gilrs and yields [`PadEdge`] streams.
pub struct GamepadPoller {
    gilrs: Option<Gilrs>,
    left: StickState,
    right: StickState,
    left_raw: Vec2,
    right_raw: Vec2,
}

impl GamepadPoller {
    /// Connects to the platform gamepad service. A failure is downgraded to
    /// a warning: padmux still runs (profiles can be tested keyboard-only).
    #[must_use]
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("gamepad service unavailable: {e}");
                None
            }
        };
        Self {
            gilrs,
            left: StickState::default(),
            right: StickState::default(),
            left_raw: Vec2::ZERO,
            right_raw: Vec2::ZERO,
        }
    }

    /// Drains pending gamepad events into button edges.
    pub fn poll(&mut self) -> Vec<PadEdge> {
        let mut out = Vec::new();
        let Some(gilrs) = self.gilrs.as_mut() else {
            return out;
        };
        while let Some(Event { event, .. }) = gilrs.next_event() {
            match event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(b) = unify(button) {
                        debug!("pad press {b:?}");
                        out.push(PadEdge::Pressed(b));
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(b) = unify(button) {
                        out.push(PadEdge::Released(b));
                    }
                }
                EventType::AxisChanged(axis, value, _) => match axis {
                    Axis::LeftStickX => self.left_raw.x = value,
                    Axis::LeftStickY => self.left_raw.y = value,
                    Axis::RightStickX => self.right_raw.x = value,
                    Axis::RightStickY => self.right_raw.y = value,
                    _ => {}
                },
                _ => {}
            }
        }
        let left_raw = self.left_raw;
        let right_raw = self.right_raw;
        self.left.update(left_raw, LEFT_STICK_DIRS, &mut out);
        self.right.update(right_raw, RIGHT_STICK_DIRS, &mut out);
        out
    }
}

impl Default for GamepadPoller {
    fn default() -> Self {
        Self::new()
    }
}

/// One button's phase event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEvent {
    pub button: PadButton,
    pub phase: ButtonPhase,
}

#[derive(Debug, Clone, Copy)]
struct HeldButton {
    button: PadButton,
    elapsed_ms: u32,
    hold_fired: bool,
}

/// Derives Down/Press/Hold/Tap/Release phase events from button edges.
#[derive(Debug, Default)]
pub struct ButtonTracker {
    held: Vec<HeldButton>,
}

impl ButtonTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a press edge: fires `Down` and `Press`.
    pub fn press(&mut self, button: PadButton) -> Vec<PhaseEvent> {
        if self.held.iter().any(|h| h.button == button) {
            return Vec::new();
        }
        self.held.push(HeldButton {
            button,
            elapsed_ms: 0,
            hold_fired: false,
        });
        vec![
            PhaseEvent {
                button,
                phase: ButtonPhase::Down,
            },
            PhaseEvent {
                button,
                phase: ButtonPhase::Press,
            },
        ]
    }

    /// Handles a release edge: fires `Tap` (only when `Hold` never fired)
    /// then `Release`.
    pub fn release(&mut self, button: PadButton) -> Vec<PhaseEvent> {
        let Some(idx) = self.held.iter().position(|h| h.button == button) else {
            return Vec::new();
        };
        let held = self.held.swap_remove(idx);
        let mut out = Vec::new();
        if !held.hold_fired {
            out.push(PhaseEvent {
                button,
                phase: ButtonPhase::Tap,
            });
        }
        out.push(PhaseEvent {
            button,
            phase: ButtonPhase::Release,
        });
        out
    }

    /// Advances hold timers; `hold_time_for` supplies each button's
    /// configured hold time (0 = use the default).
    pub fn update(
        &mut self,
        dt_ms: u32,
        mut hold_time_for: impl FnMut(PadButton) -> u32,
    ) -> Vec<PhaseEvent> {
        let mut out = Vec::new();
        for held in &mut self.held {
            if held.hold_fired {
                continue;
            }
            held.elapsed_ms = held.elapsed_ms.saturating_add(dt_ms);
            let threshold = match hold_time_for(held.button) {
                0 => DEFAULT_HOLD_TIME_MS,
                t => t,
            };
            if held.elapsed_ms >= threshold {
                held.hold_fired = true;
                out.push(PhaseEvent {
                    button: held.button,
                    phase: ButtonPhase::Hold,
                });
            }
        }
        out
    }

    /// Buttons currently held.
    #[must_use]
    pub fn held_buttons(&self) -> Vec<PadButton> {
        self.held.iter().map(|h| h.button).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_fires_down_and_press() {
        let mut tracker = ButtonTracker::new();
        let events = tracker.press(PadButton::South);
        assert_eq!(
            events,
            vec![
                PhaseEvent {
                    button: PadButton::South,
                    phase: ButtonPhase::Down
                },
                PhaseEvent {
                    button: PadButton::South,
                    phase: ButtonPhase::Press
                },
            ]
        );
        // A repeated press edge while held is ignored.
        assert!(tracker.press(PadButton::South).is_empty());
    }

    #[test]
    fn test_quick_release_fires_tap() {
        let mut tracker = ButtonTracker::new();
        tracker.press(PadButton::South);
        tracker.update(100, |_| 0);
        let events = tracker.release(PadButton::South);
        assert_eq!(events[0].phase, ButtonPhase::Tap);
        assert_eq!(events[1].phase, ButtonPhase::Release);
    }

    #[test]
    fn test_long_hold_fires_hold_and_skips_tap() {
        let mut tracker = ButtonTracker::new();
        tracker.press(PadButton::South);
        let mut hold_events = Vec::new();
        for _ in 0..30 {
            hold_events.extend(tracker.update(16, |_| 0));
        }
        assert_eq!(
            hold_events,
            vec![PhaseEvent {
                button: PadButton::South,
                phase: ButtonPhase::Hold
            }]
        );
        let events = tracker.release(PadButton::South);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ButtonPhase::Release);
    }

    #[test]
    fn test_custom_hold_time() {
        let mut tracker = ButtonTracker::new();
        tracker.press(PadButton::LeftShoulder);
        let events = tracker.update(120, |_| 100);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ButtonPhase::Hold);
    }

    #[test]
    fn test_stick_hysteresis() {
        let mut stick = StickState::default();
        let mut out = Vec::new();
        stick.update(Vec2::new(0.6, 0.0), LEFT_STICK_DIRS, &mut out);
        assert_eq!(out, vec![PadEdge::Pressed(PadButton::LStickRight)]);
        out.clear();
        // Wobble above the release threshold keeps it engaged.
        stick.update(Vec2::new(0.4, 0.0), LEFT_STICK_DIRS, &mut out);
        assert!(out.is_empty());
        stick.update(Vec2::new(0.2, 0.0), LEFT_STICK_DIRS, &mut out);
        assert_eq!(out, vec![PadEdge::Released(PadButton::LStickRight)]);
    }

    #[test]
    fn test_stick_up_is_positive_y() {
        let mut stick = StickState::default();
        let mut out = Vec::new();
        stick.update(Vec2::new(0.0, 0.8), LEFT_STICK_DIRS, &mut out);
        assert_eq!(out, vec![PadEdge::Pressed(PadButton::LStickUp)]);
    }
}
