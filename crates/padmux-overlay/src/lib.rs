//! Overlay window lifecycle: the per-overlay alpha fade state machine and
//! dirty tracking for repaint dispatch.
//!
//! Each overlay walks `Hidden -> FadeIn -> Visible -> InactiveFadeOut ->
//! Inactive -> FadeOut -> Hidden`, driven by two bits set during command
//! processing each frame: `visible` (the layer stack wants the overlay
//! shown) and `active` (it was interacted with). Activity restores full
//! alpha and restarts the inactivity countdown; losing visibility forces
//! the fade-out path from any state.

use padmux_core::OverlayId;
use padmux_paint::WindowAlphaInfo;
use tracing::trace;

/// Where an overlay is in its fade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaPhase {
    #[default]
    Hidden,
    FadeIn,
    Visible,
    InactiveFadeOut,
    Inactive,
    FadeOut,
}

/// Alpha state for one overlay.
#[derive(Debug, Clone, Default)]
struct OverlayAlpha {
    phase: AlphaPhase,
    /// Current alpha in [0, 255], fractional for smooth rates.
    alpha: f32,
    /// Delay remaining before the current fade starts (ms).
    delay_ms: u32,
    /// Time since the last interaction (ms).
    idle_ms: u32,
    info: WindowAlphaInfo,
    visible: bool,
}

/// All overlay alpha machines plus the dirty set.
#[derive(Debug, Default)]
pub struct OverlayStates {
    overlays: Vec<OverlayAlpha>,
    dirty: Vec<bool>,
}

impl OverlayStates {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            overlays: vec![OverlayAlpha::default(); count],
            dirty: vec![true; count],
        }
    }

    pub fn resize(&mut self, count: usize) {
        self.overlays.resize(count, OverlayAlpha::default());
        self.dirty.resize(count, true);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Installs fade timings for an overlay (from the appearance cache).
    pub fn set_alpha_info(&mut self, overlay: OverlayId, info: WindowAlphaInfo) {
        if let Some(state) = self.overlays.get_mut(overlay.index()) {
            if state.info != info {
                state.info = info;
                self.dirty[overlay.index()] = true;
            }
        }
    }

    /// Sets whether the layer stack wants this overlay shown.
    pub fn set_visible(&mut self, overlay: OverlayId, visible: bool) {
        let Some(state) = self.overlays.get_mut(overlay.index()) else {
            return;
        };
        if state.visible == visible {
            return;
        }
        state.visible = visible;
        if visible {
            if matches!(
                state.phase,
                AlphaPhase::Hidden | AlphaPhase::FadeOut | AlphaPhase::InactiveFadeOut
            ) {
                state.delay_ms = if state.phase == AlphaPhase::Hidden {
                    state.info.fade_in_delay_ms
                } else {
                    0
                };
                state.phase = AlphaPhase::FadeIn;
                state.idle_ms = 0;
            }
        } else {
            state.phase = AlphaPhase::FadeOut;
            state.delay_ms = state.info.fade_out_delay_ms;
        }
        trace!("overlay {} visible={visible}", overlay.0);
    }

    /// Marks the overlay interacted-with this frame: restores full alpha
    /// and restarts the inactivity countdown.
    pub fn set_active(&mut self, overlay: OverlayId) {
        let Some(state) = self.overlays.get_mut(overlay.index()) else {
            return;
        };
        state.idle_ms = 0;
        if state.visible
            && matches!(state.phase, AlphaPhase::InactiveFadeOut | AlphaPhase::Inactive)
        {
            state.phase = AlphaPhase::FadeIn;
            state.delay_ms = 0;
        }
    }

    /// Current alpha byte for an overlay.
    #[must_use]
    pub fn alpha(&self, overlay: OverlayId) -> u8 {
        self.overlays
            .get(overlay.index())
            .map_or(0, |s| s.alpha.round().clamp(0.0, 255.0) as u8)
    }

    #[must_use]
    pub fn phase(&self, overlay: OverlayId) -> AlphaPhase {
        self.overlays
            .get(overlay.index())
            .map_or(AlphaPhase::Hidden, |s| s.phase)
    }

    #[must_use]
    pub fn is_hidden(&self, overlay: OverlayId) -> bool {
        self.phase(overlay) == AlphaPhase::Hidden
    }

    /// Marks an overlay's contents as needing a repaint.
    pub fn mark_dirty(&mut self, overlay: OverlayId) {
        if let Some(slot) = self.dirty.get_mut(overlay.index()) {
            *slot = true;
        }
    }

    /// Overlays needing a repaint since the last call; clears the set.
    pub fn take_dirty(&mut self) -> Vec<OverlayId> {
        let mut out = Vec::new();
        for (idx, dirty) in self.dirty.iter_mut().enumerate() {
            if *dirty {
                out.push(OverlayId(idx as u16));
                *dirty = false;
            }
        }
        out
    }

    /// Advances every overlay's fade by one tick.
    pub fn update(&mut self, dt_ms: u32) {
        for idx in 0..self.overlays.len() {
            let before = self.overlays[idx].alpha;
            self.step(idx, dt_ms);
            if (self.overlays[idx].alpha - before).abs() >= 0.5 {
                self.dirty[idx] = true;
            }
        }
    }

    fn step(&mut self, idx: usize, dt_ms: u32) {
        let state = &mut self.overlays[idx];
        let dt = dt_ms as f32;
        let max_alpha = f32::from(state.info.max_alpha);
        let inactive_alpha = f32::from(state.info.inactive_alpha).min(max_alpha);
        let rate = |time_ms: u32| {
            if time_ms == 0 {
                f32::from(u8::MAX)
            } else {
                max_alpha / time_ms as f32
            }
        };

        match state.phase {
            AlphaPhase::Hidden => {
                state.alpha = 0.0;
            }
            AlphaPhase::FadeIn => {
                if state.delay_ms > 0 {
                    state.delay_ms = state.delay_ms.saturating_sub(dt_ms);
                    return;
                }
                state.alpha += rate(state.info.fade_in_time_ms) * dt;
                if state.alpha >= max_alpha {
                    state.alpha = max_alpha;
                    state.phase = AlphaPhase::Visible;
                    state.idle_ms = 0;
                }
            }
            AlphaPhase::Visible => {
                state.alpha = max_alpha;
                state.idle_ms = state.idle_ms.saturating_add(dt_ms);
                if inactive_alpha < max_alpha && state.idle_ms >= state.info.inactive_delay_ms {
                    state.phase = AlphaPhase::InactiveFadeOut;
                }
            }
            AlphaPhase::InactiveFadeOut => {
                state.alpha -= rate(state.info.fade_out_time_ms) * dt;
                if state.alpha <= inactive_alpha {
                    state.alpha = inactive_alpha;
                    state.phase = AlphaPhase::Inactive;
                }
            }
            AlphaPhase::Inactive => {
                state.alpha = inactive_alpha;
            }
            AlphaPhase::FadeOut => {
                if state.delay_ms > 0 {
                    state.delay_ms = state.delay_ms.saturating_sub(dt_ms);
                    return;
                }
                state.alpha -= rate(state.info.fade_out_time_ms) * dt;
                if state.alpha <= 0.0 {
                    state.alpha = 0.0;
                    state.phase = AlphaPhase::Hidden;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> WindowAlphaInfo {
        WindowAlphaInfo {
            max_alpha: 200,
            fade_in_delay_ms: 32,
            fade_in_time_ms: 100,
            fade_out_delay_ms: 0,
            fade_out_time_ms: 100,
            inactive_delay_ms: 500,
            inactive_alpha: 80,
        }
    }

    fn run(states: &mut OverlayStates, ticks: usize) {
        for _ in 0..ticks {
            states.update(16);
        }
    }

    #[test]
    fn test_fade_in_after_delay() {
        let mut states = OverlayStates::new(1);
        states.set_alpha_info(OverlayId(0), info());
        states.set_visible(OverlayId(0), true);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::FadeIn);

        // During the delay nothing moves.
        states.update(16);
        assert_eq!(states.alpha(OverlayId(0)), 0);
        // Then alpha climbs until Visible at max.
        run(&mut states, 12);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Visible);
        assert_eq!(states.alpha(OverlayId(0)), 200);
    }

    #[test]
    fn test_inactivity_dims_to_inactive_alpha() {
        let mut states = OverlayStates::new(1);
        states.set_alpha_info(OverlayId(0), info());
        states.set_visible(OverlayId(0), true);
        run(&mut states, 15);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Visible);

        // Let it idle past the inactive delay, then settle.
        run(&mut states, 40 + 10);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Inactive);
        assert_eq!(states.alpha(OverlayId(0)), 80);
    }

    #[test]
    fn test_activity_restores_full_alpha() {
        let mut states = OverlayStates::new(1);
        states.set_alpha_info(OverlayId(0), info());
        states.set_visible(OverlayId(0), true);
        run(&mut states, 60);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Inactive);

        states.set_active(OverlayId(0));
        run(&mut states, 15);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Visible);
        assert_eq!(states.alpha(OverlayId(0)), 200);
    }

    #[test]
    fn test_hide_forces_fade_out_from_any_state() {
        let mut states = OverlayStates::new(1);
        states.set_alpha_info(OverlayId(0), info());
        states.set_visible(OverlayId(0), true);
        run(&mut states, 5);

        states.set_visible(OverlayId(0), false);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::FadeOut);
        run(&mut states, 20);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Hidden);
        assert_eq!(states.alpha(OverlayId(0)), 0);
    }

    #[test]
    fn test_alpha_changes_mark_dirty() {
        let mut states = OverlayStates::new(1);
        states.set_alpha_info(OverlayId(0), info());
        let _ = states.take_dirty();
        states.set_visible(OverlayId(0), true);
        run(&mut states, 5);
        let dirty = states.take_dirty();
        assert_eq!(dirty, vec![OverlayId(0)]);
        // Once settled and untouched nothing stays dirty.
        run(&mut states, 60);
        let _ = states.take_dirty();
        states.update(16);
        assert!(states.take_dirty().is_empty());
    }

    #[test]
    fn test_reshow_during_fade_out_resumes() {
        let mut states = OverlayStates::new(1);
        states.set_alpha_info(OverlayId(0), info());
        states.set_visible(OverlayId(0), true);
        run(&mut states, 15);
        states.set_visible(OverlayId(0), false);
        run(&mut states, 3);
        let mid = states.alpha(OverlayId(0));
        assert!(mid > 0 && mid < 200);
        states.set_visible(OverlayId(0), true);
        run(&mut states, 15);
        assert_eq!(states.phase(OverlayId(0)), AlphaPhase::Visible);
    }
}
