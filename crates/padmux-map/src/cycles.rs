//! Key-bind cycles: ordered rotations of key binds with per-entry hotspots.

use padmux_core::{CycleId, HotspotId, KeyBindId};

/// One slot of a cycle. Empty slots keep their place in the rotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleEntry {
    pub bind: Option<KeyBindId>,
    pub hotspot: HotspotId,
}

/// An ordered rotation of key binds.
#[derive(Debug, Clone, Default)]
pub struct KeyBindCycle {
    pub name: String,
    pub entries: Vec<CycleEntry>,
}

impl KeyBindCycle {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runtime rotation state, one slot per cycle.
///
/// `last` is `None` before the first advance; `default` is where `Reset`
/// returns to. Both stay below the cycle length even when a reload shrinks
/// the cycle.
#[derive(Debug, Default)]
pub struct CycleState {
    last: Vec<Option<u16>>,
    default: Vec<u16>,
}

impl CycleState {
    /// Grows state slots to cover `count` cycles.
    pub fn ensure_len(&mut self, count: usize) {
        if self.last.len() < count {
            self.last.resize(count, None);
            self.default.resize(count, 0);
        }
    }

    /// Clamps indices after a cycle changed length.
    pub fn clamp_to(&mut self, cycle: CycleId, len: usize) {
        let idx = cycle.index();
        self.ensure_len(idx + 1);
        if let Some(last) = self.last[idx] {
            if usize::from(last) >= len {
                self.last[idx] = None;
            }
        }
        if len > 0 && usize::from(self.default[idx]) >= len {
            self.default[idx] = (len - 1) as u16;
        }
    }

    #[must_use]
    pub fn last_index(&self, cycle: CycleId) -> Option<u16> {
        self.last.get(cycle.index()).copied().flatten()
    }

    #[must_use]
    pub fn default_index(&self, cycle: CycleId) -> u16 {
        self.default.get(cycle.index()).copied().unwrap_or(0)
    }

    /// Advances forward or backward by `count`, returning the new index.
    ///
    /// Without wrap the index saturates at the ends. Returns `None` for an
    /// empty cycle or when a non-wrapping advance runs off the end from an
    /// unstarted cycle.
    pub fn advance(
        &mut self,
        cycle: CycleId,
        len: usize,
        forward: bool,
        wrap: bool,
        count: u16,
    ) -> Option<u16> {
        if len == 0 {
            return None;
        }
        let idx = cycle.index();
        self.ensure_len(idx + 1);
        let len_i = len as i32;
        let step = i32::from(count.max(1));
        let base = match self.last[idx] {
            Some(last) => i32::from(last),
            // An unstarted cycle advances from just outside either end so
            // the first step lands on the first (or last) entry.
            None => {
                if forward {
                    -1
                } else {
                    len_i
                }
            }
        };
        let mut next = if forward { base + step } else { base - step };
        if wrap {
            next = next.rem_euclid(len_i);
        } else {
            next = next.clamp(0, len_i - 1);
        }
        let next = next as u16;
        self.last[idx] = Some(next);
        Some(next)
    }

    /// The entry to re-trigger for `Last`/`Repeat`: the last used index, or
    /// the default when the cycle has not been used yet.
    pub fn last_or_default(&mut self, cycle: CycleId, len: usize) -> Option<u16> {
        if len == 0 {
            return None;
        }
        let idx = cycle.index();
        self.ensure_len(idx + 1);
        let result = self.last[idx].unwrap_or_else(|| self.default[idx].min((len - 1) as u16));
        self.last[idx] = Some(result);
        Some(result)
    }

    /// Returns the rotation to its default position.
    pub fn reset(&mut self, cycle: CycleId) {
        let idx = cycle.index();
        self.ensure_len(idx + 1);
        self.last[idx] = None;
    }

    /// Makes the last-used entry the new default.
    pub fn set_default_to_last(&mut self, cycle: CycleId) {
        let idx = cycle.index();
        self.ensure_len(idx + 1);
        if let Some(last) = self.last[idx] {
            self.default[idx] = last;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_advance_lands_on_zero() {
        let mut state = CycleState::default();
        let c = CycleId(0);
        assert_eq!(state.advance(c, 5, true, true, 1), Some(0));
    }

    #[test]
    fn test_wrap_around_after_full_rotation() {
        let mut state = CycleState::default();
        let c = CycleId(0);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(state.advance(c, 5, true, true, 1).unwrap());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_no_wrap_saturates() {
        let mut state = CycleState::default();
        let c = CycleId(0);
        for _ in 0..10 {
            state.advance(c, 3, true, false, 1);
        }
        assert_eq!(state.last_index(c), Some(2));
    }

    #[test]
    fn test_prev_from_unstarted_wraps_to_end() {
        let mut state = CycleState::default();
        let c = CycleId(0);
        assert_eq!(state.advance(c, 4, false, true, 1), Some(3));
    }

    #[test]
    fn test_reset_and_set_default() {
        let mut state = CycleState::default();
        let c = CycleId(0);
        state.advance(c, 5, true, true, 3);
        assert_eq!(state.last_index(c), Some(2));
        state.set_default_to_last(c);
        state.reset(c);
        assert_eq!(state.last_index(c), None);
        assert_eq!(state.last_or_default(c, 5), Some(2));
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut state = CycleState::default();
        let c = CycleId(0);
        state.advance(c, 8, true, true, 7);
        state.set_default_to_last(c);
        state.clamp_to(c, 3);
        assert_eq!(state.last_index(c), None);
        assert_eq!(state.default_index(c), 2);
    }
}
