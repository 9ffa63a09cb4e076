//! The dispatch queue and per-tick pump.

use std::collections::VecDeque;

use padmux_command::{
    MOD_ONLY_BASE, VK_FORCE_RELEASE, VK_MOUSE_JUMP, VK_PAUSE_TAG, VK_TRIGGER_KEYBIND, VkCombo,
};
use padmux_core::HotspotId;
use tracing::{debug, warn};

use crate::sink::{InputSink, KeyScan, SyntheticEvent};

/// Pacing and lock times, read from the profile's `System` section by the
/// caller.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Tasks older than this when reached at the queue head are dropped (ms).
    pub max_task_queued_time: u32,
    /// Pause after the first key of a chat macro, letting the target open
    /// its chat box (ms).
    pub post_first_key_delay: u32,
    /// Minimum time a pressed modifier stays held before it may release (ms).
    pub mod_release_lock_time: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_task_queued_time: 1000,
            post_first_key_delay: 0,
            mod_release_lock_time: 0,
        }
    }
}

/// Supplies the encoded sequence for a key bind referenced by an embedded
/// trigger tag. Implemented by the input map.
pub trait BindSequences {
    fn sequence_for(&self, bind_index: u16) -> Option<Vec<u8>>;
}

/// A no-op bind source for contexts with no key binds.
impl BindSequences for () {
    fn sequence_for(&self, _bind_index: u16) -> Option<Vec<u8>> {
        None
    }
}

#[derive(Debug)]
enum TaskPayload {
    Sequence(Vec<u8>),
    Chat(Vec<char>),
}

#[derive(Debug)]
struct DispatchTask {
    payload: TaskPayload,
    queued_at: u64,
    progress: usize,
    started: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingKey {
    vk: u16,
    mods: u8,
}

const FLAG_SHIFT: u8 = 1 << 0;
const FLAG_CTRL: u8 = 1 << 1;
const FLAG_ALT: u8 = 1 << 2;
const FLAG_WIN: u8 = 1 << 3;

const MOD_VKS: [(u8, u16); 4] = [
    (FLAG_SHIFT, 0x10),
    (FLAG_CTRL, 0x11),
    (FLAG_ALT, 0x12),
    (FLAG_WIN, 0x5B),
];

fn flag_for_mod_vk(vk: u8) -> Option<u8> {
    match vk {
        0x10 => Some(FLAG_SHIFT),
        0x11 => Some(FLAG_CTRL),
        0x12 => Some(FLAG_ALT),
        0x5B => Some(FLAG_WIN),
        _ => None,
    }
}

/// Outcome of pumping one task for a key.
enum Pumped {
    /// The task produced a pending key or pause; it may or may not remain.
    Yielded { finished: bool },
    /// The task ran out of payload without producing anything.
    Exhausted,
}

/// The dispatcher: a growable ring of tasks drained one key per tick.
#[derive(Debug, Default)]
pub struct InputDispatcher {
    config: DispatcherConfig,
    queue: VecDeque<DispatchTask>,
    now_ms: u64,
    queue_pause_ms: u32,
    mod_lock_ms: u32,
    mods_down: u8,
    partial_mods: u8,
    force_release: bool,
    pending: Option<PendingKey>,
}

impl InputDispatcher {
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn set_config(&mut self, config: DispatcherConfig) {
        self.config = config;
    }

    /// Queues an encoded key sequence.
    pub fn queue_sequence(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.queue.push_back(DispatchTask {
            payload: TaskPayload::Sequence(bytes.to_vec()),
            queued_at: self.now_ms,
            progress: 0,
            started: false,
        });
    }

    /// Queues a single tap of a key combination.
    pub fn queue_key(&mut self, combo: VkCombo) {
        self.queue_sequence(&combo.to_sequence_bytes());
    }

    /// Queues a chat macro to be typed character by character.
    pub fn queue_chat(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.queue.push_back(DispatchTask {
            payload: TaskPayload::Chat(text.chars().collect()),
            queued_at: self.now_ms,
            progress: 0,
            started: false,
        });
    }

    /// True when no work remains and no key is mid-flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.pending.is_none()
    }

    #[must_use]
    pub fn queued_tasks(&self) -> usize {
        self.queue.len()
    }

    /// One tick: advance timers, fetch at most one key, reconcile modifiers,
    /// and flush the sink in a single batch.
    pub fn update(
        &mut self,
        dt_ms: u32,
        binds: &dyn BindSequences,
        scan: &dyn KeyScan,
        sink: &mut dyn InputSink,
    ) {
        self.now_ms += u64::from(dt_ms);
        self.queue_pause_ms = self.queue_pause_ms.saturating_sub(dt_ms);
        self.mod_lock_ms = self.mod_lock_ms.saturating_sub(dt_ms);

        if self.pending.is_none() && self.queue_pause_ms == 0 {
            self.fetch_next_key(binds, scan, sink);
        }
        if self.pending.is_some() {
            self.try_emit_pending(sink);
        }
        sink.flush();
    }

    fn fetch_next_key(
        &mut self,
        binds: &dyn BindSequences,
        scan: &dyn KeyScan,
        sink: &mut dyn InputSink,
    ) {
        while self.pending.is_none() && self.queue_pause_ms == 0 {
            let Some(mut task) = self.queue.pop_front() else {
                return;
            };
            if !task.started
                && self.now_ms.saturating_sub(task.queued_at)
                    > u64::from(self.config.max_task_queued_time)
            {
                warn!(
                    "dropping input task queued {}ms ago",
                    self.now_ms - task.queued_at
                );
                continue;
            }
            task.started = true;

            let outcome = match &task.payload {
                TaskPayload::Sequence(_) => self.pump_sequence(&mut task, binds, sink),
                TaskPayload::Chat(_) => self.pump_chat(&mut task, scan),
            };
            match outcome {
                Pumped::Yielded { finished } => {
                    if !finished {
                        self.queue.push_front(task);
                    }
                }
                Pumped::Exhausted => {}
            }
        }
    }

    fn pump_sequence(
        &mut self,
        task: &mut DispatchTask,
        binds: &dyn BindSequences,
        sink: &mut dyn InputSink,
    ) -> Pumped {
        let TaskPayload::Sequence(bytes) = &task.payload else {
            unreachable!("pump_sequence called on a chat task");
        };
        while task.progress < bytes.len() {
            let b = bytes[task.progress];
            if let Some(flag) = flag_for_mod_vk(b) {
                self.partial_mods |= flag;
                task.progress += 1;
                continue;
            }
            match b {
                VK_FORCE_RELEASE => {
                    self.force_release = true;
                    task.progress += 1;
                }
                VK_PAUSE_TAG | VK_TRIGGER_KEYBIND | VK_MOUSE_JUMP => {
                    if task.progress + 2 >= bytes.len() {
                        warn!("truncated operand in key sequence");
                        return Pumped::Exhausted;
                    }
                    let hi = u16::from(bytes[task.progress + 1] & 0x7F);
                    let lo = u16::from(bytes[task.progress + 2] & 0x7F);
                    let value = (hi << 7) | lo;
                    task.progress += 3;
                    match b {
                        VK_PAUSE_TAG => {
                            self.queue_pause_ms += u32::from(value);
                            return Pumped::Yielded {
                                finished: task.progress >= bytes.len(),
                            };
                        }
                        VK_MOUSE_JUMP => {
                            sink.push(SyntheticEvent::CursorJump {
                                hotspot: HotspotId(value),
                            });
                        }
                        _ => match binds.sequence_for(value) {
                            Some(seq) => {
                                debug!("re-enqueueing key bind {value}");
                                self.queue.push_back(DispatchTask {
                                    payload: TaskPayload::Sequence(seq),
                                    queued_at: self.now_ms,
                                    progress: 0,
                                    started: false,
                                });
                            }
                            None => {
                                warn!("sequence references unknown key bind {value}");
                            }
                        },
                    }
                }
                vk => {
                    self.pending = Some(PendingKey {
                        vk: u16::from(vk),
                        mods: self.partial_mods,
                    });
                    self.partial_mods = 0;
                    task.progress += 1;
                    return Pumped::Yielded {
                        finished: task.progress >= bytes.len(),
                    };
                }
            }
        }
        Pumped::Exhausted
    }

    fn pump_chat(&mut self, task: &mut DispatchTask, scan: &dyn KeyScan) -> Pumped {
        let TaskPayload::Chat(chars) = &task.payload else {
            unreachable!("pump_chat called on a sequence task");
        };
        while task.progress < chars.len() {
            let c = chars[task.progress];
            let at_line_start =
                task.progress == 0 || chars.get(task.progress - 1) == Some(&'\r');
            task.progress += 1;
            // A line-opening '>' is the raw-text marker: open the chat box
            // with Enter rather than typing '>'.
            let mapped = if c == '>' && at_line_start {
                Some((0x0D, false))
            } else {
                scan.scan(c)
            };
            match mapped {
                Some((vk, shift)) => {
                    self.pending = Some(PendingKey {
                        vk,
                        mods: if shift { FLAG_SHIFT } else { 0 },
                    });
                    if task.progress == 1 {
                        self.queue_pause_ms += self.config.post_first_key_delay;
                    }
                    return Pumped::Yielded {
                        finished: task.progress >= chars.len(),
                    };
                }
                None => warn!("no key mapping for character {c:?} in chat macro"),
            }
        }
        Pumped::Exhausted
    }

    fn try_emit_pending(&mut self, sink: &mut dyn InputSink) {
        let Some(pending) = self.pending else {
            return;
        };
        let desired = pending.mods;

        if self.force_release && self.mods_down != 0 {
            if self.mod_lock_ms > 0 {
                return; // wait out the lock before forcing releases
            }
            self.release_mods(self.mods_down, sink);
        }
        if self.force_release {
            self.force_release = false;
        }

        // Press any modifiers the key needs.
        let to_press = desired & !self.mods_down;
        for (flag, vk) in MOD_VKS {
            if to_press & flag != 0 {
                sink.push(SyntheticEvent::KeyDown { vk });
                self.mods_down |= flag;
                self.mod_lock_ms = self.config.mod_release_lock_time;
            }
        }

        // Release modifiers the key must not have; a live release lock
        // defers the whole key instead.
        let to_release = self.mods_down & !desired;
        if to_release != 0 {
            if self.mod_lock_ms > 0 {
                return;
            }
            self.release_mods(to_release, sink);
        }

        // Modifier-only combos have nothing further to tap.
        if pending.vk != MOD_ONLY_BASE {
            sink.push(SyntheticEvent::KeyDown { vk: pending.vk });
            sink.push(SyntheticEvent::KeyUp { vk: pending.vk });
        }
        self.pending = None;
    }

    fn release_mods(&mut self, flags: u8, sink: &mut dyn InputSink) {
        for (flag, vk) in MOD_VKS {
            if flags & flag != 0 {
                sink.push(SyntheticEvent::KeyUp { vk });
                self.mods_down &= !flag;
            }
        }
    }

    /// Drops all queued work and releases every held modifier exactly once.
    pub fn cleanup(&mut self, sink: &mut dyn InputSink) {
        self.queue.clear();
        self.pending = None;
        self.partial_mods = 0;
        self.force_release = false;
        self.queue_pause_ms = 0;
        if self.mods_down != 0 {
            self.release_mods(self.mods_down, sink);
            sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, UsLayoutKeyScan};
    use padmux_command::encode_operand;

    const TICK: u32 = 16;

    fn dispatcher() -> InputDispatcher {
        InputDispatcher::new(DispatcherConfig::default())
    }

    fn run_until_idle(
        d: &mut InputDispatcher,
        binds: &dyn BindSequences,
        sink: &mut RecordingSink,
        max_ticks: usize,
    ) {
        let scan = UsLayoutKeyScan;
        for _ in 0..max_ticks {
            if d.is_idle() {
                break;
            }
            d.update(TICK, binds, &scan, sink);
        }
    }

    #[test]
    fn test_plain_tap() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        d.queue_sequence(&[b'A']);
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        assert_eq!(
            sink.events,
            vec![
                SyntheticEvent::KeyDown { vk: 0x41 },
                SyntheticEvent::KeyUp { vk: 0x41 }
            ]
        );
        assert_eq!(sink.flushes, 1);
        assert!(d.is_idle());
    }

    #[test]
    fn test_modifier_transitions() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        // Ctrl+X then plain A: Ctrl must press before X and release before A.
        d.queue_sequence(&[0x11, b'X']);
        d.queue_sequence(&[b'A']);
        run_until_idle(&mut d, &(), &mut sink, 10);
        assert_eq!(
            sink.events,
            vec![
                SyntheticEvent::KeyDown { vk: 0x11 },
                SyntheticEvent::KeyDown { vk: 0x58 },
                SyntheticEvent::KeyUp { vk: 0x58 },
                SyntheticEvent::KeyUp { vk: 0x11 },
                SyntheticEvent::KeyDown { vk: 0x41 },
                SyntheticEvent::KeyUp { vk: 0x41 },
            ]
        );
    }

    #[test]
    fn test_mod_release_lock_defers_main_key() {
        let mut d = InputDispatcher::new(DispatcherConfig {
            mod_release_lock_time: 100,
            ..DispatcherConfig::default()
        });
        let mut sink = RecordingSink::default();
        d.queue_sequence(&[0x10, b'X']);
        d.queue_sequence(&[b'A']);
        // First tick: shift down + X tapped; lock armed.
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        let after_x = sink.events.len();
        // Next tick: A wants shift released but the lock is live, so nothing
        // may be emitted yet.
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        assert_eq!(sink.events.len(), after_x);
        // After the lock expires the release and tap go through.
        for _ in 0..8 {
            d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        }
        assert!(sink.events.contains(&SyntheticEvent::KeyUp { vk: 0x10 }));
        assert!(sink.events.contains(&SyntheticEvent::KeyDown { vk: 0x41 }));
    }

    #[test]
    fn test_pause_tag_blocks_queue() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        let mut seq = vec![b'A'];
        encode_operand(&mut seq, VK_PAUSE_TAG, 50);
        seq.push(b'B');
        d.queue_sequence(&seq);

        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink); // A
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink); // hits pause
        assert_eq!(sink.events.len(), 2, "only A so far");
        // The pause (50ms) must elapse before B.
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        assert!(sink.events.contains(&SyntheticEvent::KeyDown { vk: 0x42 }));
    }

    #[test]
    fn test_mouse_jump_precedes_click() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        let mut seq = Vec::new();
        encode_operand(&mut seq, VK_MOUSE_JUMP, 12);
        seq.push(0x01); // left click
        d.queue_sequence(&seq);
        run_until_idle(&mut d, &(), &mut sink, 5);
        assert_eq!(
            sink.events,
            vec![
                SyntheticEvent::CursorJump {
                    hotspot: HotspotId(12)
                },
                SyntheticEvent::KeyDown { vk: 0x01 },
                SyntheticEvent::KeyUp { vk: 0x01 },
            ]
        );
    }

    #[test]
    fn test_trigger_tag_requeues_bind() {
        struct OneBind;
        impl BindSequences for OneBind {
            fn sequence_for(&self, bind_index: u16) -> Option<Vec<u8>> {
                (bind_index == 3).then(|| vec![b'Z'])
            }
        }
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        let mut seq = Vec::new();
        encode_operand(&mut seq, VK_TRIGGER_KEYBIND, 3);
        d.queue_sequence(&seq);
        run_until_idle(&mut d, &OneBind, &mut sink, 5);
        assert!(sink.events.contains(&SyntheticEvent::KeyDown { vk: 0x5A }));
    }

    #[test]
    fn test_stale_task_dropped() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        d.queue_sequence(&[b'A']);
        // One huge tick ages the task past the 1000ms default.
        d.update(2000, &(), &UsLayoutKeyScan, &mut sink);
        assert!(sink.events.is_empty());
        assert!(d.is_idle());
    }

    #[test]
    fn test_chat_macro_typing() {
        let mut d = InputDispatcher::new(DispatcherConfig {
            post_first_key_delay: 0,
            ..DispatcherConfig::default()
        });
        let mut sink = RecordingSink::default();
        d.queue_chat(">hi\r");
        run_until_idle(&mut d, &(), &mut sink, 20);
        let downs: Vec<u16> = sink
            .events
            .iter()
            .filter_map(|e| match e {
                SyntheticEvent::KeyDown { vk } => Some(*vk),
                _ => None,
            })
            .collect();
        // '>' at line start opens the chat box with Enter; then h, i, Enter.
        assert_eq!(downs, vec![0x0D, 0x48, 0x49, 0x0D]);
    }

    #[test]
    fn test_chat_shift_for_uppercase() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        d.queue_chat("/Hi");
        run_until_idle(&mut d, &(), &mut sink, 20);
        // The capital H must arrive with shift held.
        let idx_shift_down = sink
            .events
            .iter()
            .position(|e| *e == SyntheticEvent::KeyDown { vk: 0x10 })
            .expect("shift pressed");
        let idx_h = sink
            .events
            .iter()
            .position(|e| *e == SyntheticEvent::KeyDown { vk: 0x48 })
            .expect("H pressed");
        assert!(idx_shift_down < idx_h);
    }

    #[test]
    fn test_cleanup_releases_mods_exactly_once() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        // Leave ctrl held by interrupting between press and release.
        d.queue_sequence(&[0x11, b'X']);
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        sink.events.clear();

        d.cleanup(&mut sink);
        assert_eq!(sink.events, vec![SyntheticEvent::KeyUp { vk: 0x11 }]);
        sink.events.clear();
        d.cleanup(&mut sink);
        assert!(sink.events.is_empty(), "second cleanup must be a no-op");
    }

    #[test]
    fn test_one_key_per_tick() {
        let mut d = dispatcher();
        let mut sink = RecordingSink::default();
        d.queue_sequence(&[b'A', b'B', b'C']);
        d.update(TICK, &(), &UsLayoutKeyScan, &mut sink);
        let downs = sink
            .events
            .iter()
            .filter(|e| matches!(e, SyntheticEvent::KeyDown { .. }))
            .count();
        assert_eq!(downs, 1, "at most one main key per tick");
    }
}
