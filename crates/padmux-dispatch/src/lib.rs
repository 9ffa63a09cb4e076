//! The asynchronous input dispatcher: serializes key sequences and chat
//! macros into the host OS input queue, one key per tick, with modifier
//! locks and rate-limited pauses.
//!
//! The OS boundary is the [`InputSink`] trait; the character-to-key mapping
//! is the [`KeyScan`] trait with a built-in US-layout fallback. Both exist so
//! the platform glue stays replaceable and tests can observe exactly what
//! would reach the OS.

mod dispatcher;
mod sink;

pub use dispatcher::{BindSequences, DispatcherConfig, InputDispatcher};
pub use sink::{InputSink, KeyScan, RecordingSink, SyntheticEvent, UsLayoutKeyScan};
