//! The user-edited profile: a cached, typed section/property store with
//! variable expansion and change-set tracking.
//!
//! The on-disk format is INI-like: `[Section]` headers followed by
//! `Key = Value` lines. Values may reference variables as `$Name$`, which are
//! expanded when read and re-expanded when a variable changes. Writes are
//! cached and flushed with [`Profile::save_changes_to_file`], which only
//! touches properties whose value differs from what the file last held.

mod error;
mod ini;
mod store;

pub use error::ProfileError;
pub use store::{ChangedSections, Profile, Property, Section};
