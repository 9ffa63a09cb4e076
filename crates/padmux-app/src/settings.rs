//! App-level settings: a small RON file with CLI overrides.
//!
//! These are padmux's own knobs, distinct from the user-edited profile
//! (which is the INI file driving all binding behavior). Malformed or
//! missing settings fall back to defaults with a warning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Path of the profile to load on startup.
    pub profile_path: PathBuf,
    /// Simulation tick rate in Hz.
    pub tick_rate_hz: u32,
    /// UI scale multiplier for overlay layout.
    pub ui_scale: f64,
    /// Log filter override (e.g. "debug", "padmux_map=trace").
    pub log_filter: String,
    /// Target window size override (0 = track the real target).
    pub target_width: i32,
    pub target_height: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile_path: PathBuf::from("profile.ini"),
            tick_rate_hz: 60,
            ui_scale: 1.0,
            log_filter: String::new(),
            target_width: 0,
            target_height: 0,
        }
    }
}

impl Settings {
    /// The platform config path for `settings.ron`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("padmux").join("settings.ron"))
    }

    /// Loads settings, falling back to defaults when the file is missing or
    /// malformed (with a warning).
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match ron::from_str(&text) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("malformed settings file {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("could not read settings file {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Saves settings as pretty RON.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        let mut settings = Settings::default();
        settings.tick_rate_hz = 120;
        settings.ui_scale = 1.5;
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let loaded = Settings::load(Path::new("/nonexistent/padmux/settings.ron"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "not ron at all {{{").unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded, Settings::default());
    }
}
