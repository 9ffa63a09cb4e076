//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::settings::Settings;

/// padmux command-line arguments.
///
/// CLI values override settings loaded from `settings.ron`.
#[derive(Parser, Debug)]
#[command(name = "padmux", about = "Gamepad-to-keyboard overlay multiplexer")]
pub struct CliArgs {
    /// Profile (INI) file to load.
    #[arg(long, short = 'p')]
    pub profile: Option<PathBuf>,

    /// Simulation tick rate in Hz.
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// UI scale multiplier.
    #[arg(long)]
    pub ui_scale: Option<f64>,

    /// Log filter (error, warn, info, debug, trace or a full directive).
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Target window width override.
    #[arg(long)]
    pub width: Option<i32>,

    /// Target window height override.
    #[arg(long)]
    pub height: Option<i32>,

    /// Path to the settings file (overrides the default location).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Run without creating the overlay window (events are logged).
    #[arg(long)]
    pub headless: bool,
}

impl Settings {
    /// Applies CLI overrides to loaded settings.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref profile) = args.profile {
            self.profile_path = profile.clone();
        }
        if let Some(rate) = args.tick_rate {
            self.tick_rate_hz = rate.clamp(10, 1000);
        }
        if let Some(scale) = args.ui_scale {
            self.ui_scale = scale.clamp(0.1, 10.0);
        }
        if let Some(ref filter) = args.log_filter {
            self.log_filter = filter.clone();
        }
        if let Some(width) = args.width {
            self.target_width = width;
        }
        if let Some(height) = args.height {
            self.target_height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            profile: None,
            tick_rate: None,
            ui_scale: None,
            log_filter: None,
            width: None,
            height: None,
            settings: None,
            headless: false,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut settings = Settings::default();
        let mut args = empty_args();
        args.tick_rate = Some(30);
        args.profile = Some(PathBuf::from("mine.ini"));
        settings.apply_cli_overrides(&args);
        assert_eq!(settings.tick_rate_hz, 30);
        assert_eq!(settings.profile_path, PathBuf::from("mine.ini"));
        // Untouched fields keep their defaults.
        assert!((settings.ui_scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Settings::default();
        let mut settings = Settings::default();
        settings.apply_cli_overrides(&empty_args());
        assert_eq!(settings, original);
    }
}
