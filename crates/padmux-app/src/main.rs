//! The padmux binary: translates gamepad input into synthetic keyboard and
//! mouse events, driven by a user-edited profile, with overlay menus.

mod cli;
mod engine;
mod gamepad;
mod logging;
mod settings;
mod window;

use clap::Parser;
use padmux_core::Size;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::engine::Engine;
use crate::settings::Settings;
use crate::window::OverlayShell;

fn main() {
    let args = CliArgs::parse();

    let settings_path = args
        .settings
        .clone()
        .or_else(Settings::default_path)
        .unwrap_or_else(|| "settings.ron".into());
    let mut settings = Settings::load(&settings_path);
    settings.apply_cli_overrides(&args);

    logging::init_logging(&settings.log_filter);
    info!("padmux starting; profile {}", settings.profile_path.display());

    let target = Size::new(
        if settings.target_width > 0 { settings.target_width } else { 1920 },
        if settings.target_height > 0 { settings.target_height } else { 1080 },
    );

    let engine = match Engine::from_profile_file(&settings.profile_path, target, settings.ui_scale)
    {
        Ok(engine) => engine,
        Err(e) => {
            // A missing or unparseable profile is fatal; everything less is
            // a recoverable error surfaced through the System overlay.
            error!("cannot load profile: {e}");
            std::process::exit(2);
        }
    };
    if !engine.map.errors.is_empty() {
        info!(
            "profile loaded with {} recoverable issue(s)",
            engine.map.errors.total()
        );
    }

    let code = if args.headless {
        window::run_headless(engine, settings.tick_rate_hz, None)
    } else {
        OverlayShell::new(engine, settings.tick_rate_hz).run()
    };
    std::process::exit(code);
}
