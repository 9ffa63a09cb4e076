//! Tracing subscriber setup.
//!
//! Console output with uptime timestamps and module targets; the filter
//! comes from `RUST_LOG` when set, then the settings file, then a quiet
//! default.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the tracing subscriber.
///
/// `filter_override` comes from the settings/CLI; `RUST_LOG` wins when set.
pub fn init_logging(filter_override: &str) {
    let fallback = if filter_override.is_empty() {
        "info,gilrs=warn,winit=warn".to_string()
    } else {
        filter_override.to_string()
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// The default filter used when nothing else is configured.
#[must_use]
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info,gilrs=warn,winit=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = default_env_filter();
        let text = format!("{filter}");
        assert!(text.contains("gilrs=warn"));
        assert!(text.contains("info"));
    }

    #[test]
    fn test_custom_directives_parse() {
        for directive in ["debug", "warn,padmux_map=trace", "error"] {
            assert!(EnvFilter::try_new(directive).is_ok(), "directive {directive}");
        }
    }
}
