//! Logging setup for the deploykit binary
//!
//! Diagnostics go to stderr so that `--json` command output on stdout stays
//! machine readable. Debug builds print human-oriented lines; release builds
//! print one JSON object per event for CI log collectors.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset.
///
/// Dependencies (reqwest, hyper) stay at `warn` unless the level asks for
/// more detail than `info`, so upload retries are not buried under
/// connection-pool chatter.
pub fn default_directive(log_level: &str) -> String {
    let dependencies = match log_level {
        "debug" | "trace" => log_level,
        "error" => "error",
        _ => "warn",
    };
    format!("{},deploykit={},deploykit_engine={}", dependencies, log_level, log_level)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. A subscriber that is already
/// installed is left in place.
pub fn init_telemetry_with_level(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(debug_assertions)]
    let installed = registry
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();

    #[cfg(not(debug_assertions))]
    let installed = registry
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("Subscriber already installed, keeping it");
    }
}

/// Install the subscriber at `info`, used before configuration is available.
pub fn init_telemetry() {
    init_telemetry_with_level("info");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_quiet_at_info() {
        assert_eq!(
            default_directive("info"),
            "warn,deploykit=info,deploykit_engine=info"
        );
    }

    #[test]
    fn test_debug_opens_dependencies() {
        assert_eq!(
            default_directive("debug"),
            "debug,deploykit=debug,deploykit_engine=debug"
        );
    }

    #[test]
    fn test_directive_parses() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            assert!(EnvFilter::try_new(default_directive(level)).is_ok());
        }
    }
}
