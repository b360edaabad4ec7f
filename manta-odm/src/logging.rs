//! Optional logging bootstrap.
//!
//! Host applications normally install their own `tracing` subscriber; this
//! module only exists for standalone use. Settings come from the
//! environment, read once into a [`LogConfig`]:
//!
//! - `MANTA_DEBUG=true|1|yes` - enable debug logging
//! - `MANTA_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `MANTA_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Without `MANTA_DEBUG` or `MANTA_LOG_LEVEL` set, [`init`] installs
//! nothing and whatever subscriber the host set up stays in charge.

use std::env;
use std::sync::Once;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Structured JSON lines.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
    /// Single-line compact output.
    Compact,
}

/// Logging settings assembled from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether any logging was requested at all.
    pub enabled: bool,
    /// Effective level for the manta crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogConfig {
    /// Read the configuration from `MANTA_DEBUG`, `MANTA_LOG_LEVEL`, and
    /// `MANTA_LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::from_parts(
            env::var("MANTA_DEBUG").ok().as_deref(),
            env::var("MANTA_LOG_LEVEL").ok().as_deref(),
            env::var("MANTA_LOG_FORMAT").ok().as_deref(),
        )
    }

    fn from_parts(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Self {
        let debug = debug
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let fallback = if debug { "debug" } else { "warn" };
        let level_value = match level.map(str::to_lowercase).as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => fallback,
        };

        let format = match format.map(str::to_lowercase).as_deref() {
            Some("pretty") => LogFormat::Pretty,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Json,
        };

        Self {
            enabled: debug || level.is_some(),
            level: level_value,
            format,
        }
    }
}

static INIT: Once = Once::new();

/// Install the subscriber described by the environment.
///
/// Call once at startup; repeated calls and unconfigured environments are
/// no-ops.
pub fn init() {
    INIT.call_once(|| {
        let config = LogConfig::from_env();
        if !config.enabled {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        install(&config);

        // Without the tracing-subscriber feature the settings are read but
        // output stays with whatever subscriber the host installed.
        #[cfg(not(feature = "tracing-subscriber"))]
        let _ = config;
    });
}

#[cfg(feature = "tracing-subscriber")]
fn install(config: &LogConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_new(format!("manta_odm={0},manta_wire={0}", config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }

    tracing::info!(level = config.level, format = ?config.format, "logging initialized");
}
