// Logging module — powered by tracing-subscriber
//
// Uses tracing-subscriber for structured events. A compatibility bridge
// (`tracing_log::LogTracer`) captures the `log::*` macro calls used
// throughout the pipeline crates and routes them through the subscriber.

use std::collections::HashMap;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Build the `EnvFilter` from the base level, hardcoded noisy-crate
/// overrides, and optional per-target overrides from config.
fn build_env_filter(
    level: &str,
    target_levels: Option<&HashMap<String, String>>,
) -> anyhow::Result<EnvFilter> {
    // Base directive — set the default level
    let mut directives = vec![level.to_string()];

    // Suppress noisy third-party crates
    let noisy: &[(&str, &str)] = &[
        ("sqlx", "warn"),
        ("sqlparser", "warn"),
        ("hyper", "warn"),
        ("tracing", "warn"),
    ];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    // Per-target overrides from config.toml
    if let Some(map) = target_levels {
        for (target, lvl) in map.iter() {
            directives.push(format!("{}={}", target, lvl));
        }
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Initialize logging based on configuration.
///
/// Sets up `tracing-subscriber` with a console layer (compact text or
/// JSON lines) and the `tracing_log::LogTracer` bridge so that all
/// `log::*` calls are captured.
pub fn init_logging(
    level: &str,
    log_to_console: bool,
    target_levels: Option<&HashMap<String, String>>,
    format: &str,
) -> anyhow::Result<()> {
    let log_format = LogFormat::from_str(format);

    // Bridge `log` crate → tracing (for all existing log::info!() etc. calls)
    tracing_log::LogTracer::init().ok(); // ok() in case already initialized

    let console_layer = if log_to_console {
        let layer = if log_format == LogFormat::Json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_filter(build_env_filter(level, target_levels)?)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(true)
                .with_filter(build_env_filter(level, target_levels)?)
                .boxed()
        };
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry().with(console_layer).try_init().ok();

    tracing::trace!("Logging initialized: level={}, console={}", level, log_to_console);

    Ok(())
}
