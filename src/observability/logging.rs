//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Route output to stdout or an append-only log file
//! - Configure log level from config, overridable via `RUST_LOG`

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Build the env filter: `RUST_LOG` first, then the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "frontdoor={level},tower_http={level}",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &ObservabilityConfig) -> std::io::Result<()> {
    let fmt_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false);
            match config.log_format {
                LogFormat::Json => layer.json().boxed(),
                LogFormat::Text => layer.boxed(),
            }
        }
        None => {
            let layer = tracing_subscriber::fmt::layer();
            match config.log_format {
                LogFormat::Json => layer.json().boxed(),
                LogFormat::Text => layer.boxed(),
            }
        }
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .init();

    Ok(())
}
