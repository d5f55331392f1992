use tracing_subscriber::{fmt::time::UtcTime, prelude::*};

use crate::config::{LogFormat, LoggingConfig};

/// Initializes logging for one of the three binaries: console output,
/// configurable via `RuntimeConfig::logging`. Mirrors the teacher's
/// `init_with_config` — level precedence is config > `RUST_LOG` > `"info"` —
/// trimmed to the console-only path since none of the three servers need a
/// rolling file appender.
pub fn init_with_config(cfg: &LoggingConfig, crate_name: &str) {
    let env_filter = if let Some(level) = &cfg.level {
        tracing_subscriber::EnvFilter::new(level.as_str())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("{crate_name}=info")))
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_timer(UtcTime::rfc_3339())
                        .with_file(true)
                        .with_line_number(true),
                )
                .try_init();
        }
        LogFormat::Text => {
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(true)
                        .with_timer(UtcTime::rfc_3339())
                        .with_file(true)
                        .with_line_number(true)
                        .with_thread_ids(true),
                )
                .try_init();
        }
    }
}
