use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// When set, logs are also appended to this file at debug level.
pub const LOG_FILE_ENV: &str = "CWSYNC_LOG_FILE";

pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Install the global subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_tracing_with_default(default_directive: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let Some(log_path) = std::env::var_os(LOG_FILE_ENV) else {
        registry.init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

            registry.with(file_layer).init();
        }
        Err(err) => {
            registry.init();
            tracing::warn!(path = ?log_path, error = %err, "could not open log file");
        }
    }
}
