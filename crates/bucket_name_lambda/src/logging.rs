use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::{HandlerConfig, DEFAULT_LOG_LEVEL};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs a JSON subscriber writing to stderr. Later calls are no-ops.
pub fn init_logging(config: &HandlerConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_new(&config.log_level)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

        let result = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .try_init();

        if result.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}
