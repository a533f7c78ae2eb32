//! Tracing setup for the CLI. Diagnostics go to stderr so stdout stays a
//! clean UCI stream; `RUST_LOG` controls the filter.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize logging once for the whole process. Safe to call repeatedly;
/// later calls are no-ops.
pub fn init_logging(default_filter: &str) {
    INIT.get_or_init(|| {
        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let subscriber = fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();

        // Ignore the error if a subscriber is already installed (tests).
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
