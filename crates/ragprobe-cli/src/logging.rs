//! Tracing subscriber setup
//!
//! Logs always go to stderr so stdout stays clean for answers and `--json`.

use ragprobe_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) {
    let default_filter = format!("{},ragprobe=info,tower_http=info", config.level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
