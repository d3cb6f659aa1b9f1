// Subscriber installation for hosts embedding the index

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a global fmt subscriber. `RUST_LOG` overrides the configured level.
///
/// Returns `false` when another subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };

    match result {
        Ok(()) => {
            tracing::debug!("Logging initialised at {} ({})", config.level, config.format);
            true
        }
        Err(_) => false,
    }
}
