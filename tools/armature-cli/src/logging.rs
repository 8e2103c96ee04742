//! Tracing subscriber setup.

use armature_core::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. `--verbose` raises the
/// armature crates to `debug`.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(&config.level, verbose).into());

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Human => registry.with(fmt::layer().with_target(false)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("failed to install tracing subscriber: {}", e);
    }
}

fn default_directives(level: &str, verbose: bool) -> String {
    if verbose {
        format!("{},armature=debug,tower_http=debug", level)
    } else {
        format!("{},tower_http=info", level)
    }
}
