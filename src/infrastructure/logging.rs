//! Logging system configuration and initialization
//!
//! Console logging through `tracing-subscriber` with an `EnvFilter`, plus
//! optional non-blocking file output. `RUST_LOG` overrides the configured
//! level, e.g. `RUST_LOG=debug,reqwest=warn`.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

// Re-export LoggingConfig from the config module
pub use crate::infrastructure::config::LoggingConfig;

lazy_static! {
    // Keeps the non-blocking file writers alive for the process lifetime
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Resolve the log directory from configuration, defaulting to `./logs`
fn log_directory(config: &LoggingConfig) -> PathBuf {
    config
        .directory
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Initialize logging with custom configuration.
///
/// Noisy dependency targets are kept at `warn` unless the configured level
/// is `trace` or `RUST_LOG` says otherwise.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        if !config.level.to_lowercase().contains("trace") {
            filter = filter
                .add_directive("reqwest=warn".parse().expect("static directive"))
                .add_directive("hyper=warn".parse().expect("static directive"))
                .add_directive("h2=warn".parse().expect("static directive"))
                .add_directive("tokio=info".parse().expect("static directive"));
        }
        filter
    });

    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (true, console) => {
            let log_dir = log_directory(&config);
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("failed to create log directory {:?}: {}", log_dir, e))?;

            let file_appender = rolling::never(&log_dir, &config.file_name);
            let (file_writer, guard) = non_blocking(file_appender);
            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("log guard storage poisoned"))?
                .push(guard);

            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);

            if console {
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_target(false);
                registry.with(file_layer).with(console_layer).init();
            } else {
                registry.with(file_layer).init();
            }
            info!("Logging initialized (file: {:?})", log_dir.join(&config.file_name));
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_target(false);
            registry.with(console_layer).init();
        }
        (false, false) => {
            return Err(anyhow!("no logging output configured"));
        }
    }

    info!("Log level: {}", config.level);
    Ok(())
}
