//! Core library for the vmlink toolkit
//!
//! This crate provides session management for a management controller and
//! a virtualization server: credential resolution, token lifetime checks,
//! health probes, reconnects, and the operation log that records them.

pub mod error;
pub mod exit_code;
pub mod types;

pub mod config;
pub mod credentials;
pub mod json;
pub mod logging;
pub mod sdk;
pub mod session;
pub mod timing;
pub mod validation;

use config::LoggingConfig;
use logging::{OperationLog, OperationLogLayer};

/// Initialize logging infrastructure
///
/// Every event goes to the operation log: the console filtered by
/// `console_level`, the log file (when configured) unfiltered. Under
/// systemd the events are also sent to the journal.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log = OperationLog::new(config.console_level);
    if let Some(path) = &config.log_file {
        log = log.with_file(path)?;
    }
    let operation_layer = OperationLogLayer::new(log);

    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            use tracing_subscriber::Layer;

            let journal_layer = tracing_journald::layer()?
                .with_filter(tracing_subscriber::filter::LevelFilter::INFO);
            tracing_subscriber::registry()
                .with(operation_layer)
                .with(journal_layer)
                .try_init()?;
            return Ok(());
        }
    }

    tracing_subscriber::registry().with(operation_layer).try_init()?;

    Ok(())
}
