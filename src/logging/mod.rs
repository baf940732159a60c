// Logging module for structured logging using the tracing crate

use std::error::Error;
use std::sync::{Mutex, PoisonError};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};

/// Serializes concurrent initialization attempts
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON or pretty formatting, per `config.format`
/// - An `EnvFilter` built from `RUST_LOG`, falling back to `config.level`
/// - Output to stdout
///
/// Calling this when a global subscriber is already installed is a no-op.
///
/// # Errors
///
/// Returns an error if the configured level is not a valid filter directive
/// or the subscriber cannot be installed.
///
/// # Examples
///
/// ```
/// use image_service::config::LoggingConfig;
/// use image_service::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = build_filter(&config.level)?;
    let registry = Registry::default().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init()?,
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level when set
fn build_filter(level: &str) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}
