// Logging module for structured logging using the tracing crate

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON formatting for easy parsing by log aggregation systems
/// - Filtering from `RUST_LOG`, falling back to [`DEFAULT_FILTER`]
/// - Output to stdout
///
/// Calling it more than once is harmless; only the first call installs the
/// subscriber.
///
/// # Errors
///
/// Returns an error if some other global subscriber was installed first.
///
/// # Examples
///
/// ```
/// use inkstamp::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("Batch export starting");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_subscriber_with_filter(None)
}

/// Like [`init_subscriber`], with explicit filter directives (for example
/// `"inkstamp=debug"`) taking precedence over `RUST_LOG`.
pub fn init_subscriber_with_filter(
    directives: Option<&str>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .try_init();

    if let Err(e) = result {
        INITIALIZED.store(false, Ordering::SeqCst);
        return Err(e.into());
    }
    Ok(())
}
