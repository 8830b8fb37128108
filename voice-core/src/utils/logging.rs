use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with tracing
///
/// This function sets up the tracing subscriber with the following configuration:
/// - Reads filter from RUST_LOG environment variable if available
/// - Falls back to "voicenav=debug,voicenav_lib=debug,warn" if RUST_LOG is not set
/// - Uses a formatted output layer
///
/// Calling it again after a subscriber is installed is a no-op.
///
/// # Example
///
/// ```no_run
/// use voicenav_lib::utils::logging::init_logging;
///
/// init_logging();
/// ```
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("voicenav=debug,voicenav_lib=debug,warn"));

    if tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok()
    {
        tracing::info!("VoiceNav logging initialized");
    }
}
