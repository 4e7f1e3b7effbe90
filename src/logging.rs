//! Tracing and logging setup.
//!
//! Provides a [`setup_tracing`] function that configures the `tracing`
//! subscriber with console output. Call it once at application startup:
//!
//! ```rust,ignore
//! fn main() {
//!     dynatable::logging::setup_tracing();
//!     // ... rest of application
//! }
//! ```
//!
//! Output is plain text suitable for log aggregation, filtered by the
//! `RUST_LOG` environment variable (e.g. `info`, `myapp=debug`), defaulting
//! to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Initializes the tracing subscriber with console output.
///
/// # Panics
///
/// Panics if called more than once (tracing subscriber can only be set
/// once).
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_filter(filter);
    Registry::default().with(console_layer).init();

    tracing::info!("Tracing initialized successfully [reporting to console only]");
}
