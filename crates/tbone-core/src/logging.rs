//! Logging integration for tbone-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-model spans.
//! The conversion paths of the other crates emit their events through
//! `tracing`, so nothing is printed until a subscriber is installed.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "tbone_data=trace"). In debug mode a pretty, human-readable format is used;
/// otherwise a structured JSON format is used. Installing a subscriber twice
/// is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span covering work on one model type.
///
/// # Examples
///
/// ```
/// use tbone_core::logging::model_span;
///
/// let span = model_span("Movie");
/// let _guard = span.enter();
/// tracing::info!("importing payload");
/// ```
pub fn model_span(model: &str) -> tracing::Span {
    tracing::info_span!("model", name = model)
}
