//! Logging integration.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`AdminSettings`] and for creating per-request spans.

use crate::settings::AdminSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise structured JSON.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn setup_logging(settings: &AdminSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
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

/// Creates a tracing span for an admin HTTP request.
///
/// # Examples
///
/// ```
/// use modeladmin_core::logging::request_span;
///
/// let span = request_span("GET", "/admin/user/list");
/// let _guard = span.enter();
/// tracing::info!("handling request");
/// ```
pub fn request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!("admin_request", method = method, path = path)
}
