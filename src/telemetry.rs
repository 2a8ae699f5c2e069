//! Tracing subscriber setup.
//!
//! `LOG_LEVEL` holds the filter directives (default keeps this crate at debug,
//! sqlx at warn). `LOG_FORMAT=json` switches to one JSON object per event.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,retest_backend=debug,tower_http=info,sqlx=warn";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().with_current_span(true).init(),
        _ => builder.init(),
    }
}
