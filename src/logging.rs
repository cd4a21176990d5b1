//! Tracing initialization for hosts embedding the engine.

/// Initialize tracing with an `RUST_LOG`-style filter, defaulting to `info`.
///
/// Library consumers with their own subscriber should skip this; calling it
/// twice panics, as `tracing_subscriber` allows one global default.
pub fn init_tracing(filter: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter.unwrap_or("info"))),
        )
        .init();
}
