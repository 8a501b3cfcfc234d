//! Tracing setup for tests.

/// Initializes a tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()),
        )
        .try_init()
        .ok();
}
