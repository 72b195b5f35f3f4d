use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins over `fallback_filter` when set.
pub fn init(fallback_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
