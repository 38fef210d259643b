use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber from a textual level
/// (`"INFO"`, `"debug"`, ...). `RUST_LOG` still overrides this if set, so
/// operators can narrow or widen logging without a restart-time flag
/// change.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
