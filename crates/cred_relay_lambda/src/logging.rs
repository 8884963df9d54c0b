use tracing_subscriber::EnvFilter;

/// Installs a JSON-lines subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_current_span(false)
        .with_target(false)
        .try_init()
        .ok();
}
