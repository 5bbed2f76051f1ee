use tracing_subscriber::EnvFilter;

/// JSON logs on stderr, filtered by `RUST_LOG` (default `info`). Call once per
/// process before any handler runs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .flatten_event(true)
        .init();
}
