use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "reelfetch=info,tower_http=info";

/// Initialize structured logging to stderr.
///
/// `directive` overrides the default filter; an unparsable directive falls
/// back to the default rather than silencing the service.
pub fn init_logging(directive: Option<&str>) {
    let filter = directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
