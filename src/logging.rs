use tracing_subscriber::EnvFilter;

/**
 * Route `log` records to stderr.
 * RUST_LOG wins over the default; `verbose` lowers the default to debug.
 */
pub fn init(verbose: bool) {
    let default = if verbose {
        "clusterctl=debug"
    } else {
        "clusterctl=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // try_init also installs the log -> tracing bridge
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
    }
}
