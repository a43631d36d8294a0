//! Diagnostic logging
//!
//! Frames and payload bytes go to stdout, so all log output is routed to
//! stderr.

/// Initialize tracing output
///
/// Call early in main() before any logging occurs.
/// `verbose` switches from warnings only to debug-level output.
/// `RUST_LOG`, when set, takes precedence.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}
