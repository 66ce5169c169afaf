/// Logging initialization.
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with `RUST_LOG` filtering.
///
/// Logs go to stderr so they never interleave with a frame written to stdout.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,objview_core=debug,objview_terminal=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
