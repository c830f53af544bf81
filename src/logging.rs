//! Logging setup.
//!
//! Diagnostics go to stderr through `tracing`; stdout carries only the
//! digest itself. `RUST_LOG` takes precedence. Without it the level is
//! `info`, or `debug` for this crate when `DEBUG_FILTER` is on.

use tracing_subscriber::EnvFilter;

pub fn init(debug_filter: bool) {
    let default = if debug_filter {
        "info,zotero_digest=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
