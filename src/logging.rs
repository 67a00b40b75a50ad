//! Process-wide diagnostic sink.
//!
//! Diagnostics always go to stderr so they never interleave with the NDJSON
//! stream on stdout.

use tracing_subscriber::EnvFilter;

/// Maps the repeatable `-v` flag onto a stderr subscriber.
///
/// 0 = warnings only, 1 = info, 2 = debug, 3+ = trace (which also surfaces
/// the HTTP stack's wire-level logging). Called once at startup.
pub fn init(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
