//! Logging setup (SPEC_FULL.md §1). Grounded on the teacher's
//! `logging.rs`, minus the OTEL exporter layers (`init-tracing-
//! opentelemetry`, `opentelemetry*`): those instrument the teacher's
//! web/API surface, which this engine doesn't have.

use tracing_subscriber::EnvFilter;

/// Builds the `RUST_LOG` filter, defaulting to `config_level` when the
/// environment variable isn't already set — same precedence the
/// teacher's `build_loglevel_filter_layer` gives `RUST_LOG`.
fn build_loglevel_filter_layer(config_level: &str) -> EnvFilter {
    if std::env::var("RUST_LOG").is_err() {
        // SAFETY: called once during single-threaded startup, before any
        // other thread is spawned and before anything else reads the
        // environment.
        unsafe {
            std::env::set_var("RUST_LOG", config_level);
        }
    }
    EnvFilter::from_default_env()
}

/// Installs the global `tracing` subscriber: an `EnvFilter` over a plain
/// fmt layer writing to stderr, matching §7's "log lines on standard
/// error for zone mutations and bind failures".
pub fn init(config_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_loglevel_filter_layer(config_level))
        .with_writer(std::io::stderr)
        .init();
}
