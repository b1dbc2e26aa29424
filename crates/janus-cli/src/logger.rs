//! Logging setup for the janus CLI.
//!
//! Structured logging via the `tracing` ecosystem. Verbosity order:
//! `--verbose` (debug for janus crates), `--quiet` (errors only), the
//! `RUST_LOG` environment variable, then the info-level default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("janus_cli=debug,janus_bundler=debug,janus_config=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("janus_cli=info,janus_bundler=info,janus_config=info")
        })
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber is global and can only be installed once per process,
    // so these only verify filter construction.

    #[test]
    fn verbose_filter_parses() {
        let _ = EnvFilter::new("janus_cli=debug,janus_bundler=debug,janus_config=debug");
    }

    #[test]
    fn quiet_filter_parses() {
        let _ = EnvFilter::new("error");
    }
}
