//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout for command
//! output. `RUST_LOG` takes precedence; otherwise `--verbose` enables debug
//! output for this crate and the default shows warnings only.

use std::io;
use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Filter directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "header_amalgam=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        // Another subscriber may already be installed when embedded
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(verbose),
            )
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_crate_debug() {
        assert_eq!(default_directive(true), "header_amalgam=debug");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
