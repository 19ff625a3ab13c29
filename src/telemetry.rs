//! Diagnostic logging setup for the command-line tool.

use crate::error::{CodemodError, Result};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor a verbosity flag is given.
const DEFAULT_FILTER: &str = "log_codemod=warn";

/// Maps a `-v` count to a filter directive for this crate.
pub fn filter_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "log_codemod=info",
        _ => "log_codemod=debug",
    }
}

/// Installs a stderr subscriber.
///
/// `RUST_LOG` wins over the verbosity flag when set. Progress output on
/// stdout is unaffected.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(filter_for(verbosity)),
    }
    .map_err(|e| CodemodError::Telemetry(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .map_err(|e| CodemodError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(filter_for(0), "log_codemod=warn");
        assert_eq!(filter_for(1), "log_codemod=info");
        assert_eq!(filter_for(5), "log_codemod=debug");
    }

    #[test]
    fn test_filters_parse() {
        for level in 0..3 {
            assert!(EnvFilter::try_new(filter_for(level)).is_ok());
        }
    }
}
