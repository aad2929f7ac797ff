use crate::errors::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Maps the number of `-v` flags to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flag. Calling this more than once
/// leaves the first subscriber in place.
pub fn init_logging(verbosity: u8) -> AppResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))
        .map_err(|e| AppError::InvalidInput(format!("Invalid log filter: {e}")))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(2), "trace");
        assert_eq!(default_directive(7), "trace");
    }

    #[test]
    fn init_twice_is_harmless() {
        assert!(init_logging(0).is_ok());
        assert!(init_logging(2).is_ok());
    }
}
