//! CLI error types and miette integration.

use miette::Diagnostic as _;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid target/environment or package manifest problems. Fatal
    /// before any compilation.
    #[error("configuration error: {0}")]
    Config(#[from] janus_config::ConfigError),

    /// Errors from the orchestration/manifest layer.
    #[error(transparent)]
    Bundler(#[from] janus_bundler::Error),

    /// One or more target builds failed; details were logged per target.
    #[error("{failed} of {total} target build(s) failed")]
    TargetsFailed { failed: usize, total: usize },

    /// Invalid command-line argument combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors from file system operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

impl miette::Diagnostic for CliError {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            CliError::Config(_) => Some(Box::new("CONFIGURATION_ERROR")),
            CliError::Bundler(inner) => inner.code(),
            CliError::TargetsFailed { .. } => Some(Box::new("BUILD_FAILED")),
            CliError::InvalidArgument(_) => Some(Box::new("INVALID_ARGUMENT")),
            CliError::Io(_) => Some(Box::new("IO_ERROR")),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            CliError::Config(_) => Some(Box::new(
                "Valid targets are 'browser' and 'server'; valid environments are \
                 'development' and 'production'.",
            )),
            CliError::Bundler(inner) => inner.help(),
            CliError::TargetsFailed { .. } => Some(Box::new(
                "Each target fails independently; see the per-target errors above.",
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn targets_failed_counts_appear_in_the_message() {
        let err = CliError::TargetsFailed {
            failed: 1,
            total: 2,
        };
        assert_eq!(err.to_string(), "1 of 2 target build(s) failed");
        assert_eq!(err.code().unwrap().to_string(), "BUILD_FAILED");
    }

    #[test]
    fn bundler_errors_keep_their_diagnostic_code() {
        let err = CliError::from(janus_bundler::Error::ManifestNotReady {
            target: janus_config::TargetId::Browser,
        });
        assert_eq!(err.code().unwrap().to_string(), "MANIFEST_NOT_READY");
    }

    #[test]
    fn config_errors_convert_from_the_config_crate() {
        let config_err = janus_config::ConfigError::UnknownTarget("edge".to_string());
        let err = CliError::from(config_err);
        assert!(matches!(err, CliError::Config(_)));
    }
}
