//! Error types for configuration resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown build target: '{0}' (expected 'browser' or 'server')")]
    UnknownTarget(String),

    #[error("unknown environment: '{0}' (expected 'development' or 'production')")]
    UnknownEnvironment(String),

    /// No asset rule matches the file. Fatal for the owning target's build.
    #[error("no asset rule matches '{0}'")]
    UnhandledAssetType(PathBuf),

    #[error("package manifest not found: {0}")]
    PackageManifestNotFound(PathBuf),

    #[error("invalid package manifest {path}: {message}")]
    InvalidPackageManifest { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
