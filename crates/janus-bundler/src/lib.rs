//! # janus-bundler
//!
//! Build orchestration and chunk-manifest coordination for the janus
//! dual-target bundler.
//!
//! One source tree produces two artifact sets, a browser bundle and a
//! server bundle. The pieces here keep them coordinated:
//!
//! - [`manifest`] - split-point registry and the persisted chunk manifest
//!   the server render path uses to reference the browser chunks a page
//!   needs for hydration
//! - [`compiler`] - the seam to the underlying module-graph
//!   resolver/transformer
//! - [`descriptor`] - one fully resolved compilation unit per target
//! - [`orchestrator`] - drives the target builds as independent concurrent
//!   tasks and publishes each target's manifest slice on success
//! - [`writer`] - path-validated, atomic file publication
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//! use janus_bundler::{BuildRequest, Orchestrator};
//! use janus_config::{BuildContext, Environment, ExternalizationPolicy, TargetId};
//!
//! # async fn run(compiler: Arc<dyn janus_bundler::Compiler>) -> janus_bundler::Result<()> {
//! let orchestrator = Orchestrator::new(compiler, PathBuf::from("dist"));
//! let policy = ExternalizationPolicy::from_package_manifest(Path::new("package.json"))?;
//!
//! let report = orchestrator
//!     .build(
//!         vec![
//!             BuildRequest::new(
//!                 BuildContext::new(TargetId::Browser, Environment::Production),
//!                 "./src/index.js",
//!             ),
//!             BuildRequest::new(
//!                 BuildContext::new(TargetId::Server, Environment::Production),
//!                 "./src/server.js",
//!             ),
//!         ],
//!         &policy,
//!     )
//!     .await?;
//! assert!(report.all_succeeded());
//! # Ok(()) }
//! ```

pub mod compiler;
pub mod descriptor;
pub mod manifest;
pub mod orchestrator;
pub mod writer;

pub use compiler::{Compiler, CompileOutput, EmittedChunk};
pub use descriptor::{BuildDescriptor, BuildRequest};
pub use manifest::{
    ManifestReader, ManifestStore, SplitPoint, SplitPointId, MANIFEST_FILE_NAME,
};
pub use orchestrator::{BuildReport, Orchestrator, TargetBuildResult};

use std::path::PathBuf;

use janus_config::TargetId;

/// Error types for janus-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration. Fatal before any compilation starts.
    #[error("configuration error: {0}")]
    Config(#[from] janus_config::ConfigError),

    /// The same target was requested twice in one invocation.
    #[error("duplicate target in one build invocation: {0}")]
    DuplicateTarget(TargetId),

    /// The underlying compiler failed for one target. Fatal for that
    /// target's build only.
    #[error("compilation failed for target '{target}': {message}")]
    Compile { target: TargetId, message: String },

    /// A build task panicked or was cancelled.
    #[error("build task failed for target '{target}': {message}")]
    Task { target: TargetId, message: String },

    /// Manifest queried for a target that has not published its build.
    /// An ordering error in the caller, not a recoverable condition.
    #[error("manifest not ready: target '{target}' has not published a completed build")]
    ManifestNotReady { target: TargetId },

    /// The split point is unknown to the queried target's manifest slice.
    #[error("split point '{id}' has no emitted files for target '{target}'")]
    SplitPointNotFound { id: SplitPointId, target: TargetId },

    /// No persisted manifest at the expected location.
    #[error("chunk manifest not found at {0}")]
    ManifestMissing(PathBuf),

    /// Externalized modules absent from the runtime environment. Fatal at
    /// server process start, not at build time.
    #[error("externalized modules missing from the runtime environment: {}", modules.join(", "))]
    ExternalizationResolution { modules: Vec<String> },

    /// Invalid output path (e.g. directory traversal attempt).
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for janus-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(_) => "CONFIGURATION_ERROR",
            Error::DuplicateTarget(_) => "DUPLICATE_TARGET",
            Error::Compile { .. } => "COMPILE_ERROR",
            Error::Task { .. } => "TASK_ERROR",
            Error::ManifestNotReady { .. } => "MANIFEST_NOT_READY",
            Error::SplitPointNotFound { .. } => "SPLIT_POINT_NOT_FOUND",
            Error::ManifestMissing(_) => "MANIFEST_MISSING",
            Error::ExternalizationResolution { .. } => "EXTERNALIZATION_RESOLUTION",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::ManifestNotReady { target } => Some(Box::new(format!(
                "Run the {target} build to completion before resolving chunks for it. \
                 Rendering with code-split data requires the browser build's manifest."
            ))),
            Error::SplitPointNotFound { id, .. } => Some(Box::new(format!(
                "Split point '{id}' was never recorded by that target's build. \
                 Check that the lazy import still exists and the build is current."
            ))),
            Error::ManifestMissing(path) => Some(Box::new(format!(
                "Expected a chunk manifest at '{}'. Run 'janus build' first.",
                path.display()
            ))),
            Error::ExternalizationResolution { .. } => Some(Box::new(
                "Install the missing packages in the server runtime environment; \
                 externalized modules are resolved with a runtime require, not bundled.",
            )),
            Error::InvalidOutputPath(_) => Some(Box::new(
                "Output paths must stay inside the output root and contain no '..' components.",
            )),
            Error::DuplicateTarget(_) => Some(Box::new(
                "Each target may appear at most once per invocation; use 'both' to build the pair.",
            )),
            _ => None,
        }
    }
}
