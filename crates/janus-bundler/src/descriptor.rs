//! Build descriptors: one fully resolved compilation unit per target.
//!
//! A descriptor carries everything the compiler seam needs for one target:
//! the immutable context, the resolved output profile, the assembled asset
//! rules and the externalization decision. Assembly is pure; the compiler
//! performs the I/O.

use std::path::{Path, PathBuf};

use janus_config::{
    externals::ExternalizationPolicy, profile, rules, AssetRule, BuildContext,
    ExternalizationEntry, OutputProfile,
};

/// What the caller asks for: a context plus that target's entry point.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub context: BuildContext,
    pub entry: PathBuf,
}

impl BuildRequest {
    pub fn new(context: BuildContext, entry: impl Into<PathBuf>) -> Self {
        Self {
            context,
            entry: entry.into(),
        }
    }
}

/// Fully resolved parameters for one target compilation.
#[derive(Debug, Clone)]
pub struct BuildDescriptor {
    pub context: BuildContext,
    pub profile: OutputProfile,
    pub rules: Vec<AssetRule>,
    pub externals: Vec<ExternalizationEntry>,
    pub entry: PathBuf,
    pub output_root: PathBuf,
}

impl BuildDescriptor {
    /// Resolve a request against the configuration layer.
    pub fn assemble(
        request: &BuildRequest,
        output_root: &Path,
        policy: &ExternalizationPolicy,
    ) -> Self {
        Self {
            context: request.context,
            profile: profile::resolve(request.context),
            rules: rules::assemble(request.context),
            externals: policy.decide(request.context.target),
            entry: request.entry.clone(),
            output_root: output_root.to_path_buf(),
        }
    }

    /// Absolute-or-relative directory this target writes into:
    /// `<outputRoot>/browser/` or `<outputRoot>/server/`.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.profile.output_dir)
    }
}
