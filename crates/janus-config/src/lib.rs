//! # janus-config
//!
//! Pure decision layer for the janus dual-target bundler.
//!
//! Everything in this crate is a lookup or a pure function over a
//! [`BuildContext`]; no ambient process state is read. The context is
//! constructed once at the edge (the CLI) and passed explicitly to every
//! resolver, so the same invocation always produces the same build
//! parameters. The only filesystem touchpoints are the two explicit
//! inputs in [`externals`]: reading the package manifest and probing
//! `node_modules` for resolvability.
//!
//! - [`context`] - the immutable `(target, environment)` pair
//! - [`profile`] - per-target output locations, public path and module format
//! - [`rules`] - per-asset-category transform pipelines
//! - [`externals`] - server-side runtime-require externalization

pub mod context;
pub mod error;
pub mod externals;
pub mod profile;
pub mod rules;

pub use context::{BuildContext, Environment, TargetId};
pub use error::{ConfigError, Result};
pub use externals::{
    ExternalizationEntry, ExternalizationPolicy, ResolutionStrategy, SPLIT_RUNTIME_PACKAGE,
};
pub use profile::{HostRuntime, ModuleFormat, OutputProfile, PUBLIC_PATH_PREFIX};
pub use rules::{AssetKind, AssetRule, PipelineStage, StyleDelivery, TranspileTarget};
