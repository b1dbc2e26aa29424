//! Asset rule assembly.
//!
//! For each `(target, environment)` pair, [`assemble`] produces the ordered
//! list of per-file-type transform pipelines. The mapping is a declarative
//! table over closed enums rather than imperative plugin-list construction,
//! so every combination can be inspected and tested without executing build
//! logic.
//!
//! Rule selection is a pure function of `(asset kind, target, environment)`;
//! build order never influences it. The rule set is total over the three
//! asset categories: a file whose type matches no rule fails the owning
//! target's build, naming the file.

use std::path::Path;

use tracing::debug;

use crate::context::{BuildContext, Environment, TargetId};
use crate::error::ConfigError;
use crate::profile::PUBLIC_PATH_PREFIX;

/// Asset categories reachable from source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Image,
    Stylesheet,
}

impl AssetKind {
    /// Categorize a file by extension. `None` means no rule can match.
    pub fn from_path(path: &Path) -> Option<AssetKind> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "js" | "jsx" | "mjs" | "ts" | "tsx" => Some(Self::Script),
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" => Some(Self::Image),
            "css" | "scss" | "sass" => Some(Self::Stylesheet),
            _ => None,
        }
    }
}

/// Transpile target for the script pipeline, mirroring the audience: a
/// browser support matrix for browser builds, the running Node version for
/// server builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranspileTarget {
    BrowserMatrix,
    CurrentNode,
}

/// How compiled stylesheets reach the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleDelivery {
    /// Injected inline by the module runtime; hot-reloadable.
    Inline,
    /// Emitted as standalone files referenced from markup.
    Extract,
}

/// One named step of a transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    /// Source transform; applies to scripts regardless of target and
    /// environment.
    TranspileScript { target: TranspileTarget },
    /// Compile SCSS/Sass down to plain CSS.
    PreprocessStyles,
    /// Inject styles at module evaluation time (hot-reloadable delivery).
    InlineStyles,
    /// Emit styles to standalone files (cacheable delivery).
    ExtractStyles,
    /// Copy the image into the browser output and emit a reference.
    EmitImageFile,
    /// Rewrite the emitted reference onto the browser public path. Applies
    /// even when compiling the server target: server-rendered markup must
    /// reference the same URLs the browser build serves.
    RewriteImageUrl,
}

/// A transform pipeline bound to one asset category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRule {
    pub kind: AssetKind,
    pub match_pattern: &'static str,
    pub stages: Vec<PipelineStage>,
}

/// Stylesheet delivery decision, spelled out over all four combinations.
///
/// Inline delivery gives sub-second style updates without a reload, but is
/// incompatible with file-based production caching and meaningless on the
/// server, so it is restricted to the single combination where both
/// conditions hold.
pub fn style_delivery(context: BuildContext) -> StyleDelivery {
    match (context.target, context.environment) {
        (TargetId::Browser, Environment::Development) => StyleDelivery::Inline,
        (TargetId::Browser, Environment::Production) => StyleDelivery::Extract,
        (TargetId::Server, Environment::Development) => StyleDelivery::Extract,
        (TargetId::Server, Environment::Production) => StyleDelivery::Extract,
    }
}

/// Assemble the ordered rule set for one target build.
///
/// The result always covers script, image and stylesheet exactly once each,
/// in that order.
pub fn assemble(context: BuildContext) -> Vec<AssetRule> {
    let transpile = match context.target {
        TargetId::Browser => TranspileTarget::BrowserMatrix,
        TargetId::Server => TranspileTarget::CurrentNode,
    };

    let style_stages = match style_delivery(context) {
        StyleDelivery::Inline => vec![PipelineStage::PreprocessStyles, PipelineStage::InlineStyles],
        StyleDelivery::Extract => {
            vec![PipelineStage::PreprocessStyles, PipelineStage::ExtractStyles]
        }
    };

    let rules = vec![
        AssetRule {
            kind: AssetKind::Script,
            match_pattern: "*.{js,jsx,mjs,ts,tsx}",
            stages: vec![PipelineStage::TranspileScript { target: transpile }],
        },
        AssetRule {
            kind: AssetKind::Image,
            match_pattern: "*.{png,jpg,jpeg,gif,webp,svg}",
            stages: vec![PipelineStage::EmitImageFile, PipelineStage::RewriteImageUrl],
        },
        AssetRule {
            kind: AssetKind::Stylesheet,
            match_pattern: "*.{css,scss,sass}",
            stages: style_stages,
        },
    ];

    debug!(context = %context, rules = rules.len(), "assembled asset rules");
    rules
}

/// Select the rule for a source file, or fail the build naming the file.
pub fn rule_for<'a>(rules: &'a [AssetRule], path: &Path) -> Result<&'a AssetRule, ConfigError> {
    let kind = AssetKind::from_path(path)
        .ok_or_else(|| ConfigError::UnhandledAssetType(path.to_path_buf()))?;
    rules
        .iter()
        .find(|rule| rule.kind == kind)
        .ok_or_else(|| ConfigError::UnhandledAssetType(path.to_path_buf()))
}

/// Rewrite an image reference onto the browser public path.
///
/// Idempotent: references already under the prefix are returned unchanged,
/// so rewriting twice yields the same path. The prefix is always the
/// *browser* one, regardless of which target is compiling.
pub fn rewrite_image_reference(reference: &str) -> String {
    if reference.starts_with(PUBLIC_PATH_PREFIX) {
        return reference.to_string();
    }
    let file_name = reference.rsplit('/').next().unwrap_or(reference);
    format!("{PUBLIC_PATH_PREFIX}{file_name}")
}
