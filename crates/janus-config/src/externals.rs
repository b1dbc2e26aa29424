//! Server-side dependency externalization.
//!
//! The server bundle excludes code whose only valid execution context is the
//! local Node install: third-party packages are resolved with a runtime
//! `require` instead of being compiled in. This keeps server build times
//! small and avoids bundling native or environment-specific code paths.
//!
//! The split-loading runtime is always externalized first: it must resolve
//! to the locally installed version at server start so its behavior stays
//! consistent with the manifest format the browser build wrote. A listed
//! module missing from the runtime environment is a deployment-time
//! failure, not a build-time one; [`ExternalizationPolicy::missing_modules`]
//! makes it checkable before the first render.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::context::TargetId;
use crate::error::{ConfigError, Result};

/// The package implementing the lazy-loading/split-point mechanism.
pub const SPLIT_RUNTIME_PACKAGE: &str = "@janus/loadable";

/// How an externalized module is resolved at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Resolved by the host's `require` against the local install.
    RuntimeRequire,
}

/// One module excluded from the server bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalizationEntry {
    pub module_name: String,
    pub strategy: ResolutionStrategy,
}

impl ExternalizationEntry {
    fn runtime_require(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            strategy: ResolutionStrategy::RuntimeRequire,
        }
    }
}

/// Externalization decisions for one build invocation.
///
/// Holds the installed third-party dependency set; [`decide`](Self::decide)
/// is a pure function over the target.
#[derive(Debug, Clone, Default)]
pub struct ExternalizationPolicy {
    installed: Vec<String>,
}

impl ExternalizationPolicy {
    /// Build a policy from an explicit dependency set. The set is sorted
    /// and deduplicated so the decision order is stable across invocations.
    pub fn new(installed: impl IntoIterator<Item = String>) -> Self {
        let mut installed: Vec<String> = installed
            .into_iter()
            .filter(|name| name != SPLIT_RUNTIME_PACKAGE)
            .collect();
        installed.sort();
        installed.dedup();
        Self { installed }
    }

    /// Read the installed dependency set from a `package.json`.
    ///
    /// Only `dependencies` counts: those are the packages present in the
    /// server runtime environment. Dev-only tooling is never a runtime
    /// `require` candidate.
    pub fn from_package_manifest(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::PackageManifestNotFound(path.to_path_buf())
            } else {
                ConfigError::Io(e)
            }
        })?;
        let manifest: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidPackageManifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let installed = manifest
            .get("dependencies")
            .and_then(|deps| deps.as_object())
            .map(|deps| deps.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        Ok(Self::new(installed))
    }

    /// Decide the externalization list for one target.
    ///
    /// Browser builds bundle everything: an empty list. Server builds
    /// externalize the split runtime first, then every installed
    /// third-party dependency.
    pub fn decide(&self, target: TargetId) -> Vec<ExternalizationEntry> {
        match target {
            TargetId::Browser => Vec::new(),
            TargetId::Server => {
                let mut entries = Vec::with_capacity(self.installed.len() + 1);
                entries.push(ExternalizationEntry::runtime_require(SPLIT_RUNTIME_PACKAGE));
                entries.extend(
                    self.installed
                        .iter()
                        .map(ExternalizationEntry::runtime_require),
                );
                debug!(target = %target, entries = entries.len(), "externalization decided");
                entries
            }
        }
    }

    /// Externalized modules not present under `node_modules`.
    ///
    /// Non-empty means the server process would fail at start; surfaced by
    /// `janus check` so the failure happens before deployment.
    pub fn missing_modules(
        entries: &[ExternalizationEntry],
        node_modules: &Path,
    ) -> Vec<String> {
        entries
            .iter()
            .filter(|entry| !module_dir(node_modules, &entry.module_name).is_dir())
            .map(|entry| entry.module_name.clone())
            .collect()
    }
}

/// Directory an externalized module resolves to. Scoped names map to
/// nested directories.
pub fn module_dir(node_modules: &Path, module_name: &str) -> PathBuf {
    let mut dir = node_modules.to_path_buf();
    for part in module_name.split('/') {
        dir.push(part);
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ExternalizationPolicy {
        ExternalizationPolicy::new(
            ["react", "express", "react-dom", "react-helmet"]
                .into_iter()
                .map(String::from),
        )
    }

    #[test]
    fn browser_target_is_never_externalized() {
        assert!(policy().decide(TargetId::Browser).is_empty());
    }

    #[test]
    fn server_target_lists_split_runtime_first() {
        let entries = policy().decide(TargetId::Server);
        assert_eq!(entries[0].module_name, SPLIT_RUNTIME_PACKAGE);
        assert_eq!(entries[0].strategy, ResolutionStrategy::RuntimeRequire);
    }

    #[test]
    fn server_target_includes_every_installed_dependency() {
        let entries = policy().decide(TargetId::Server);
        let names: Vec<&str> = entries.iter().map(|e| e.module_name.as_str()).collect();
        for dep in ["react", "express", "react-dom", "react-helmet"] {
            assert!(names.contains(&dep), "missing {dep}");
        }
        // Stable order: runtime first, then sorted dependencies.
        assert_eq!(
            names,
            vec![
                SPLIT_RUNTIME_PACKAGE,
                "express",
                "react",
                "react-dom",
                "react-helmet"
            ]
        );
    }

    #[test]
    fn duplicate_split_runtime_in_dependencies_is_not_doubled() {
        let policy = ExternalizationPolicy::new(
            [SPLIT_RUNTIME_PACKAGE, "react"].into_iter().map(String::from),
        );
        let entries = policy.decide(TargetId::Server);
        let runtime_count = entries
            .iter()
            .filter(|e| e.module_name == SPLIT_RUNTIME_PACKAGE)
            .count();
        assert_eq!(runtime_count, 1);
    }

    #[test]
    fn reads_dependencies_from_package_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(
            &manifest,
            r#"{
                "name": "app",
                "dependencies": { "react": "^18.0.0", "express": "^4.18.0" },
                "devDependencies": { "esbuild": "^0.21.0" }
            }"#,
        )
        .unwrap();

        let policy = ExternalizationPolicy::from_package_manifest(&manifest).unwrap();
        let names: Vec<String> = policy
            .decide(TargetId::Server)
            .into_iter()
            .map(|e| e.module_name)
            .collect();
        assert!(names.contains(&"react".to_string()));
        assert!(names.contains(&"express".to_string()));
        // Dev-only tooling never becomes a runtime require.
        assert!(!names.contains(&"esbuild".to_string()));
    }

    #[test]
    fn missing_manifest_is_a_distinct_error() {
        let err =
            ExternalizationPolicy::from_package_manifest(Path::new("/nonexistent/package.json"))
                .unwrap_err();
        assert!(matches!(err, ConfigError::PackageManifestNotFound(_)));
    }

    #[test]
    fn missing_modules_reports_unresolvable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let node_modules = dir.path().join("node_modules");
        std::fs::create_dir_all(node_modules.join("react")).unwrap();
        std::fs::create_dir_all(node_modules.join("@janus").join("loadable")).unwrap();

        let policy =
            ExternalizationPolicy::new(["react", "express"].into_iter().map(String::from));
        let entries = policy.decide(TargetId::Server);
        let missing = ExternalizationPolicy::missing_modules(&entries, &node_modules);
        assert_eq!(missing, vec!["express".to_string()]);
    }
}
