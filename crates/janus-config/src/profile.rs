//! Output profile resolution.
//!
//! [`resolve`] maps a [`BuildContext`] to the fixed set of build parameters
//! for that target: where output lands, how emitted files are addressed,
//! which module format is produced and which host APIs the output may
//! assume. This is a lookup over closed enums, pure and total; invalid
//! target or environment *strings* are rejected earlier, at context parse
//! time.

use std::path::PathBuf;

use crate::context::{BuildContext, Environment, TargetId};

/// Public path prefix shared by both targets.
///
/// The browser build emits files addressed under this prefix, and the server
/// build resolves manifest paths against the same prefix at render time. The
/// two profiles write to disjoint directories but must agree on this value,
/// or hydration references break.
pub const PUBLIC_PATH_PREFIX: &str = "/static/";

/// Module format of a compiled bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// ECMAScript modules. Required for browser code splitting.
    EsModule,
    /// CommonJS. The server bundle runs under Node's require semantics so
    /// externalized dependencies resolve from the local install.
    CommonJs,
}

impl ModuleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EsModule => "esm",
            Self::CommonJs => "cjs",
        }
    }
}

/// Host APIs the compiled output may assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRuntime {
    /// window/document/fetch; no Node built-ins.
    Browser,
    /// Node built-ins available; `__dirname` and friends behave natively.
    Node,
}

impl HostRuntime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Node => "node",
        }
    }
}

/// Fixed build parameters derived from a [`BuildContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputProfile {
    /// Output directory relative to the build output root. Disjoint per
    /// target: `browser/` vs `server/`.
    pub output_dir: PathBuf,
    /// Shared public path prefix for browser-servable assets.
    pub public_path_prefix: &'static str,
    pub module_format: ModuleFormat,
    /// Naming template for emitted chunks. Content hashes only in
    /// production browser builds, where file-based caching applies.
    pub chunk_naming_template: &'static str,
    pub host: HostRuntime,
}

/// Resolve the output profile for one target build.
pub fn resolve(context: BuildContext) -> OutputProfile {
    match context.target {
        TargetId::Browser => OutputProfile {
            output_dir: PathBuf::from("browser"),
            public_path_prefix: PUBLIC_PATH_PREFIX,
            module_format: ModuleFormat::EsModule,
            chunk_naming_template: match context.environment {
                Environment::Development => "[name].js",
                Environment::Production => "[name].[hash].js",
            },
            host: HostRuntime::Browser,
        },
        TargetId::Server => OutputProfile {
            output_dir: PathBuf::from("server"),
            public_path_prefix: PUBLIC_PATH_PREFIX,
            module_format: ModuleFormat::CommonJs,
            chunk_naming_template: "[name].js",
            host: HostRuntime::Node,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_write_to_disjoint_directories() {
        for environment in [Environment::Development, Environment::Production] {
            let browser = resolve(BuildContext::new(TargetId::Browser, environment));
            let server = resolve(BuildContext::new(TargetId::Server, environment));
            assert_ne!(browser.output_dir, server.output_dir);
        }
    }

    #[test]
    fn profiles_agree_on_the_public_path_prefix() {
        for context in BuildContext::all_combinations() {
            assert_eq!(resolve(context).public_path_prefix, PUBLIC_PATH_PREFIX);
        }
    }

    #[test]
    fn browser_is_esm_server_is_cjs() {
        for environment in [Environment::Development, Environment::Production] {
            let browser = resolve(BuildContext::new(TargetId::Browser, environment));
            assert_eq!(browser.module_format, ModuleFormat::EsModule);
            assert_eq!(browser.host, HostRuntime::Browser);

            let server = resolve(BuildContext::new(TargetId::Server, environment));
            assert_eq!(server.module_format, ModuleFormat::CommonJs);
            assert_eq!(server.host, HostRuntime::Node);
        }
    }

    #[test]
    fn content_hashes_only_in_production_browser_chunks() {
        let hashed = resolve(BuildContext::new(
            TargetId::Browser,
            Environment::Production,
        ));
        assert!(hashed.chunk_naming_template.contains("[hash]"));

        for context in BuildContext::all_combinations() {
            if context.target == TargetId::Browser && context.environment == Environment::Production
            {
                continue;
            }
            assert!(!resolve(context).chunk_naming_template.contains("[hash]"));
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        for context in BuildContext::all_combinations() {
            assert_eq!(resolve(context), resolve(context));
        }
    }
}
