//! esbuild adapter for the compiler seam.
//!
//! Translates a [`BuildDescriptor`] into an esbuild invocation and reads
//! the metafile back into a [`CompileOutput`]. Dynamic-import chunks appear
//! in the metafile as outputs carrying their own entry point; those become
//! the split-point emissions the manifest records.
//!
//! Inline style delivery (browser development) relies on the dev server
//! injecting the emitted CSS; this adapter only controls what esbuild
//! emits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use janus_bundler::{BuildDescriptor, CompileOutput, Compiler, EmittedChunk, Error, Result};
use janus_config::{rules, AssetKind, Environment, ModuleFormat};

/// Compiler implementation shelling out to an installed esbuild.
#[derive(Debug, Clone)]
pub struct EsbuildCompiler {
    binary: PathBuf,
}

impl EsbuildCompiler {
    /// Resolve `esbuild` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("esbuild"),
        }
    }

    /// Use an explicit esbuild binary.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for EsbuildCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Compiler for EsbuildCompiler {
    async fn compile(&self, descriptor: &BuildDescriptor) -> Result<CompileOutput> {
        let target = descriptor.context.target;
        let output_dir = descriptor.output_dir();
        tokio::fs::create_dir_all(&output_dir).await?;

        let metafile = output_dir.join("esbuild-meta.json");
        let args = args_for(descriptor, &metafile);
        debug!(target = %target, binary = %self.binary.display(), "running esbuild");

        let output = tokio::process::Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::Compile {
                target,
                message: format!("failed to launch esbuild '{}': {e}", self.binary.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if let Some(err) = classify_failure(descriptor, &stderr) {
                return Err(err);
            }
            return Err(Error::Compile {
                target,
                message: stderr.trim().to_string(),
            });
        }

        let raw = tokio::fs::read_to_string(&metafile).await?;
        parse_metafile(&raw, descriptor)
    }
}

/// Map a descriptor onto esbuild arguments. Pure, for testability.
fn args_for(descriptor: &BuildDescriptor, metafile: &Path) -> Vec<String> {
    let profile = &descriptor.profile;
    let mut args = vec![
        descriptor.entry.display().to_string(),
        "--bundle".to_string(),
        format!("--outdir={}", descriptor.output_dir().display()),
        format!("--format={}", profile.module_format.as_str()),
        format!("--platform={}", profile.host.as_str()),
        format!(
            "--public-path={}",
            profile.public_path_prefix.trim_end_matches('/')
        ),
        format!("--metafile={}", metafile.display()),
        "--entry-names=[name]".to_string(),
        format!(
            "--chunk-names={}",
            profile.chunk_naming_template.trim_end_matches(".js")
        ),
        format!(
            "--define:process.env.NODE_ENV=\"{}\"",
            descriptor.context.environment
        ),
    ];

    // Code splitting requires esm; the server's commonjs bundle stays whole.
    if profile.module_format == ModuleFormat::EsModule {
        args.push("--splitting".to_string());
    }

    match descriptor.context.environment {
        Environment::Production => args.push("--minify".to_string()),
        Environment::Development => args.push("--sourcemap=inline".to_string()),
    }

    // Image assets copy through the file loader; with the public path above
    // their rewritten references stay browser-rooted for both targets.
    for rule in &descriptor.rules {
        if rule.kind == AssetKind::Image {
            for ext in pattern_extensions(rule.match_pattern) {
                args.push(format!("--loader:.{ext}=file"));
            }
        }
    }

    for entry in &descriptor.externals {
        args.push(format!("--external:{}", entry.module_name));
    }

    args
}

/// Reclassify esbuild failures that are really configuration errors.
///
/// esbuild reports a file outside every configured loader as
/// `No loader is configured for ".ext" files: path/to/file`. That is the
/// unhandled-asset-type case: run the file back through rule selection so
/// the failure carries the configuration taxonomy and names the file,
/// instead of surfacing as an opaque compile error.
fn classify_failure(descriptor: &BuildDescriptor, stderr: &str) -> Option<Error> {
    for line in stderr.lines() {
        let Some((_, rest)) = line.split_once("No loader is configured for ") else {
            continue;
        };
        let Some((_, file)) = rest.split_once(" files: ") else {
            continue;
        };
        if let Err(err) = rules::rule_for(&descriptor.rules, Path::new(file.trim())) {
            return Some(Error::Config(err));
        }
    }
    None
}

/// Extensions named by a `*.{a,b,c}` match pattern.
fn pattern_extensions(pattern: &str) -> impl Iterator<Item = &str> {
    pattern
        .trim_start_matches("*.")
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
}

#[derive(Debug, Deserialize)]
struct MetaFile {
    #[serde(default)]
    outputs: BTreeMap<String, MetaOutput>,
}

#[derive(Debug, Deserialize)]
struct MetaOutput {
    #[serde(rename = "entryPoint")]
    entry_point: Option<String>,
    #[serde(rename = "cssBundle")]
    css_bundle: Option<String>,
}

/// Read a metafile back into entry files and split-point emissions.
///
/// Outputs whose entry point is the build entry are the entry bundle;
/// outputs carrying another entry point are dynamic-import chunks, keyed by
/// the module path that declared the boundary. Shared chunks (no entry
/// point) are loaded transitively and need no manifest entry of their own.
fn parse_metafile(raw: &str, descriptor: &BuildDescriptor) -> Result<CompileOutput> {
    let meta: MetaFile = serde_json::from_str(raw)?;
    let output_dir = descriptor.output_dir();
    let entry = normalize_module_path(&descriptor.entry.display().to_string());

    let mut output = CompileOutput::default();
    let mut split: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (file, info) in meta.outputs {
        if file.ends_with(".map") {
            continue;
        }
        let emitted = relative_to(&file, &output_dir);
        match info.entry_point {
            Some(ref entry_point) if normalize_module_path(entry_point) == entry => {
                output.entry_files.push(emitted);
                if let Some(css) = info.css_bundle {
                    output.entry_files.push(relative_to(&css, &output_dir));
                }
            }
            Some(entry_point) => {
                let files = split.entry(entry_point).or_default();
                files.push(emitted);
                if let Some(css) = info.css_bundle {
                    files.push(relative_to(&css, &output_dir));
                }
            }
            None => {}
        }
    }

    output.split_chunks = split
        .into_iter()
        .map(|(source_module_path, files)| EmittedChunk {
            source_module_path,
            files,
        })
        .collect();
    Ok(output)
}

fn normalize_module_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}

fn relative_to(file: &str, output_dir: &Path) -> String {
    Path::new(file)
        .strip_prefix(output_dir)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| file.to_string())
}
