//! Build orchestration across targets.
//!
//! The two target builds are independent compilation units: no shared
//! mutable state during compilation, concurrent execution, and a single
//! per-target manifest publication at completion. Failure of one target
//! aborts that target's result but never corrupts the other target's
//! in-flight build or its already-published manifest entries.
//!
//! Configuration-level validation happens before any compilation starts;
//! per-target compile errors fail only the owning target.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use tokio::task::JoinSet;
use tracing::{error, info};

use janus_config::{externals::ExternalizationPolicy, BuildContext};

use crate::compiler::Compiler;
use crate::descriptor::{BuildDescriptor, BuildRequest};
use crate::manifest::{ManifestStore, SplitPoint};
use crate::writer;
use crate::{Error, Result};

/// Outcome of one target's completed build.
#[derive(Debug, Clone)]
pub struct TargetBuildResult {
    pub context: BuildContext,
    /// Entry bundle files, relative to the target's output directory.
    pub entry_files: Vec<String>,
    /// Split points this build discovered and recorded.
    pub split_points: Vec<SplitPoint>,
    pub duration: Duration,
}

/// Per-target results of one invocation, in request order.
#[derive(Debug)]
pub struct BuildReport {
    pub results: Vec<(BuildContext, Result<TargetBuildResult>)>,
}

impl BuildReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&BuildContext, &Error)> {
        self.results
            .iter()
            .filter_map(|(context, result)| result.as_ref().err().map(|e| (context, e)))
    }
}

/// Drives target builds to completion and coordinates their manifest.
pub struct Orchestrator {
    compiler: Arc<dyn Compiler>,
    store: ManifestStore,
    output_root: PathBuf,
}

impl Orchestrator {
    pub fn new(compiler: Arc<dyn Compiler>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            store: ManifestStore::new(),
            output_root: output_root.into(),
        }
    }

    /// The shared manifest coordinator. The render path resolves split
    /// points through this (or through a persisted
    /// [`ManifestReader`](crate::ManifestReader) in a separate process).
    pub fn manifest(&self) -> &ManifestStore {
        &self.store
    }

    /// Build every requested target.
    ///
    /// Descriptor assembly and validation run up front; a configuration
    /// error aborts before any file I/O. Compilation then proceeds as one
    /// concurrent task per target. The returned report preserves request
    /// order and carries each target's result independently.
    pub async fn build(
        &self,
        requests: Vec<BuildRequest>,
        policy: &ExternalizationPolicy,
    ) -> Result<BuildReport> {
        let mut seen = FxHashSet::default();
        for request in &requests {
            if !seen.insert(request.context.target) {
                return Err(Error::DuplicateTarget(request.context.target));
            }
        }

        let descriptors: Vec<BuildDescriptor> = requests
            .iter()
            .map(|request| BuildDescriptor::assemble(request, &self.output_root, policy))
            .collect();

        let mut tasks = JoinSet::new();
        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let compiler = Arc::clone(&self.compiler);
            let store = self.store.clone();
            let output_root = self.output_root.clone();
            tasks.spawn(async move {
                let context = descriptor.context;
                let result = build_target(compiler, store, output_root, descriptor).await;
                (index, context, result)
            });
        }

        let mut results: Vec<Option<(BuildContext, Result<TargetBuildResult>)>> =
            requests.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, context, result)) => results[index] = Some((context, result)),
                // A panicked task is reported, not propagated: the other
                // target's build keeps running.
                Err(join_error) => {
                    error!(error = %join_error, "build task aborted");
                }
            }
        }

        let results = results
            .into_iter()
            .zip(requests)
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| {
                    (
                        request.context,
                        Err(Error::Task {
                            target: request.context.target,
                            message: "build task aborted".to_string(),
                        }),
                    )
                })
            })
            .collect();

        Ok(BuildReport { results })
    }
}

async fn build_target(
    compiler: Arc<dyn Compiler>,
    store: ManifestStore,
    output_root: PathBuf,
    descriptor: BuildDescriptor,
) -> Result<TargetBuildResult> {
    let context = descriptor.context;
    let started = Instant::now();
    info!(context = %context, entry = %descriptor.entry.display(), "target build started");

    // Wholesale replacement: stale entries from the previous run of this
    // target must not leak into the new manifest slice.
    store.begin_target(context.target);

    let output = compiler.compile(&descriptor).await?;

    // Every emitted path must stay inside the target's output directory
    // before it can reach the manifest.
    let output_dir = descriptor.output_dir();
    for file in output
        .entry_files
        .iter()
        .chain(output.split_chunks.iter().flat_map(|chunk| &chunk.files))
    {
        writer::validate_output_path(&output_dir, file)?;
    }

    let mut split_points = Vec::with_capacity(output.split_chunks.len());
    for chunk in &output.split_chunks {
        let split_point = store.register_split_point(&chunk.source_module_path);
        store.record_emission(&split_point.id, context.target, chunk.files.clone());
        split_points.push(split_point);
    }

    store.mark_published(context.target);
    store.persist_target(&output_root, context.target)?;

    let duration = started.elapsed();
    info!(
        context = %context,
        split_points = split_points.len(),
        entry_files = output.entry_files.len(),
        ?duration,
        "target build completed"
    );

    Ok(TargetBuildResult {
        context,
        entry_files: output.entry_files,
        split_points,
        duration,
    })
}
