//! `janus build` - compile the selected targets and publish the manifest.

use std::sync::Arc;

use tracing::{error, info, warn};

use janus_bundler::{BuildRequest, Orchestrator};
use janus_config::{BuildContext, Environment, ExternalizationPolicy, TargetId};

use crate::cli::BuildArgs;
use crate::error::{CliError, Result};
use crate::esbuild::EsbuildCompiler;

pub async fn execute(args: BuildArgs) -> Result<()> {
    // The only ambient input. Read once; everything below takes the
    // environment as an explicit parameter.
    let environment =
        Environment::from_process_value(std::env::var("NODE_ENV").ok().as_deref());

    let policy = if args.package_manifest.exists() {
        ExternalizationPolicy::from_package_manifest(&args.package_manifest)?
    } else {
        warn!(
            manifest = %args.package_manifest.display(),
            "package manifest not found; server build externalizes only the split runtime"
        );
        ExternalizationPolicy::default()
    };

    let compiler = match &args.esbuild {
        Some(binary) => EsbuildCompiler::with_binary(binary),
        None => EsbuildCompiler::new(),
    };
    let orchestrator = Orchestrator::new(Arc::new(compiler), &args.out_dir);

    let requests: Vec<BuildRequest> = args
        .target
        .targets()
        .into_iter()
        .map(|target| {
            let entry = match target {
                TargetId::Browser => args.browser_entry.as_str(),
                TargetId::Server => args.server_entry.as_str(),
            };
            BuildRequest::new(BuildContext::new(target, environment), entry)
        })
        .collect();

    let total = requests.len();
    info!(environment = %environment, targets = total, out_dir = %args.out_dir.display(), "starting build");

    let report = orchestrator.build(requests, &policy).await?;

    let mut failed = 0usize;
    for (context, result) in &report.results {
        match result {
            Ok(outcome) => info!(
                context = %context,
                entry_files = outcome.entry_files.len(),
                split_points = outcome.split_points.len(),
                duration_ms = outcome.duration.as_millis() as u64,
                "target built"
            ),
            Err(err) => {
                failed += 1;
                error!(context = %context, error = %err, "target build failed");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::TargetsFailed { failed, total });
    }
    Ok(())
}
