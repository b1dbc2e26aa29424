//! `janus check` - validate configuration and runtime resolvability
//! without compiling anything.
//!
//! Walks every target/environment combination through the pure decision
//! layer, then verifies that every module the server build would
//! externalize actually resolves from `node_modules`. A module missing
//! there would otherwise only surface as a `require` failure at server
//! start.

use tracing::{debug, info};

use janus_config::{profile, rules, BuildContext, ExternalizationPolicy, TargetId};

use crate::cli::CheckArgs;
use crate::error::Result;

pub async fn execute(args: CheckArgs) -> Result<()> {
    for context in BuildContext::all_combinations() {
        let profile = profile::resolve(context);
        let asset_rules = rules::assemble(context);
        let delivery = rules::style_delivery(context);
        debug!(
            context = %context,
            output_dir = %profile.output_dir.display(),
            format = profile.module_format.as_str(),
            rules = asset_rules.len(),
            styles = ?delivery,
            "profile resolved"
        );
    }
    info!("all target/environment combinations resolve");

    let policy = ExternalizationPolicy::from_package_manifest(&args.package_manifest)?;
    let entries = policy.decide(TargetId::Server);
    let missing = ExternalizationPolicy::missing_modules(&entries, &args.node_modules);
    if !missing.is_empty() {
        return Err(janus_bundler::Error::ExternalizationResolution { modules: missing }.into());
    }

    info!(
        externalized = entries.len(),
        node_modules = %args.node_modules.display(),
        "every externalized module resolves"
    );
    Ok(())
}
