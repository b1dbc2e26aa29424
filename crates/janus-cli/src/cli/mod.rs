//! Command-line interface definition.
//!
//! Clap v4 derive structure for the `janus` binary:
//!
//! - `janus build` - compile the browser bundle, the server bundle, or both
//! - `janus check` - validate configuration and runtime resolvability

pub mod enums;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use enums::TargetSelector;

/// janus - dual-target bundler for isomorphic applications
#[derive(Parser, Debug)]
#[command(
    name = "janus",
    version,
    about = "Dual-target bundler for isomorphic applications",
    long_about = "janus compiles one source tree into a browser bundle and a server bundle\n\
                  and keeps them coordinated through a chunk manifest, so server renders\n\
                  can reference the exact client chunks a page needs for hydration."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one or both targets and publish the chunk manifest
    Build(BuildArgs),

    /// Validate configuration and server runtime resolvability
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Which target(s) to compile
    ///
    /// The environment is read from NODE_ENV: 'production' selects
    /// production semantics, anything else is development.
    #[arg(long, value_enum, default_value_t = TargetSelector::Both)]
    pub target: TargetSelector,

    /// Build output root; browser artifacts land under <out-dir>/browser,
    /// server artifacts under <out-dir>/server
    #[arg(long, default_value = "dist")]
    pub out_dir: PathBuf,

    /// Browser entry point
    #[arg(long, default_value = "./src/index.js")]
    pub browser_entry: String,

    /// Server entry point
    #[arg(long, default_value = "./src/server.js")]
    pub server_entry: String,

    /// Package manifest supplying the installed dependency set for server
    /// externalization
    #[arg(long, default_value = "package.json")]
    pub package_manifest: PathBuf,

    /// Path to the esbuild binary (defaults to PATH lookup)
    #[arg(long)]
    pub esbuild: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Package manifest supplying the installed dependency set
    #[arg(long, default_value = "package.json")]
    pub package_manifest: PathBuf,

    /// Directory externalized modules must resolve from at server start
    #[arg(long, default_value = "node_modules")]
    pub node_modules: PathBuf,
}
