//! janus CLI - dual-target builds for isomorphic applications.
//!
//! Entry point: argument parsing, logging initialization and command
//! dispatch. The process environment (`NODE_ENV`) is read exactly once, at
//! this edge; everything below works from an explicit build context.

use clap::Parser;
use janus_cli::{cli, commands, logger};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args).await,
    };

    result.map_err(miette::Report::new)
}
