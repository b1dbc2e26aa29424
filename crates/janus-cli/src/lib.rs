//! Library surface of the janus CLI, split out so command logic and the
//! esbuild adapter are unit-testable.

pub mod cli;
pub mod commands;
pub mod error;
pub mod esbuild;
pub mod logger;

pub use error::{CliError, Result};
