//! The seam to the underlying module-graph resolver/transformer.
//!
//! janus does not resolve module graphs itself; an external compiler does
//! the actual bundling and reports back which files it emitted and which
//! lazy boundaries it discovered. The shipped adapter in the CLI shells out
//! to esbuild; tests substitute an in-memory implementation.

use async_trait::async_trait;

use crate::descriptor::BuildDescriptor;
use crate::Result;

/// Files emitted for one lazily-loaded boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedChunk {
    /// Source module path as written at the lazy import site.
    pub source_module_path: String,
    /// Emitted output paths, relative to the target's output directory,
    /// in load order.
    pub files: Vec<String>,
}

/// Result of compiling one target.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Entry bundle files, relative to the target's output directory.
    pub entry_files: Vec<String>,
    /// One record per split point the compiler discovered.
    pub split_chunks: Vec<EmittedChunk>,
}

/// A module-graph resolver/transformer capable of compiling one target.
///
/// Implementations must be safe to call concurrently: the orchestrator
/// compiles the browser and server targets as parallel tasks over one
/// shared compiler.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, descriptor: &BuildDescriptor) -> Result<CompileOutput>;
}
