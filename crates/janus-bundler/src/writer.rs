//! Atomic, path-validated file publication.
//!
//! Manifest writes must never be observable half-done: a server process may
//! read the manifest at any moment, including mid-build. Content is written
//! to a temporary sibling and atomically renamed into place; on most
//! filesystems `rename()` either publishes the full contents or nothing.
//!
//! Paths are normalized and containment-checked before any write so a
//! malformed chunk name cannot escape the output root.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Validate that `filename` stays inside `base_dir` once normalized.
pub fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "filename contains a null byte".to_string(),
        ));
    }

    let base_dir = normalize_dir(base_dir)?;
    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(&base_dir) {
        return Err(Error::InvalidOutputPath(format!(
            "path '{}' escapes output directory '{}'",
            filename,
            base_dir.display()
        )));
    }

    Ok(full_path)
}

/// Write `content` to `path` atomically, creating parent directories.
///
/// The temporary file gets a unique name in the destination directory:
/// concurrent writers of the same path must not share a temp name, or one
/// rename steals the other's staged content.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| {
                Error::WriteFailure(format!(
                    "failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
            parent
        }
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| {
        Error::WriteFailure(format!(
            "failed to create temporary file in '{}': {e}",
            dir.display()
        ))
    })?;
    temp.write_all(content).map_err(|e| {
        Error::WriteFailure(format!(
            "failed to write temporary file '{}': {e}",
            temp.path().display()
        ))
    })?;

    // On failure the NamedTempFile cleans itself up on drop.
    temp.persist(path).map_err(|e| {
        Error::WriteFailure(format!(
            "failed to rename '{}' to '{}': {}",
            e.file.path().display(),
            path.display(),
            e.error
        ))
    })?;

    Ok(())
}

fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::InvalidOutputPath(format!("failed to get current directory: {e}")))?;
    Ok(cwd.join(cleaned).clean())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_nested_names() {
        let base = Path::new("/tmp/out");
        assert_eq!(
            validate_output_path(base, "main.js").unwrap(),
            Path::new("/tmp/out/main.js")
        );
        assert_eq!(
            validate_output_path(base, "browser/pageA.chunk.js").unwrap(),
            Path::new("/tmp/out/browser/pageA.chunk.js")
        );
    }

    #[test]
    fn rejects_traversal() {
        let base = Path::new("/tmp/out");
        assert!(validate_output_path(base, "../etc/passwd").is_err());
        assert!(validate_output_path(base, "ok/../../../../etc/passwd").is_err());
    }

    #[test]
    fn rejects_null_bytes() {
        assert!(validate_output_path(Path::new("/tmp/out"), "a\0b.js").is_err());
    }

    #[test]
    fn atomic_write_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("manifest.json");

        write_atomic(&path, b"first").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first");

        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");

        // No temp file left behind.
        let siblings = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(siblings, 1);
    }

    #[test]
    fn concurrent_writers_never_fail_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");

        for _ in 0..100 {
            let barrier = std::sync::Barrier::new(2);
            std::thread::scope(|scope| {
                for content in [b"left".as_slice(), b"right".as_slice()] {
                    let path = &path;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        write_atomic(path, content).unwrap();
                    });
                }
            });

            // Whichever rename landed last, the file is whole.
            let written = fs::read(&path).unwrap();
            assert!(written.as_slice() == b"left" || written.as_slice() == b"right");
        }
    }
}
