//! Split-point registry and the chunk manifest.
//!
//! Every lazily-loaded module boundary declared in source gets a stable
//! identity derived from its normalized source path, so the two
//! independently compiled targets agree on identity without communicating
//! during compilation, and incremental rebuilds never renumber chunks.
//!
//! Each target's build records the files it emitted per split point and
//! publishes its slice of the manifest at completion. The server render
//! path then resolves a split point to the browser files a page needs for
//! hydration. Resolving against a target that has not published is an
//! ordering error and fails loudly; it is never defaulted to an empty
//! reference, which would render a page missing required scripts.
//!
//! The manifest is persisted as JSON at `<outputRoot>/chunk-manifest.json`
//! so a server process started long after the build can still resolve
//! paths. Writes go through [`writer::write_atomic`] and merge by target
//! key: a failing target never clobbers the other target's entries.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use janus_config::TargetId;

use crate::{writer, Error, Result};

/// Manifest file name, fixed relative to the build output root.
pub const MANIFEST_FILE_NAME: &str = "chunk-manifest.json";

const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Stable identity of a lazily-loaded module boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitPointId(String);

impl SplitPointId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SplitPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lazily-loaded boundary declared in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPoint {
    pub id: SplitPointId,
    pub source_module_path: String,
}

/// Derive the stable identity for a source module path.
///
/// Identity is a deterministic function of the normalized path, never of
/// discovery order: `./pages/Home` and `pages/Home` are the same boundary.
pub fn split_point_id(source_module_path: &str) -> SplitPointId {
    let normalized = normalize_source_path(source_module_path);
    let hash = blake3::hash(normalized.as_bytes());
    let hex = hash.to_hex();
    SplitPointId(format!("sp-{}", &hex.as_str()[..12]))
}

fn normalize_source_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}

/// Serialized manifest document.
///
/// `targets` lists the targets that have published a completed build, so an
/// independent reader can distinguish "published zero split points" from
/// "never published".
#[derive(Debug, Default, Serialize, Deserialize)]
struct ManifestDocument {
    version: u32,
    targets: Vec<String>,
    entries: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    source: String,
    files: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Normalized source path -> split point (registration is idempotent).
    split_points: FxHashMap<String, SplitPoint>,
    sources: FxHashMap<SplitPointId, String>,
    emissions: FxHashMap<SplitPointId, FxHashMap<TargetId, Vec<String>>>,
    published: FxHashSet<TargetId>,
}

/// Thread-safe chunk manifest coordinator.
///
/// Cloning shares the underlying store; both target builds write into the
/// same coordinator without synchronizing during compilation.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    inner: Arc<RwLock<StoreInner>>,
    /// Serializes [`persist_target`](Self::persist_target): the on-disk
    /// merge is read-modify-write, so two concurrent target completions
    /// must not interleave or the later write drops the earlier slice.
    publish_lock: Arc<Mutex<()>>,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazy boundary discovered during compilation.
    ///
    /// Idempotent: the same source path always yields the same split point,
    /// regardless of which build discovers it first.
    pub fn register_split_point(&self, source_module_path: &str) -> SplitPoint {
        let normalized = normalize_source_path(source_module_path);
        let mut inner = self.inner.write();

        if let Some(existing) = inner.split_points.get(&normalized) {
            return existing.clone();
        }

        let split_point = SplitPoint {
            id: split_point_id(&normalized),
            source_module_path: normalized.clone(),
        };
        inner
            .sources
            .insert(split_point.id.clone(), normalized.clone());
        inner.split_points.insert(normalized, split_point.clone());
        split_point
    }

    /// Record the files one target emitted for a split point. Replaces any
    /// earlier recording for the same `(split point, target)` pair.
    pub fn record_emission(&self, id: &SplitPointId, target: TargetId, files: Vec<String>) {
        let mut inner = self.inner.write();
        inner
            .emissions
            .entry(id.clone())
            .or_default()
            .insert(target, files);
    }

    /// Drop a target's in-memory slice before its rebuild, so the slice is
    /// fully replaced rather than merged with stale entries.
    pub fn begin_target(&self, target: TargetId) {
        let mut inner = self.inner.write();
        inner.published.remove(&target);
        for by_target in inner.emissions.values_mut() {
            by_target.remove(&target);
        }
        inner.emissions.retain(|_, by_target| !by_target.is_empty());
    }

    /// Mark a target's build as completed. Only after this does
    /// [`resolve`](Self::resolve) answer for that target.
    pub fn mark_published(&self, target: TargetId) {
        self.inner.write().published.insert(target);
    }

    /// Look up the output files a target emitted for a split point.
    ///
    /// Fails with [`Error::ManifestNotReady`] if the queried target has not
    /// published a completed build; the server render path queries the
    /// browser target, so the gate is on browser completion.
    pub fn resolve(&self, id: &SplitPointId, target: TargetId) -> Result<Vec<String>> {
        let inner = self.inner.read();
        if !inner.published.contains(&target) {
            return Err(Error::ManifestNotReady { target });
        }
        inner
            .emissions
            .get(id)
            .and_then(|by_target| by_target.get(&target))
            .cloned()
            .ok_or_else(|| Error::SplitPointNotFound {
                id: id.clone(),
                target,
            })
    }

    /// Atomically replace `target`'s entries in the persisted manifest.
    ///
    /// The on-disk document is merged by target key: other targets' entries
    /// are carried over untouched, this target's old entries are dropped
    /// wholesale, and the current in-memory slice is written in their
    /// place. Publication is temp-file + rename, so readers never observe a
    /// partial write, and the whole merge runs under the store's publish
    /// lock so concurrent target completions serialize instead of losing
    /// each other's slices.
    pub fn persist_target(&self, output_root: &Path, target: TargetId) -> Result<PathBuf> {
        let _publishing = self.publish_lock.lock();
        let path = output_root.join(MANIFEST_FILE_NAME);
        let mut doc = read_document_or_default(&path)?;
        doc.version = MANIFEST_FORMAT_VERSION;

        doc.targets.retain(|t| t != target.as_str());
        for entry in doc.entries.values_mut() {
            entry.files.remove(target.as_str());
        }
        doc.entries.retain(|_, entry| !entry.files.is_empty());

        {
            let inner = self.inner.read();
            if !inner.published.contains(&target) {
                return Err(Error::ManifestNotReady { target });
            }
            for (id, by_target) in &inner.emissions {
                let Some(files) = by_target.get(&target) else {
                    continue;
                };
                let entry = doc
                    .entries
                    .entry(id.to_string())
                    .or_insert_with(|| ManifestEntry {
                        source: String::new(),
                        files: BTreeMap::new(),
                    });
                if entry.source.is_empty() {
                    if let Some(source) = inner.sources.get(id) {
                        entry.source = source.clone();
                    }
                }
                entry.files.insert(target.as_str().to_string(), files.clone());
            }
        }

        doc.targets.push(target.as_str().to_string());
        doc.targets.sort();
        doc.targets.dedup();

        let json = serde_json::to_vec_pretty(&doc)?;
        writer::write_atomic(&path, &json)?;
        debug!(target = %target, path = %path.display(), "manifest slice published");
        Ok(path)
    }
}

fn read_document_or_default(path: &Path) -> Result<ManifestDocument> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ManifestDocument::default()),
        Err(e) => Err(e.into()),
    }
}

/// Read-only view of a persisted manifest, for server processes started
/// independently of the build.
#[derive(Debug)]
pub struct ManifestReader {
    published: FxHashSet<TargetId>,
    entries: FxHashMap<SplitPointId, FxHashMap<TargetId, Vec<String>>>,
}

impl ManifestReader {
    /// Load the manifest from the build output root.
    pub fn load(output_root: &Path) -> Result<Self> {
        let path = output_root.join(MANIFEST_FILE_NAME);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ManifestMissing(path.clone())
            } else {
                Error::Io(e)
            }
        })?;
        let doc: ManifestDocument = serde_json::from_str(&raw)?;

        let mut published = FxHashSet::default();
        for name in &doc.targets {
            match TargetId::from_str(name) {
                Ok(target) => {
                    published.insert(target);
                }
                Err(_) => warn!(target = %name, "ignoring unknown target in manifest"),
            }
        }

        let mut entries: FxHashMap<SplitPointId, FxHashMap<TargetId, Vec<String>>> =
            FxHashMap::default();
        for (id, entry) in doc.entries {
            let mut by_target = FxHashMap::default();
            for (name, files) in entry.files {
                match TargetId::from_str(&name) {
                    Ok(target) => {
                        by_target.insert(target, files);
                    }
                    Err(_) => warn!(target = %name, "ignoring unknown target in manifest entry"),
                }
            }
            entries.insert(SplitPointId(id), by_target);
        }

        Ok(Self { published, entries })
    }

    /// Same contract as [`ManifestStore::resolve`], over the persisted
    /// document.
    pub fn resolve(&self, id: &SplitPointId, target: TargetId) -> Result<Vec<String>> {
        if !self.published.contains(&target) {
            return Err(Error::ManifestNotReady { target });
        }
        self.entries
            .get(id)
            .and_then(|by_target| by_target.get(&target))
            .cloned()
            .ok_or_else(|| Error::SplitPointNotFound {
                id: id.clone(),
                target,
            })
    }

    /// Targets that have published a completed build.
    pub fn published_targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.published.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_stable_and_normalization_insensitive() {
        let a = split_point_id("./pages/Home");
        let b = split_point_id("pages/Home");
        let c = split_point_id(".\\pages\\Home");
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(a.as_str().starts_with("sp-"));
    }

    #[test]
    fn distinct_paths_get_distinct_identities() {
        assert_ne!(split_point_id("./pageA"), split_point_id("./pageB"));
    }

    #[test]
    fn registration_is_idempotent() {
        let store = ManifestStore::new();
        let first = store.register_split_point("./pages/News");
        let second = store.register_split_point("pages/News");
        assert_eq!(first, second);
    }

    #[test]
    fn independent_stores_agree_on_identity() {
        // The two target builds register without cross-communication.
        let browser_side = ManifestStore::new().register_split_point("./pages/Home");
        let server_side = ManifestStore::new().register_split_point("./pages/Home");
        assert_eq!(browser_side.id, server_side.id);
    }

    #[test]
    fn resolve_before_publication_fails_loudly() {
        let store = ManifestStore::new();
        let sp = store.register_split_point("./pageA");
        store.record_emission(&sp.id, TargetId::Browser, vec!["a.chunk.js".into()]);

        // Recorded but not yet published: still not ready.
        let err = store.resolve(&sp.id, TargetId::Browser).unwrap_err();
        assert!(matches!(
            err,
            Error::ManifestNotReady {
                target: TargetId::Browser
            }
        ));

        store.mark_published(TargetId::Browser);
        assert_eq!(
            store.resolve(&sp.id, TargetId::Browser).unwrap(),
            vec!["a.chunk.js".to_string()]
        );
    }

    #[test]
    fn unknown_split_point_after_publication_is_not_found() {
        let store = ManifestStore::new();
        store.mark_published(TargetId::Browser);
        let err = store
            .resolve(&split_point_id("./never-registered"), TargetId::Browser)
            .unwrap_err();
        assert!(matches!(err, Error::SplitPointNotFound { .. }));
    }

    #[test]
    fn begin_target_replaces_only_that_targets_slice() {
        let store = ManifestStore::new();
        let sp = store.register_split_point("./pageA");
        store.record_emission(&sp.id, TargetId::Browser, vec!["old.chunk.js".into()]);
        store.record_emission(&sp.id, TargetId::Server, vec!["server/pageA.js".into()]);
        store.mark_published(TargetId::Browser);
        store.mark_published(TargetId::Server);

        store.begin_target(TargetId::Browser);

        // Browser slice gone, server slice untouched.
        assert!(matches!(
            store.resolve(&sp.id, TargetId::Browser).unwrap_err(),
            Error::ManifestNotReady { .. }
        ));
        assert_eq!(
            store.resolve(&sp.id, TargetId::Server).unwrap(),
            vec!["server/pageA.js".to_string()]
        );
    }

    #[test]
    fn persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new();
        let sp = store.register_split_point("./pages/Home");
        store.record_emission(&sp.id, TargetId::Browser, vec!["Home.abc123.js".into()]);
        store.mark_published(TargetId::Browser);
        store.persist_target(dir.path(), TargetId::Browser).unwrap();

        let reader = ManifestReader::load(dir.path()).unwrap();
        assert_eq!(
            reader.resolve(&sp.id, TargetId::Browser).unwrap(),
            vec!["Home.abc123.js".to_string()]
        );
        // Server never published: not ready even from disk.
        assert!(matches!(
            reader.resolve(&sp.id, TargetId::Server).unwrap_err(),
            Error::ManifestNotReady {
                target: TargetId::Server
            }
        ));
    }

    #[test]
    fn persist_merges_by_target_key() {
        let dir = tempfile::tempdir().unwrap();

        // Browser build publishes from its own store.
        let browser_store = ManifestStore::new();
        let sp = browser_store.register_split_point("./pageA");
        browser_store.record_emission(&sp.id, TargetId::Browser, vec!["a.chunk.js".into()]);
        browser_store.mark_published(TargetId::Browser);
        browser_store
            .persist_target(dir.path(), TargetId::Browser)
            .unwrap();

        // A separate server build process publishes later.
        let server_store = ManifestStore::new();
        let sp2 = server_store.register_split_point("./pageA");
        assert_eq!(sp.id, sp2.id);
        server_store.record_emission(&sp2.id, TargetId::Server, vec!["server/pageA.js".into()]);
        server_store.mark_published(TargetId::Server);
        server_store
            .persist_target(dir.path(), TargetId::Server)
            .unwrap();

        let reader = ManifestReader::load(dir.path()).unwrap();
        assert_eq!(
            reader.resolve(&sp.id, TargetId::Browser).unwrap(),
            vec!["a.chunk.js".to_string()]
        );
        assert_eq!(
            reader.resolve(&sp.id, TargetId::Server).unwrap(),
            vec!["server/pageA.js".to_string()]
        );
    }

    #[test]
    fn rebuild_replaces_the_slice_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new();

        let stale = store.register_split_point("./pageRemoved");
        store.record_emission(&stale.id, TargetId::Browser, vec!["removed.chunk.js".into()]);
        store.mark_published(TargetId::Browser);
        store.persist_target(dir.path(), TargetId::Browser).unwrap();

        // Rebuild: the lazy import was deleted from source.
        store.begin_target(TargetId::Browser);
        let kept = store.register_split_point("./pageKept");
        store.record_emission(&kept.id, TargetId::Browser, vec!["kept.chunk.js".into()]);
        store.mark_published(TargetId::Browser);
        store.persist_target(dir.path(), TargetId::Browser).unwrap();

        let reader = ManifestReader::load(dir.path()).unwrap();
        assert!(matches!(
            reader.resolve(&stale.id, TargetId::Browser).unwrap_err(),
            Error::SplitPointNotFound { .. }
        ));
        assert_eq!(
            reader.resolve(&kept.id, TargetId::Browser).unwrap(),
            vec!["kept.chunk.js".to_string()]
        );
    }

    #[test]
    fn concurrent_target_publication_keeps_both_slices() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let store = ManifestStore::new();
        let sp = store.register_split_point("./pageA");
        store.record_emission(&sp.id, TargetId::Browser, vec!["a.chunk.js".into()]);
        store.record_emission(&sp.id, TargetId::Server, vec!["server/pageA.js".into()]);
        store.mark_published(TargetId::Browser);
        store.mark_published(TargetId::Server);

        // Both targets complete at the same moment, repeatedly. Every
        // round must publish both slices and neither write may fail.
        for _ in 0..200 {
            let barrier = std::sync::Barrier::new(2);
            std::thread::scope(|scope| {
                let handles = TargetId::all().map(|target| {
                    let store = &store;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        store.persist_target(root, target)
                    })
                });
                for handle in handles {
                    handle.join().unwrap().unwrap();
                }
            });

            let reader = ManifestReader::load(root).unwrap();
            assert_eq!(
                reader.resolve(&sp.id, TargetId::Browser).unwrap(),
                vec!["a.chunk.js".to_string()]
            );
            assert_eq!(
                reader.resolve(&sp.id, TargetId::Server).unwrap(),
                vec!["server/pageA.js".to_string()]
            );
        }
    }

    #[test]
    fn persist_requires_publication() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new();
        let err = store
            .persist_target(dir.path(), TargetId::Browser)
            .unwrap_err();
        assert!(matches!(err, Error::ManifestNotReady { .. }));
    }

    #[test]
    fn missing_manifest_file_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestReader::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing(_)));
    }
}
