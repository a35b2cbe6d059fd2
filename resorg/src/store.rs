//! The resource store: every known file's collection, keyed by relative
//! path. The unit of persistence and of set algebra across builds.

use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use ignore::WalkBuilder;
use serde::Serialize;

use crate::{
    archive, db,
    diagnostics::DiagnosticSink,
    error::Error,
    file::ResourceFile,
    resx,
    types::InvariantKey,
};

/// A mapping from relative file path to its resource collection.
///
/// At most one collection per path, and never a collection with zero
/// entries: subtract/intersect drop a path outright when it empties. The
/// algebraic operations are pure; inputs are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResourceStore {
    files: BTreeMap<String, ResourceFile>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a store from `path`, dispatching on its nature: a directory is
    /// scanned recursively for qualifying resource files, a `.resx` file
    /// becomes a single-file store keyed by its file name, and anything else
    /// is decoded as a persisted store database. A missing path is a hard
    /// failure; callers that may start fresh must check for existence first.
    pub fn read_from(path: &Path, sink: &mut dyn DiagnosticSink) -> Result<Self, Error> {
        let metadata = std::fs::metadata(path)?;
        if metadata.is_dir() {
            return Self::read_directory(path, sink);
        }
        if resx::is_invariant_resource_file(path) {
            let relative_path = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| Error::invalid_resource("path has no file name"))?;
            let file = ResourceFile::read(path, &relative_path, sink)?;
            let mut store = ResourceStore::new();
            store.insert(file);
            return Ok(store);
        }
        db::read(path)
    }

    // Scan a directory tree, parsing every qualifying resource file keyed by
    // its relative path. Paths are visited in sorted order so repeated scans
    // of the same tree produce identical stores.
    fn read_directory(root: &Path, sink: &mut dyn DiagnosticSink) -> Result<Self, Error> {
        let mut paths = Vec::new();
        for result in WalkBuilder::new(root).standard_filters(false).build() {
            let entry = result.map_err(|e| Error::DataMismatch(e.to_string()))?;
            let path = entry.path().to_path_buf();
            if path.is_file() && resx::is_invariant_resource_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut store = ResourceStore::new();
        for path in paths {
            let relative_path = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let file = ResourceFile::read(&path, &relative_path, sink)?;
            store.insert(file);
        }
        Ok(store)
    }

    /// Adds a collection, replacing any previous collection for its path.
    pub fn insert(&mut self, file: ResourceFile) {
        self.files.insert(file.relative_path.clone(), file);
    }

    pub fn get(&self, relative_path: &str) -> Option<&ResourceFile> {
        self.files.get(relative_path)
    }

    /// Collections in relative-path order.
    pub fn files(&self) -> impl Iterator<Item = &ResourceFile> {
        self.files.values()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of files in the store.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Union with `other`: paths absent from `self` are cloned in whole,
    /// paths present in both delegate to [`ResourceFile::add`]. Paths not in
    /// `other` are untouched.
    #[must_use]
    pub fn add(&self, other: &ResourceStore) -> ResourceStore {
        let mut files = self.files.clone();
        for (path, incoming) in &other.files {
            match files.get(path) {
                None => {
                    files.insert(path.clone(), incoming.clone());
                }
                Some(existing) => {
                    files.insert(path.clone(), existing.add(incoming));
                }
            }
        }
        ResourceStore { files }
    }

    /// Difference with `other`: for paths present in both, `other`'s key set
    /// is removed from `self`'s collection; a collection left empty drops
    /// its path entirely. Paths only in `self` are untouched, paths only in
    /// `other` are ignored.
    #[must_use]
    pub fn subtract(&self, other: &ResourceStore) -> ResourceStore {
        let mut files = BTreeMap::new();
        for (path, file) in &self.files {
            let result = match other.files.get(path) {
                None => file.clone(),
                Some(theirs) => file.subtract(&theirs.key_set()),
            };
            if !result.is_empty() {
                files.insert(path.clone(), result);
            }
        }
        ResourceStore { files }
    }

    /// Intersection with `other`: paths absent from `other` are dropped; the
    /// rest intersect key sets, dropping any path whose collection empties.
    #[must_use]
    pub fn intersect(&self, other: &ResourceStore) -> ResourceStore {
        let mut files = BTreeMap::new();
        for (path, file) in &self.files {
            let Some(theirs) = other.files.get(path) else {
                continue;
            };
            let result = file.intersect(&theirs.key_set());
            if !result.is_empty() {
                files.insert(path.clone(), result);
            }
        }
        ResourceStore { files }
    }

    /// The deduplicated key set across every file's every entry, sorted by
    /// the invariant-key ordering. The dedup index when persisting.
    pub fn all_keys(&self) -> Vec<InvariantKey> {
        let mut keys: Vec<InvariantKey> = self
            .files
            .values()
            .flat_map(|file| file.entries.iter().map(|entry| entry.invariant.clone()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        keys.sort();
        keys
    }

    /// Persists to `target`, replacing any previous database there. Not
    /// crash-atomic; prefer [`ResourceStore::save_atomic`].
    pub fn save(&self, target: &Path, sink: &mut dyn DiagnosticSink) -> Result<(), Error> {
        db::save(self, target, sink)
    }

    /// Persists to `target` through a temporary file and a single rename, so
    /// an interrupted write leaves the previous content untouched.
    pub fn save_atomic(&self, target: &Path, sink: &mut dyn DiagnosticSink) -> Result<(), Error> {
        db::save_atomic(self, target, sink)
    }

    /// Writes a zip archive with one entry per file (invariant rendering)
    /// plus one entry per language present in that file.
    pub fn export(&self, target: &Path) -> Result<(), Error> {
        archive::export(self, target)
    }
}
