//! Deduplicated candidate file set.
//!
//! Insertion order is meaningful for logging; uniqueness is mandatory. The
//! set is mutated only by the tracker's event consumer under a single lock
//! and frozen when the monitored process exits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ordered set of absolute candidate file paths.
#[derive(Debug, Clone, Default)]
pub struct TrackedFileSet {
    ordered: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl TrackedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path if it is not already present. Returns `true` for a
    /// novel insertion.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.ordered.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.ordered.iter()
    }

    /// Deterministically sorted copy of the paths, used at finalization.
    pub fn sorted(&self) -> Vec<PathBuf> {
        let mut paths = self.ordered.clone();
        paths.sort();
        paths
    }
}

impl IntoIterator for TrackedFileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.into_iter()
    }
}
