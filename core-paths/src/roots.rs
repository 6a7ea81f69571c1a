//! Known portable roots.
//!
//! A prioritized mapping from absolute root directories to symbolic
//! placeholder tokens. Matching is longest-prefix-wins: candidates are
//! ordered by absolute-path length descending (lexicographic tie-break), so
//! the mapping is deterministic for a fixed root set and a shorter root can
//! never swallow a more specific one.

use std::path::{Path, PathBuf};

/// One root-to-token entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMapping {
    /// Absolute root directory.
    pub path: PathBuf,
    /// Placeholder token, e.g. `<home>`.
    pub token: String,
}

/// Prioritized root table used by the codec.
///
/// # Example
///
/// ```ignore
/// use core_paths::{normalize, KnownRoots};
/// use std::path::Path;
///
/// let roots = KnownRoots::discover(Some(Path::new("/opt/game")));
/// let portable = normalize(Path::new("/opt/game/saves/slot0.sav"), &roots);
/// assert_eq!(portable, "<install>/saves/slot0.sav");
/// ```
#[derive(Debug, Clone, Default)]
pub struct KnownRoots {
    entries: Vec<RootMapping>,
}

/// Token for the user profile directory.
pub const TOKEN_HOME: &str = "<home>";
/// Token for the roaming application-data directory.
pub const TOKEN_DATA: &str = "<data>";
/// Token for the local (machine-bound) application-data directory.
pub const TOKEN_DATA_LOCAL: &str = "<data_local>";
/// Token for the user configuration directory.
pub const TOKEN_CONFIG: &str = "<config>";
/// Token for the monitored item's own install directory.
pub const TOKEN_INSTALL: &str = "<install>";

impl KnownRoots {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table from the current machine's standard directories, plus
    /// the monitored item's install directory when known.
    ///
    /// Root discovery is best-effort: directories the platform cannot
    /// resolve are simply absent from the table.
    pub fn discover(install_dir: Option<&Path>) -> Self {
        let mut roots = Self::new();
        // Install dir first so it outranks equal-length ties; ordering is
        // re-derived on every match anyway.
        if let Some(dir) = install_dir {
            roots.add(dir, TOKEN_INSTALL);
        }
        if let Some(dir) = dirs::data_dir() {
            roots.add(&dir, TOKEN_DATA);
        }
        if let Some(dir) = dirs::data_local_dir() {
            roots.add(&dir, TOKEN_DATA_LOCAL);
        }
        if let Some(dir) = dirs::config_dir() {
            roots.add(&dir, TOKEN_CONFIG);
        }
        if let Some(dir) = dirs::home_dir() {
            roots.add(&dir, TOKEN_HOME);
        }
        roots
    }

    /// Add a root mapping. Later additions with the same path replace the
    /// earlier token.
    pub fn add(&mut self, path: &Path, token: &str) {
        let normalized = super::codec::to_portable_separators(path);
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| super::codec::to_portable_separators(&e.path) == normalized)
        {
            existing.token = token.to_string();
            return;
        }
        self.entries.push(RootMapping {
            path: path.to_path_buf(),
            token: token.to_string(),
        });
    }

    /// Builder-style [`add`](Self::add).
    pub fn with_root(mut self, path: &Path, token: &str) -> Self {
        self.add(path, token);
        self
    }

    /// Entries ordered for matching: path length descending, then
    /// lexicographic, so the ordering is total and deterministic.
    pub(crate) fn ordered_by_path(&self) -> Vec<&RootMapping> {
        let mut ordered: Vec<&RootMapping> = self.entries.iter().collect();
        ordered.sort_by(|a, b| {
            let la = a.path.as_os_str().len();
            let lb = b.path.as_os_str().len();
            lb.cmp(&la).then_with(|| a.path.cmp(&b.path))
        });
        ordered
    }

    /// Entries ordered for expansion: token's expansion length descending,
    /// same tie-break as [`ordered_by_path`](Self::ordered_by_path).
    pub(crate) fn ordered_by_token(&self) -> Vec<&RootMapping> {
        // The same descending-length rule applies to the inverse direction.
        self.ordered_by_path()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_replaces_duplicate_path() {
        let mut roots = KnownRoots::new();
        roots.add(Path::new("/home/alice"), TOKEN_HOME);
        roots.add(Path::new("/home/alice"), "<other>");

        assert_eq!(roots.len(), 1);
        assert_eq!(roots.ordered_by_path()[0].token, "<other>");
    }

    #[test]
    fn test_ordering_longest_first() {
        let roots = KnownRoots::new()
            .with_root(Path::new("/home/alice"), TOKEN_HOME)
            .with_root(Path::new("/home/alice/.local/share"), TOKEN_DATA);

        let ordered = roots.ordered_by_path();
        assert_eq!(ordered[0].token, TOKEN_DATA);
        assert_eq!(ordered[1].token, TOKEN_HOME);
    }

    #[test]
    fn test_ordering_deterministic_on_equal_length() {
        let a = KnownRoots::new()
            .with_root(Path::new("/aaa/bbb"), "<one>")
            .with_root(Path::new("/aaa/bbc"), "<two>");
        let b = KnownRoots::new()
            .with_root(Path::new("/aaa/bbc"), "<two>")
            .with_root(Path::new("/aaa/bbb"), "<one>");

        let oa: Vec<_> = a.ordered_by_path().iter().map(|r| r.token.clone()).collect();
        let ob: Vec<_> = b.ordered_by_path().iter().map(|r| r.token.clone()).collect();
        assert_eq!(oa, ob);
    }
}
