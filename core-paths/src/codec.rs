//! Path portabilization codec.
//!
//! Converts absolute paths to and from a machine-independent symbolic form,
//! and remaps the user-account segment of a path so a manifest recorded
//! under one account restores correctly under another.

use std::path::{Path, PathBuf};

use crate::roots::KnownRoots;

/// Canonical separator used in portable form.
const PORTABLE_SEP: char = '/';

/// Render a path with canonical separators.
pub(crate) fn to_portable_separators(path: &Path) -> String {
    let raw = path.to_string_lossy();
    raw.replace('\\', "/")
}

/// True when `candidate` sits at a path-component boundary of `full`:
/// either the strings are equal or the next character is a separator.
fn prefix_at_boundary(full: &str, candidate: &str) -> bool {
    if !full.starts_with(candidate) {
        return false;
    }
    full.len() == candidate.len() || full[candidate.len()..].starts_with(PORTABLE_SEP)
}

/// Replace the longest matching known-root prefix with its token.
///
/// Non-matching paths pass through unchanged apart from separator
/// normalization.
pub fn normalize(path: &Path, roots: &KnownRoots) -> String {
    let full = to_portable_separators(path);
    for root in roots.ordered_by_path() {
        let root_str = to_portable_separators(&root.path);
        let trimmed = root_str.trim_end_matches(PORTABLE_SEP);
        if prefix_at_boundary(&full, trimmed) {
            return format!("{}{}", root.token, &full[trimmed.len()..]);
        }
    }
    full
}

/// Inverse of [`normalize`]: substitute a leading token with its root.
///
/// Portable strings without a known token pass through unchanged.
pub fn expand(portable: &str, roots: &KnownRoots) -> PathBuf {
    for root in roots.ordered_by_token() {
        if prefix_at_boundary(portable, &root.token) {
            let rest = portable[root.token.len()..].trim_start_matches(PORTABLE_SEP);
            if rest.is_empty() {
                return root.path.clone();
            }
            return root.path.join(rest);
        }
    }
    PathBuf::from(portable)
}

/// Whether a recorded path is in portable (token-prefixed) form.
pub fn is_portable(recorded: &str) -> bool {
    recorded.starts_with('<')
}

/// Replace the account name embedded in a user-home path segment.
///
/// Recognizes `/home/<user>/...`, `/Users/<user>/...` and
/// `C:/Users/<user>/...` shapes. Only the account component changes; when
/// the embedded name already matches `target_user`, or no user segment is
/// present, the path is returned untouched.
pub fn remap_user(path: &Path, target_user: &str) -> PathBuf {
    let full = to_portable_separators(path);
    let mut parts: Vec<String> = full.split(PORTABLE_SEP).map(str::to_string).collect();

    for i in 0..parts.len().saturating_sub(1) {
        let marker = parts[i].to_ascii_lowercase();
        if marker == "home" || marker == "users" {
            if !parts[i + 1].is_empty() && parts[i + 1] != target_user {
                parts[i + 1] = target_user.to_string();
            }
            return PathBuf::from(parts.join("/"));
        }
    }
    path.to_path_buf()
}
