//! Destination resolution for download runs.
//!
//! Manifest records carry portable paths written on another machine. Before
//! a downloaded file can be moved into place the path must be expanded
//! against this machine's roots and, when the manifest came from a different
//! account, have its user segment remapped.

use std::path::PathBuf;

use core_manifest::FileChecksumRecord;
use core_paths::{expand, is_portable, remap_user, KnownRoots};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone)]
pub struct DestinationResolver {
    roots: KnownRoots,
    /// Username to substitute into literal per-user paths from a foreign
    /// manifest. `None` leaves paths as written.
    target_user: Option<String>,
}

impl DestinationResolver {
    pub fn new(roots: KnownRoots) -> Self {
        Self {
            roots,
            target_user: None,
        }
    }

    pub fn with_target_user(mut self, user: impl Into<String>) -> Self {
        self.target_user = Some(user.into());
        self
    }

    /// Resolves a manifest record to the absolute local path the file
    /// belongs at. Fails if the stored path cannot be made absolute on
    /// this machine.
    pub fn resolve(&self, name: &str, record: &FileChecksumRecord) -> Result<PathBuf> {
        let stored = record.path.as_str();
        if stored.is_empty() {
            return Err(SyncError::PathResolution {
                name: name.to_string(),
                reason: "record has no path".to_string(),
            });
        }

        let mut resolved = if is_portable(stored) {
            expand(stored, &self.roots)
        } else {
            PathBuf::from(stored)
        };

        if let Some(user) = &self.target_user {
            resolved = remap_user(&resolved, user);
        }

        if !resolved.is_absolute() {
            return Err(SyncError::PathResolution {
                name: name.to_string(),
                reason: format!("'{}' did not resolve to an absolute path", stored),
            });
        }
        Ok(resolved)
    }
}
