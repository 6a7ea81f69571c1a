//! Manifest persistence.
//!
//! Loads and saves the per-item JSON manifest. Loads never fail: a missing
//! or corrupt manifest degrades to an empty one. Saves are atomic (written
//! to a temporary sibling and renamed into place) so a crash mid-write
//! cannot corrupt the previous manifest.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::ChecksumManifest;

/// On-disk manifest file name inside a tracked item's directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Loads/saves manifests inside item directories.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore;

impl ManifestStore {
    pub fn new() -> Self {
        Self
    }

    /// Path of the manifest inside `dir`.
    pub fn manifest_path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE_NAME)
    }

    /// Load the manifest from `dir`.
    ///
    /// Never fails: a missing file yields the default manifest, and an
    /// unparsable file is logged as a warning and also yields the default.
    pub async fn load(&self, dir: &Path) -> ChecksumManifest {
        let path = Self::manifest_path(dir);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No manifest on disk, starting empty");
                return ChecksumManifest::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read manifest, starting empty");
                return ChecksumManifest::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unparsable manifest, starting empty");
                ChecksumManifest::default()
            }
        }
    }

    /// Save the manifest into `dir`, creating the directory if absent.
    pub async fn save(&self, dir: &Path, manifest: &ChecksumManifest) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let path = Self::manifest_path(dir);
        let tmp = dir.join(format!("{MANIFEST_FILE_NAME}.tmp"));
        let serialized = serde_json::to_vec_pretty(manifest)?;

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&serialized).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), files = manifest.files.len(), "Saved manifest");
        Ok(())
    }
}
