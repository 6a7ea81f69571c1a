//! # Checksum Manifest Data Model
//!
//! One manifest exists per tracked item. It records, per file name, the
//! checksum/size/timestamp/path of the last confirmed transfer, plus a
//! denylist of files explicitly excluded from sync. The JSON field names are
//! part of the on-disk and remote contract and must not change.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file record of the last confirmed transfer.
///
/// The checksum is always the hash of the exact bytes last confirmed
/// transferred, never of a local state that failed to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChecksumRecord {
    /// Lowercase hex SHA-256 of the file contents.
    pub checksum: String,
    /// When the file was last uploaded (UTC).
    pub last_upload: DateTime<Utc>,
    /// Recorded source path, absolute or portabilized.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
}

/// Per-item manifest mapping tracked file names to checksum records.
///
/// Missing or unparsable manifests degrade to [`ChecksumManifest::default`],
/// never a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecksumManifest {
    /// Tracked file records keyed by file name (may include a relative
    /// subpath).
    pub files: BTreeMap<String, FileChecksumRecord>,
    /// When any record was last modified.
    pub last_updated: DateTime<Utc>,
    /// Whether activity tracking is enabled for this item.
    pub can_track: bool,
    /// Whether uploads are enabled for this item.
    pub can_uploads: bool,
    /// Optional remote-provider override for this item.
    pub provider: Option<String>,
    /// Files explicitly excluded from sync, same record shape.
    pub blacklist: BTreeMap<String, FileChecksumRecord>,
    /// Human-readable outcome of the last sync run.
    pub last_sync_status: String,
}

impl Default for ChecksumManifest {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            can_track: true,
            can_uploads: true,
            provider: None,
            blacklist: BTreeMap::new(),
            last_sync_status: String::new(),
        }
    }
}

impl ChecksumManifest {
    /// Insert or replace the record for `file_name`, refreshing
    /// `last_updated`.
    pub fn upsert(&mut self, file_name: &str, record: FileChecksumRecord) {
        self.last_updated = record.last_upload;
        self.files.insert(file_name.to_string(), record);
    }

    /// Look up the record for a file name.
    pub fn record(&self, file_name: &str) -> Option<&FileChecksumRecord> {
        self.files.get(file_name)
    }

    /// Whether this file name is on the denylist.
    pub fn is_blacklisted(&self, file_name: &str) -> bool {
        self.blacklist.contains_key(file_name)
    }

    /// Remove records whose `lastUpload` is older than `max_age` relative
    /// to `now`. Returns the number of records removed.
    pub fn prune(&mut self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let before = self.files.len();
        self.files.retain(|_, record| record.last_upload >= cutoff);
        before - self.files.len()
    }
}
