//! Remote addressing and listing.

use chrono::{DateTime, Utc};
use core_manifest::ChecksumManifest;
use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::provider::ProviderKind;

/// One remote location transfers run against: a provider plus a directory
/// on that provider's backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub provider: ProviderKind,
    /// Directory on the remote, without a leading slash.
    pub remote_dir: String,
}

impl RemoteTarget {
    pub fn new(provider: ProviderKind, remote_dir: impl Into<String>) -> Self {
        Self {
            provider,
            remote_dir: remote_dir.into(),
        }
    }

    /// Honours a provider override stored in the manifest, falling back to
    /// `default` when the manifest carries none. An unparseable override
    /// is an error rather than a silent fallback.
    pub fn for_manifest(
        manifest: &ChecksumManifest,
        default: ProviderKind,
        remote_dir: impl Into<String>,
    ) -> Result<Self> {
        let provider = match manifest.provider.as_deref() {
            Some(id) => {
                ProviderKind::parse(id).ok_or_else(|| SyncError::UnknownProvider(id.to_string()))?
            }
            None => default,
        };
        Ok(Self::new(provider, remote_dir))
    }

    /// Path spec for the remote directory, `<remote>:<dir>`.
    pub fn dir_spec(&self) -> String {
        format!(
            "{}:{}",
            self.provider.profile().remote_identifier,
            self.remote_dir
        )
    }

    /// Path spec for one file inside the remote directory.
    pub fn file_spec(&self, name: &str) -> String {
        format!("{}/{}", self.dir_spec(), name)
    }
}

/// One file on the remote, as reported by the transfer tool's JSON listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileDescriptor {
    pub name: String,
    pub size: u64,
    pub mod_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ListingEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Size", default)]
    size: i64,
    #[serde(rename = "ModTime", default)]
    mod_time: Option<String>,
    #[serde(rename = "IsDir", default)]
    is_dir: bool,
}

/// Parses the transfer tool's `lsjson` output into file descriptors.
/// Directories are dropped; a negative size (unknown) is reported as zero.
pub fn parse_listing(json: &str) -> Result<Vec<RemoteFileDescriptor>> {
    let entries: Vec<ListingEntry> = serde_json::from_str(json)
        .map_err(|e| SyncError::setup(format!("remote listing is not valid JSON: {}", e)))?;
    Ok(entries
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| RemoteFileDescriptor {
            name: e.name,
            size: e.size.max(0) as u64,
            mod_time: e
                .mod_time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
        .collect())
}
