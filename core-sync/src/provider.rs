//! # Storage Providers
//!
//! ## Overview
//!
//! The closed set of remote storage backends transfers can target, plus the
//! static profile describing how each one is addressed in the transfer tool
//! configuration. Adding a backend means adding a variant here and a profile
//! row; everything else in the engine is provider-agnostic.

use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Kind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    GoogleDrive,
    OneDrive,
    Dropbox,
    WebDav,
}

/// Static description of a provider: how its remote is named in the transfer
/// tool configuration and what validation the engine must apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Section name of the remote in the transfer tool configuration, and
    /// the prefix of every remote path spec (`<remote>:<dir>`).
    pub remote_identifier: &'static str,
    /// Value the `type` key of the configuration section must carry.
    pub backend_type: &'static str,
    /// Human-readable name for logs and UI surfaces.
    pub display_name: &'static str,
    /// Whether the configuration section must carry a parseable OAuth token.
    /// Credential-less backends (WebDAV) skip the check.
    pub requires_token_check: bool,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::GoogleDrive,
        ProviderKind::OneDrive,
        ProviderKind::Dropbox,
        ProviderKind::WebDav,
    ];

    pub fn profile(&self) -> ProviderProfile {
        match self {
            ProviderKind::GoogleDrive => ProviderProfile {
                remote_identifier: "gdrive",
                backend_type: "drive",
                display_name: "Google Drive",
                requires_token_check: true,
            },
            ProviderKind::OneDrive => ProviderProfile {
                remote_identifier: "onedrive",
                backend_type: "onedrive",
                display_name: "OneDrive",
                requires_token_check: true,
            },
            ProviderKind::Dropbox => ProviderProfile {
                remote_identifier: "dropbox",
                backend_type: "dropbox",
                display_name: "Dropbox",
                requires_token_check: true,
            },
            ProviderKind::WebDav => ProviderProfile {
                remote_identifier: "webdav",
                backend_type: "webdav",
                display_name: "WebDAV",
                requires_token_check: false,
            },
        }
    }

    /// Stable identifier used in manifests and configuration.
    pub fn as_str(&self) -> &'static str {
        self.profile().remote_identifier
    }

    pub fn display_name(&self) -> &'static str {
        self.profile().display_name
    }

    /// Parses a stable identifier back into a kind. Accepts a few legacy
    /// spellings seen in older manifests.
    pub fn parse(s: &str) -> Option<ProviderKind> {
        match s.to_ascii_lowercase().as_str() {
            "gdrive" | "google_drive" | "googledrive" => Some(ProviderKind::GoogleDrive),
            "onedrive" | "one_drive" => Some(ProviderKind::OneDrive),
            "dropbox" => Some(ProviderKind::Dropbox),
            "webdav" | "web_dav" => Some(ProviderKind::WebDav),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
