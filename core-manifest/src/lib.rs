//! # Checksum Manifest Store
//!
//! Per-item persistence of last-known-synced file state.
//!
//! ## Overview
//!
//! Each tracked item owns one JSON manifest mapping file names to
//! checksum/size/timestamp/path records. The sync engine diffs candidate
//! files against these records to compute a minimal transfer set, persists
//! the manifest after every successful transfer (making runs resumable), and
//! publishes the manifest remotely last, as a completion marker.
//!
//! ## Guarantees
//!
//! - Loading never fails: absent or corrupt manifests degrade to empty.
//! - Saving is atomic: temp write plus rename, so a crash mid-write cannot
//!   corrupt the previous manifest.
//! - One canonical checksum algorithm (SHA-256) everywhere.

pub mod checksum;
mod error;
mod model;
mod store;

pub use error::{ManifestError, Result};
pub use model::{ChecksumManifest, FileChecksumRecord};
pub use store::{ManifestStore, MANIFEST_FILE_NAME};
