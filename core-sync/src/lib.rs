//! # Sync Core
//!
//! Checksum-diffed, resumable transfer of save files to and from cloud
//! storage remotes.
//!
//! ## Overview
//!
//! The engine never speaks a storage protocol itself. Every transfer is one
//! invocation of an external transfer tool ([`bridge_traits::CommandRunner`])
//! against a configured remote, and every decision about what to transfer
//! comes from diffing SHA-256 checksums against the per-item manifest
//! ([`core_manifest`]). An interrupted run loses at most the file in flight:
//! the manifest is persisted after every confirmed transfer and published to
//! the remote last, so the remote manifest only ever describes fully
//! completed state.
//!
//! ## Components
//!
//! - [`SyncEngine`] - upload and download runs, remote listing and manifest
//!   fetch, per-file retry with a fixed bound
//! - [`ProviderKind`] - the closed set of storage backends and their static
//!   profiles
//! - [`RemoteConfig`] - transfer tool configuration parsing and preflight
//!   validation
//! - [`DestinationResolver`] - portable-path expansion and user remapping
//!   for restores
//! - [`RunState`] / [`SyncStats`] / [`SyncResult`] - run lifecycle and
//!   outcome reporting

mod engine;
mod error;
mod provider;
mod remote;
mod remote_config;
mod resolver;
mod result;

pub use engine::{SyncEngine, SyncEngineConfig};
pub use error::{Result, SyncError};
pub use provider::{ProviderKind, ProviderProfile};
pub use remote::{parse_listing, RemoteFileDescriptor, RemoteTarget};
pub use remote_config::RemoteConfig;
pub use resolver::DestinationResolver;
pub use result::{RunState, SyncResult, SyncStats};
