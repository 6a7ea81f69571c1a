//! # Activity Tracker
//!
//! Discovers which files a running application actually touches to persist
//! its data, by correlating a kernel-level file I/O event stream to one
//! target process.
//!
//! ## Overview
//!
//! - [`ActivityTracker`] - entry point; enforces the one-session invariant
//!   through an atomic [`SessionRegistry`]
//! - [`TrackingSession`] - one correlation run with a validated lifecycle
//!   (`Idle → Tracking → Draining → Finalized`, or `Failed` on setup error)
//! - [`TrackedFileSet`] - deduplicated, insertion-ordered candidate paths
//!
//! Event callbacks arrive on a thread owned by the external source and only
//! filter and insert under one short-held mutex; the session's caller blocks
//! cooperatively on process exit and finalizes after a drain grace period.

mod error;
mod registry;
mod state;
mod tracked_set;
mod tracker;

pub use error::{Result, TrackerError};
pub use registry::{global as global_registry, SessionRegistry};
pub use state::SessionState;
pub use tracked_set::TrackedFileSet;
pub use tracker::{ActivityTracker, TrackerOptions, TrackingSession, SIDECAR_FILE_NAME};
