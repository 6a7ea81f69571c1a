//! Workspace facade crate.
//!
//! Re-exports the crates a host application needs to wire a full save sync
//! pipeline: the activity tracker, the sync engine, logging setup, and the
//! desktop bridge implementations. Depend on `savesync-workspace` instead of
//! naming each crate individually.

pub use bridge_desktop;
pub use core_runtime;
pub use core_sync;
pub use core_tracker;
