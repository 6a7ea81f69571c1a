//! Process Inspection Abstraction
//!
//! The tracker resolves its target process before subscribing to the event
//! stream and then blocks (cooperatively) on that process's exit. Both
//! operations go through this seam so tests can script process lifetimes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Process liveness probe.
#[async_trait]
pub trait ProcessProbe: Send + Sync {
    /// Whether a process with this id currently exists.
    async fn exists(&self, pid: u32) -> Result<bool>;

    /// Wait until the process exits or `max_wait` elapses.
    ///
    /// Returns `true` when the process exited within the window, `false` on
    /// expiry. Implementations poll cooperatively; they never busy-spin.
    async fn wait_for_exit(&self, pid: u32, max_wait: Duration) -> Result<bool>;
}
