//! # Tracking Session State Machine
//!
//! Manages the lifecycle of an activity tracking session with validated
//! state transitions.
//!
//! ## State Machine
//!
//! ```text
//! Idle → Tracking → Draining → Finalized
//!            ↓
//!          Failed
//! ```
//!
//! `Draining` begins when the target process terminates (or the wait ceiling
//! expires); a short grace period then flushes in-flight events before the
//! session finalizes. `Failed` is reachable only from `Tracking` setup
//! errors, which perform no partial writes.

use crate::{Result, TrackerError};
use std::str::FromStr;

/// The current state of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session object exists but tracking has not begun.
    Idle,
    /// Subscribed and correlating events to the target process.
    Tracking,
    /// Target exited; flushing in-flight events before finalizing.
    Draining,
    /// File set frozen and sidecar written.
    Finalized,
    /// Setup failed; nothing was written.
    Failed,
}

impl SessionState {
    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Finalized | SessionState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Tracking => "tracking",
            SessionState::Draining => "draining",
            SessionState::Finalized => "finalized",
            SessionState::Failed => "failed",
        }
    }

    /// Validate a transition out of this state.
    pub fn validate_transition(&self, to: SessionState) -> Result<()> {
        let valid = matches!(
            (self, to),
            (SessionState::Idle, SessionState::Tracking)
                | (SessionState::Tracking, SessionState::Draining)
                | (SessionState::Tracking, SessionState::Failed)
                | (SessionState::Draining, SessionState::Finalized)
        );

        if !valid {
            return Err(TrackerError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        Ok(())
    }
}

impl FromStr for SessionState {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SessionState::Idle),
            "tracking" => Ok(SessionState::Tracking),
            "draining" => Ok(SessionState::Draining),
            "finalized" => Ok(SessionState::Finalized),
            "failed" => Ok(SessionState::Failed),
            _ => Err(TrackerError::InvalidStateTransition {
                from: s.to_string(),
                to: "?".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
