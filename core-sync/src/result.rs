//! # Run State and Statistics
//!
//! ## Overview
//!
//! The lifecycle state machine a sync run moves through and the counters it
//! accumulates. Transitions are validated so a run can never, for example,
//! report `Done` without passing through validation and planning, and
//! cancellation is only honoured at a file boundary during transfer.

use std::time::Duration;

use crate::error::{Result, SyncError};

// ============================================================================
// Run State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Validating,
    Planning,
    Transferring,
    Finalizing,
    Done,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Init => "init",
            RunState::Validating => "validating",
            RunState::Planning => "planning",
            RunState::Transferring => "transferring",
            RunState::Finalizing => "finalizing",
            RunState::Done => "done",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Cancelled | RunState::Failed)
    }

    /// Validates a lifecycle transition. Setup failures may only occur
    /// before transfers start; cancellation only while transferring.
    pub fn validate_transition(from: RunState, to: RunState) -> Result<()> {
        let valid = matches!(
            (from, to),
            (RunState::Init, RunState::Validating)
                | (RunState::Validating, RunState::Planning)
                | (RunState::Validating, RunState::Failed)
                | (RunState::Planning, RunState::Transferring)
                | (RunState::Planning, RunState::Failed)
                | (RunState::Planning, RunState::Done)
                | (RunState::Transferring, RunState::Finalizing)
                | (RunState::Transferring, RunState::Cancelled)
                | (RunState::Finalizing, RunState::Done)
        );
        if valid {
            Ok(())
        } else {
            Err(SyncError::InvalidStateTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters accumulated over one run. Skips and failures are per file and
/// never abort the run; `failed_files` names every file whose transfer
/// exhausted the retry bound or whose destination could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub files_uploaded: usize,
    pub files_downloaded: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
    pub bytes_skipped: u64,
    pub bytes_failed: u64,
    pub failed_files: Vec<String>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_upload(&mut self, bytes: u64) {
        self.files_uploaded += 1;
        self.bytes_uploaded += bytes;
    }

    pub fn record_download(&mut self, bytes: u64) {
        self.files_downloaded += 1;
        self.bytes_downloaded += bytes;
    }

    /// Size is the best-known byte count for the skipped item (zero when
    /// nothing ever recorded one).
    pub fn record_skip(&mut self, bytes: u64) {
        self.files_skipped += 1;
        self.bytes_skipped += bytes;
    }

    pub fn record_failure(&mut self, name: impl Into<String>, bytes: u64) {
        self.files_failed += 1;
        self.bytes_failed += bytes;
        self.failed_files.push(name.into());
    }

    /// One-line status summary persisted into the manifest after a run.
    pub fn status_line(&self) -> String {
        if self.files_failed == 0 {
            "ok".to_string()
        } else {
            format!("{} failed", self.files_failed)
        }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub stats: SyncStats,
    pub final_state: RunState,
    pub elapsed: Duration,
}

impl SyncResult {
    pub fn is_complete(&self) -> bool {
        self.final_state == RunState::Done && self.stats.files_failed == 0
    }
}
