//! # Activity Tracker
//!
//! Correlates a live kernel-level file I/O event stream to one target
//! process and produces a deduplicated, noise-filtered candidate file set.
//!
//! ## Overview
//!
//! A session subscribes to the external event source for the process
//! lifetime. Event callbacks arrive on a thread owned by the source and only
//! validate, filter, and insert under a single short-held mutex. The caller
//! blocks cooperatively on the process's exit, waits a fixed grace period to
//! drain in-flight events, then finalizes: the path list is sorted
//! deterministically, serialized as a sidecar file next to the monitored
//! item, and the sidecar's own path joins the tracked set so it becomes part
//! of what gets synchronized.
//!
//! ## Timing rules
//!
//! - `minimum_dwell` (default 5s) is independent of `maximum_wait`: even an
//!   immediate process exit does not return before the dwell has elapsed, to
//!   avoid races with very short-lived startup writes.
//! - `maximum_wait` is a hard ceiling: on expiry the tracker finalizes with
//!   whatever has accumulated as a best-effort partial result, not a failure.
//!
//! ## Usage
//!
//! ```ignore
//! use core_tracker::{ActivityTracker, TrackerOptions};
//! use std::time::Duration;
//!
//! # async fn example(tracker: ActivityTracker) -> core_tracker::Result<()> {
//! let options = TrackerOptions::new("/items/mygame".into())
//!     .with_maximum_wait(Duration::from_secs(7200))
//!     .with_ignored_prefix("C:\\Windows");
//! let session = tracker.start(4242, options).await?;
//! let files = session.await_final_result().await?;
//! for path in files.iter() {
//!     println!("tracked: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use bridge_traits::{
    BridgeError, EventCallback, EventInterest, EventSubscription, FileEventSource, FileIoEvent,
    FileOperation, ProcessProbe,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::registry::{self, SessionRegistry};
use crate::state::SessionState;
use crate::tracked_set::TrackedFileSet;
use crate::{Result, TrackerError};

/// Sidecar file name written next to the monitored item on finalize.
pub const SIDECAR_FILE_NAME: &str = "tracked_files.json";

/// Options for one tracking session.
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Deliver write events (the main signal).
    pub track_writes: bool,
    /// Also deliver read events.
    pub track_reads: bool,
    /// Case-insensitive path prefixes to discard.
    pub ignored_prefixes: Vec<String>,
    /// Do not return before this much time has elapsed since start.
    pub minimum_dwell: Duration,
    /// Hard ceiling on how long to wait for the process to exit.
    pub maximum_wait: Duration,
    /// Grace period after process exit to flush in-flight events.
    pub drain_grace: Duration,
    /// Directory the sidecar is written into (the monitored item's own
    /// directory).
    pub sidecar_dir: PathBuf,
}

impl TrackerOptions {
    pub fn new(sidecar_dir: PathBuf) -> Self {
        Self {
            track_writes: true,
            track_reads: false,
            ignored_prefixes: Vec::new(),
            minimum_dwell: Duration::from_secs(5),
            maximum_wait: Duration::from_secs(3600),
            drain_grace: Duration::from_secs(2),
            sidecar_dir,
        }
    }

    pub fn with_reads(mut self, track_reads: bool) -> Self {
        self.track_reads = track_reads;
        self
    }

    pub fn with_ignored_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_prefixes.push(prefix.into());
        self
    }

    pub fn with_minimum_dwell(mut self, dwell: Duration) -> Self {
        self.minimum_dwell = dwell;
        self
    }

    pub fn with_maximum_wait(mut self, ceiling: Duration) -> Self {
        self.maximum_wait = ceiling;
        self
    }

    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }
}

/// State shared between the caller and the event callback.
struct SessionShared {
    target_pid: u32,
    track_writes: bool,
    track_reads: bool,
    /// Pre-lowercased for case-insensitive prefix matching.
    ignored_prefixes: Vec<String>,
    files: Mutex<TrackedFileSet>,
    state: Mutex<SessionState>,
}

impl SessionShared {
    fn transition(&self, to: SessionState) -> Result<()> {
        let mut state = self.state.lock().expect("session state lock poisoned");
        state.validate_transition(to)?;
        *state = to;
        Ok(())
    }

    fn current_state(&self) -> SessionState {
        *self.state.lock().expect("session state lock poisoned")
    }

    /// Event-source callback body. Runs on the source's thread: validate,
    /// filter, insert, nothing else.
    fn consume(&self, event: FileIoEvent) {
        if event.process_id != self.target_pid {
            return;
        }
        match event.operation {
            FileOperation::Write if !self.track_writes => return,
            FileOperation::Read if !self.track_reads => return,
            _ => {}
        }
        if event.path.as_os_str().is_empty() {
            return;
        }
        let lowered = event.path.to_string_lossy().to_lowercase();
        if self
            .ignored_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            return;
        }
        if !matches!(
            self.current_state(),
            SessionState::Tracking | SessionState::Draining
        ) {
            return;
        }

        let mut files = self.files.lock().expect("tracked set lock poisoned");
        if files.insert(event.path.clone()) {
            debug!(path = %event.path.display(), "Tracking new candidate file");
        }
    }
}

/// One active correlation run.
///
/// Created by [`ActivityTracker::start`]; consumed by
/// [`await_final_result`](TrackingSession::await_final_result) or
/// [`stop`](TrackingSession::stop).
pub struct TrackingSession {
    shared: Arc<SessionShared>,
    subscription: Box<dyn EventSubscription>,
    probe: Arc<dyn ProcessProbe>,
    registry: Arc<SessionRegistry>,
    options: TrackerOptions,
    started: Instant,
    unsubscribed: AtomicBool,
    released: AtomicBool,
}

impl TrackingSession {
    /// Target process id this session is correlated to.
    pub fn target_pid(&self) -> u32 {
        self.shared.target_pid
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.current_state()
    }

    /// Number of candidate paths accumulated so far.
    pub fn candidate_count(&self) -> usize {
        self.shared.files.lock().expect("tracked set lock poisoned").len()
    }

    /// Detach from the event source exactly once.
    fn detach(&self) {
        if !self.unsubscribed.swap(true, Ordering::AcqRel) {
            self.subscription.unsubscribe();
        }
    }

    /// Release the one-session slot exactly once.
    fn release_slot(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.registry.release();
        }
    }

    fn teardown(&self) {
        self.detach();
        self.release_slot();
    }

    /// Block cooperatively until the target exits (or the wait ceiling
    /// expires), drain, and finalize the tracked file set.
    #[instrument(skip(self), fields(pid = self.shared.target_pid))]
    pub async fn await_final_result(self) -> Result<TrackedFileSet> {
        let result = self.run_to_completion().await;
        // Error paths must still free the slot; the success path already
        // tore down before returning.
        self.teardown();
        result
    }

    async fn run_to_completion(&self) -> Result<TrackedFileSet> {
        let exited = self
            .probe
            .wait_for_exit(self.shared.target_pid, self.options.maximum_wait)
            .await
            .map_err(|e| TrackerError::Probe(e.to_string()))?;

        self.shared.transition(SessionState::Draining)?;

        if exited {
            debug!(grace_ms = self.options.drain_grace.as_millis() as u64, "Process exited, draining in-flight events");
            tokio::time::sleep(self.options.drain_grace).await;
        } else {
            warn!(
                ceiling_secs = self.options.maximum_wait.as_secs(),
                "Wait ceiling expired before process exit, finalizing best-effort"
            );
        }

        // Dwell is independent of the exit wait: never return early even if
        // the process died almost immediately.
        let elapsed = self.started.elapsed();
        if elapsed < self.options.minimum_dwell {
            tokio::time::sleep(self.options.minimum_dwell - elapsed).await;
        }

        self.detach();
        self.finalize().await
    }

    async fn finalize(&self) -> Result<TrackedFileSet> {
        let sorted = {
            let files = self.shared.files.lock().expect("tracked set lock poisoned");
            files.sorted()
        };

        tokio::fs::create_dir_all(&self.options.sidecar_dir).await?;
        let sidecar_path = self.options.sidecar_dir.join(SIDECAR_FILE_NAME);
        let listed: Vec<String> = sorted
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let encoded = serde_json::to_vec_pretty(&listed)?;
        tokio::fs::write(&sidecar_path, encoded).await?;

        let mut result = TrackedFileSet::new();
        for path in sorted {
            result.insert(path);
        }
        // The sidecar itself is part of what gets synchronized.
        result.insert(sidecar_path);

        self.shared.transition(SessionState::Finalized)?;
        info!(files = result.len(), "Tracking session finalized");
        Ok(result)
    }

    /// Abandon the session early: detach from the event source and release
    /// the session slot without writing a sidecar.
    pub fn stop(self) {
        let _ = self.shared.transition(SessionState::Draining);
        let _ = self.shared.transition(SessionState::Finalized);
        self.teardown();
        info!(pid = self.shared.target_pid, "Tracking session stopped");
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Entry point for activity tracking.
///
/// Holds the collaborator seams and the one-slot registry. Only one session
/// may be tracking at a time; a second [`start`](Self::start) fails with
/// [`TrackerError::AlreadyTracking`] and leaves the live session untouched.
pub struct ActivityTracker {
    event_source: Arc<dyn FileEventSource>,
    probe: Arc<dyn ProcessProbe>,
    registry: Arc<SessionRegistry>,
}

impl ActivityTracker {
    /// Create a tracker bound to the process-wide session registry.
    pub fn new(event_source: Arc<dyn FileEventSource>, probe: Arc<dyn ProcessProbe>) -> Self {
        Self::with_registry(event_source, probe, registry::global())
    }

    /// Create a tracker bound to a private registry (tests).
    pub fn with_registry(
        event_source: Arc<dyn FileEventSource>,
        probe: Arc<dyn ProcessProbe>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            event_source,
            probe,
            registry,
        }
    }

    /// Start tracking `pid`.
    ///
    /// Resolves the target process before subscribing, then attaches to the
    /// event stream. Setup failures perform no partial writes and free the
    /// session slot.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::AlreadyTracking`] when a session already holds the slot
    /// - [`TrackerError::ProcessNotFound`] when `pid` does not resolve
    /// - [`TrackerError::PermissionDenied`] when the event source refuses the
    ///   subscription for lack of privilege
    #[instrument(skip(self, options))]
    pub async fn start(&self, pid: u32, options: TrackerOptions) -> Result<TrackingSession> {
        if !self.registry.try_acquire() {
            return Err(TrackerError::AlreadyTracking);
        }

        let alive = match self.probe.exists(pid).await {
            Ok(alive) => alive,
            Err(e) => {
                self.registry.release();
                return Err(TrackerError::Probe(e.to_string()));
            }
        };
        if !alive {
            self.registry.release();
            return Err(TrackerError::ProcessNotFound { pid });
        }

        let shared = Arc::new(SessionShared {
            target_pid: pid,
            track_writes: options.track_writes,
            track_reads: options.track_reads,
            ignored_prefixes: options
                .ignored_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            files: Mutex::new(TrackedFileSet::new()),
            state: Mutex::new(SessionState::Idle),
        });
        shared.transition(SessionState::Tracking)?;

        let callback: EventCallback = {
            let shared = shared.clone();
            Arc::new(move |event| shared.consume(event))
        };
        let interest = EventInterest {
            writes: options.track_writes,
            reads: options.track_reads,
        };

        let subscription = match self.event_source.subscribe(interest, callback) {
            Ok(subscription) => subscription,
            Err(e) => {
                // Setup failure: no partial writes happened, free the slot.
                let _ = shared.transition(SessionState::Failed);
                self.registry.release();
                return Err(match e {
                    BridgeError::PermissionDenied(reason) => {
                        TrackerError::PermissionDenied(reason)
                    }
                    other => TrackerError::EventSource(other.to_string()),
                });
            }
        };

        info!(pid, "Activity tracking started");
        Ok(TrackingSession {
            shared,
            subscription,
            probe: self.probe.clone(),
            registry: self.registry.clone(),
            options,
            started: Instant::now(),
            unsubscribed: AtomicBool::new(false),
            released: AtomicBool::new(false),
        })
    }
}
