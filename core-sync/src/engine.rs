//! # Sync Engine
//!
//! ## Overview
//!
//! Checksum-diffed transfer of save files against one remote, driven by an
//! external transfer tool invoked one file at a time. An upload run diffs
//! candidate files against the local manifest, transfers only what changed,
//! persists the manifest after every successful transfer so an interrupted
//! run resumes where it left off, and publishes the manifest remotely last
//! as a completion marker. A download run stages files next to their final
//! destination and moves them into place with lock-tolerant retries.
//!
//! Per-file failures never abort a run; they are counted and named in the
//! run statistics. Only setup failures (missing tool, invalid remote
//! configuration) are fatal.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{ProviderKind, RemoteTarget, SyncEngine, SyncEngineConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = SyncEngine::new(config, runner, clock, roots);
//! let remote = RemoteTarget::new(ProviderKind::GoogleDrive, "saves/MyGame");
//! let result = engine
//!     .upload_run(&candidates, &manifest_dir, &remote, &CancellationToken::new())
//!     .await?;
//! println!("uploaded {} files", result.stats.files_uploaded);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge_traits::{Clock, CommandOutput, CommandRunner, CommandSpec};
use core_manifest::{
    checksum::hash_file, ChecksumManifest, FileChecksumRecord, ManifestStore, MANIFEST_FILE_NAME,
};
use core_paths::{normalize, KnownRoots};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::remote::{parse_listing, RemoteFileDescriptor, RemoteTarget};
use crate::remote_config::RemoteConfig;
use crate::resolver::DestinationResolver;
use crate::result::{RunState, SyncResult, SyncStats};

// ============================================================================
// Configuration
// ============================================================================

/// Tuning knobs for the engine. Defaults match interactive use; tests dial
/// the delays down.
#[derive(Debug, Clone)]
pub struct SyncEngineConfig {
    /// Path to the transfer tool binary.
    pub transfer_tool: PathBuf,
    /// Path to the transfer tool's remote configuration file.
    pub remote_config_path: PathBuf,
    /// Verb for single-file copies (source, destination).
    pub copy_verb: String,
    /// Verb for JSON directory listings.
    pub list_verb: String,
    /// Transfer attempts per file before recording a failure.
    pub max_attempts: u32,
    /// Fixed delay between transfer attempts.
    pub retry_delay: Duration,
    /// Wall-clock ceiling per transfer tool invocation.
    pub transfer_timeout: Duration,
    /// Attempts for delete/move of a destination file that may be held open
    /// by the running game.
    pub lock_retry_attempts: u32,
    /// Backoff base for lock retries; attempt `n` waits `base * n`.
    pub lock_retry_base_delay: Duration,
}

impl SyncEngineConfig {
    pub fn new(transfer_tool: impl Into<PathBuf>, remote_config_path: impl Into<PathBuf>) -> Self {
        Self {
            transfer_tool: transfer_tool.into(),
            remote_config_path: remote_config_path.into(),
            copy_verb: "copyto".to_string(),
            list_verb: "lsjson".to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            transfer_timeout: Duration::from_secs(300),
            lock_retry_attempts: 5,
            lock_retry_base_delay: Duration::from_millis(250),
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    pub fn with_lock_retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.lock_retry_attempts = attempts.max(1);
        self.lock_retry_base_delay = base_delay;
        self
    }
}

/// One candidate that made it through the diff.
struct PlannedUpload {
    path: PathBuf,
    name: String,
    /// Pre-computed content hash. `None` when hashing failed and the file
    /// is uploaded fail-open.
    checksum: Option<String>,
    size: u64,
}

// ============================================================================
// Engine
// ============================================================================

pub struct SyncEngine {
    config: SyncEngineConfig,
    runner: Arc<dyn CommandRunner>,
    clock: Arc<dyn Clock>,
    roots: KnownRoots,
    store: ManifestStore,
}

impl SyncEngine {
    pub fn new(
        config: SyncEngineConfig,
        runner: Arc<dyn CommandRunner>,
        clock: Arc<dyn Clock>,
        roots: KnownRoots,
    ) -> Self {
        Self {
            config,
            runner,
            clock,
            roots,
            store: ManifestStore::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------------

    /// Runs one upload pass over `candidates`.
    ///
    /// Candidates that vanished, are blacklisted, or whose checksum matches
    /// the manifest are skipped. The rest are transferred one at a time with
    /// retries; the manifest is persisted after every confirmed transfer and
    /// published remotely last. Cancellation is honoured at file boundaries.
    #[instrument(skip_all, fields(provider = %remote.provider, candidates = candidates.len()))]
    pub async fn upload_run(
        &self,
        candidates: &[PathBuf],
        manifest_dir: &Path,
        remote: &RemoteTarget,
        cancel: &CancellationToken,
    ) -> Result<SyncResult> {
        let started = Instant::now();
        let mut state = RunState::Init;
        let mut stats = SyncStats::new();

        advance(&mut state, RunState::Validating)?;
        if let Err(e) = self.validate_remote(remote).await {
            advance(&mut state, RunState::Failed)?;
            return Err(e);
        }

        advance(&mut state, RunState::Planning)?;
        let mut manifest = self.store.load(manifest_dir).await;

        if !manifest.can_uploads {
            info!("Uploads disabled for this item, skipping run");
            for path in candidates {
                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                stats.record_skip(size);
            }
            advance(&mut state, RunState::Done)?;
            return Ok(done(stats, state, started));
        }

        let plan = self.plan_uploads(candidates, &manifest, &mut stats).await;
        if plan.is_empty() {
            debug!("Nothing to upload, manifest is current");
            advance(&mut state, RunState::Done)?;
            return Ok(done(stats, state, started));
        }

        advance(&mut state, RunState::Transferring)?;
        for planned in &plan {
            if cancel.is_cancelled() {
                warn!("Upload run cancelled, manifest reflects completed transfers");
                advance(&mut state, RunState::Cancelled)?;
                break;
            }
            self.upload_one(planned, remote, manifest_dir, &mut manifest, &mut stats)
                .await;
        }

        if state == RunState::Cancelled {
            manifest.last_sync_status = "cancelled".to_string();
            self.persist(manifest_dir, &manifest).await;
            return Ok(done(stats, state, started));
        }

        advance(&mut state, RunState::Finalizing)?;
        manifest.last_sync_status = stats.status_line();
        manifest.provider = Some(remote.provider.as_str().to_string());
        self.persist(manifest_dir, &manifest).await;
        if !self.publish_manifest(manifest_dir, remote, &mut stats).await {
            // The recorded status must reflect the publish outcome, not
            // just the content transfers.
            manifest.last_sync_status = stats.status_line();
            self.persist(manifest_dir, &manifest).await;
        }

        advance(&mut state, RunState::Done)?;
        info!(
            uploaded = stats.files_uploaded,
            skipped = stats.files_skipped,
            failed = stats.files_failed,
            bytes = stats.bytes_uploaded,
            "Upload run finished"
        );
        Ok(done(stats, state, started))
    }

    /// Diffs candidates against the manifest. Hash errors are fail-open:
    /// the file is scheduled for upload rather than silently skipped.
    async fn plan_uploads(
        &self,
        candidates: &[PathBuf],
        manifest: &ChecksumManifest,
        stats: &mut SyncStats,
    ) -> Vec<PlannedUpload> {
        let mut plan = Vec::new();
        for path in candidates {
            let name = match path.file_name() {
                Some(n) => n.to_string_lossy().to_string(),
                None => {
                    warn!(path = %path.display(), "Candidate has no file name, skipping");
                    stats.record_skip(0);
                    continue;
                }
            };
            if manifest.is_blacklisted(&name) {
                debug!(file = %name, "Blacklisted, skipping");
                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                stats.record_skip(size);
                continue;
            }
            if !path.exists() {
                debug!(file = %name, "Vanished before sync, skipping");
                // Best-known size is whatever the last confirmed transfer
                // recorded.
                let size = manifest.record(&name).map(|r| r.file_size).unwrap_or(0);
                stats.record_skip(size);
                continue;
            }
            match hash_file(path).await {
                Ok((checksum, size)) => {
                    if manifest.record(&name).map(|r| r.checksum.as_str()) == Some(&checksum) {
                        debug!(file = %name, "Checksum unchanged, skipping");
                        stats.record_skip(size);
                        continue;
                    }
                    plan.push(PlannedUpload {
                        path: path.clone(),
                        name,
                        checksum: Some(checksum),
                        size,
                    });
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "Cannot hash candidate, uploading anyway");
                    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                    plan.push(PlannedUpload {
                        path: path.clone(),
                        name,
                        checksum: None,
                        size,
                    });
                }
            }
        }
        plan
    }

    async fn upload_one(
        &self,
        planned: &PlannedUpload,
        remote: &RemoteTarget,
        manifest_dir: &Path,
        manifest: &mut ChecksumManifest,
        stats: &mut SyncStats,
    ) {
        let spec = self
            .transfer_spec(&self.config.copy_verb)
            .arg(planned.path.to_string_lossy())
            .arg(remote.file_spec(&planned.name));

        match self.transfer_with_retry(&spec, &planned.name).await {
            Ok(_) => {
                stats.record_upload(planned.size);
                // A record's checksum must be the hash of the bytes that
                // were actually transferred. If planning could not hash the
                // file, try once more now; without a hash no record is
                // written and the next run re-uploads.
                let checksum = match &planned.checksum {
                    Some(sum) => Some(sum.clone()),
                    None => match hash_file(&planned.path).await {
                        Ok((sum, _)) => Some(sum),
                        Err(e) => {
                            warn!(file = %planned.name, error = %e, "Uploaded without a manifest record");
                            None
                        }
                    },
                };
                if let Some(checksum) = checksum {
                    manifest.upsert(
                        &planned.name,
                        FileChecksumRecord {
                            checksum,
                            last_upload: self.clock.now(),
                            path: normalize(&planned.path, &self.roots),
                            file_size: planned.size,
                        },
                    );
                    self.persist(manifest_dir, manifest).await;
                }
            }
            Err(e) => {
                warn!(file = %planned.name, error = %e, "Upload failed");
                stats.record_failure(planned.name.clone(), planned.size);
            }
        }
    }

    /// Publishes the local manifest to the remote as the completion marker.
    /// Not counted as an uploaded file; a failure is still a recorded one.
    /// Returns whether publication succeeded.
    async fn publish_manifest(
        &self,
        manifest_dir: &Path,
        remote: &RemoteTarget,
        stats: &mut SyncStats,
    ) -> bool {
        let local = ManifestStore::manifest_path(manifest_dir);
        let spec = self
            .transfer_spec(&self.config.copy_verb)
            .arg(local.to_string_lossy())
            .arg(remote.file_spec(MANIFEST_FILE_NAME));
        if let Err(e) = self.transfer_with_retry(&spec, MANIFEST_FILE_NAME).await {
            warn!(error = %e, "Manifest publish failed, remote state is stale");
            let size = std::fs::metadata(&local).map(|m| m.len()).unwrap_or(0);
            stats.record_failure(MANIFEST_FILE_NAME, size);
            return false;
        }
        true
    }

    // ------------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------------

    /// Restores the files named by `remote_manifest` onto this machine.
    ///
    /// Each file is fetched into `staging_dir` first, then moved into the
    /// destination the resolver computes. Existing destinations are skipped
    /// unless `overwrite` is set; deletes and moves tolerate files briefly
    /// held open by retrying with increasing backoff.
    #[instrument(skip_all, fields(provider = %remote.provider, files = remote_manifest.files.len(), overwrite = overwrite))]
    pub async fn download_run(
        &self,
        remote_manifest: &ChecksumManifest,
        staging_dir: &Path,
        resolver: &DestinationResolver,
        overwrite: bool,
        remote: &RemoteTarget,
        cancel: &CancellationToken,
    ) -> Result<SyncResult> {
        let started = Instant::now();
        let mut state = RunState::Init;
        let mut stats = SyncStats::new();

        advance(&mut state, RunState::Validating)?;
        if let Err(e) = self.validate_remote(remote).await {
            advance(&mut state, RunState::Failed)?;
            return Err(e);
        }

        advance(&mut state, RunState::Planning)?;
        tokio::fs::create_dir_all(staging_dir).await?;
        if remote_manifest.files.is_empty() {
            advance(&mut state, RunState::Done)?;
            return Ok(done(stats, state, started));
        }

        advance(&mut state, RunState::Transferring)?;
        for (name, record) in &remote_manifest.files {
            if cancel.is_cancelled() {
                warn!("Download run cancelled");
                advance(&mut state, RunState::Cancelled)?;
                break;
            }
            self.download_one(
                name, record, staging_dir, resolver, overwrite, remote, &mut stats,
            )
            .await;
        }

        if state != RunState::Cancelled {
            advance(&mut state, RunState::Finalizing)?;
            advance(&mut state, RunState::Done)?;
        }
        info!(
            downloaded = stats.files_downloaded,
            skipped = stats.files_skipped,
            failed = stats.files_failed,
            "Download run finished"
        );
        Ok(done(stats, state, started))
    }

    async fn download_one(
        &self,
        name: &str,
        record: &FileChecksumRecord,
        staging_dir: &Path,
        resolver: &DestinationResolver,
        overwrite: bool,
        remote: &RemoteTarget,
        stats: &mut SyncStats,
    ) {
        let destination = match resolver.resolve(name, record) {
            Ok(d) => d,
            Err(e) => {
                warn!(file = %name, error = %e, "Cannot resolve destination");
                stats.record_failure(name, record.file_size);
                return;
            }
        };

        let staged = staging_dir.join(Path::new(name));
        if let Some(parent) = staged.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(file = %name, error = %e, "Cannot create staging directory");
                stats.record_failure(name, record.file_size);
                return;
            }
        }

        let spec = self
            .transfer_spec(&self.config.copy_verb)
            .arg(remote.file_spec(name))
            .arg(staged.to_string_lossy());
        if let Err(e) = self.transfer_with_retry(&spec, name).await {
            warn!(file = %name, error = %e, "Download failed");
            stats.record_failure(name, record.file_size);
            return;
        }

        if destination.exists() {
            if !overwrite {
                debug!(file = %name, "Destination exists, skipping");
                let _ = tokio::fs::remove_file(&staged).await;
                stats.record_skip(record.file_size);
                return;
            }
            if let Err(e) = self.remove_with_retry(&destination).await {
                warn!(file = %name, error = %e, "Cannot replace destination, it stayed locked");
                stats.record_failure(name, record.file_size);
                return;
            }
        }

        if let Some(parent) = destination.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(file = %name, error = %e, "Cannot create destination directory");
                stats.record_failure(name, record.file_size);
                return;
            }
        }

        if let Err(e) = self.move_with_retry(&staged, &destination).await {
            warn!(file = %name, error = %e, "Cannot move staged file into place");
            stats.record_failure(name, record.file_size);
            return;
        }

        // The move must be observable before the file counts as restored.
        match tokio::fs::metadata(&destination).await {
            Ok(_) => stats.record_download(record.file_size),
            Err(e) => {
                warn!(file = %name, error = %e, "Destination missing after move");
                stats.record_failure(name, record.file_size);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Remote queries
    // ------------------------------------------------------------------------

    /// Lists the files currently on the remote.
    pub async fn list_remote(&self, remote: &RemoteTarget) -> Result<Vec<RemoteFileDescriptor>> {
        let spec = self
            .transfer_spec(&self.config.list_verb)
            .arg(remote.dir_spec());
        let output = self.transfer_with_retry(&spec, "listing").await?;
        parse_listing(&output.stdout)
    }

    /// Fetches the remote manifest into `staging_dir` and parses it.
    /// An absent or unreadable remote manifest degrades to the default,
    /// matching local load semantics.
    pub async fn fetch_remote_manifest(
        &self,
        remote: &RemoteTarget,
        staging_dir: &Path,
    ) -> Result<ChecksumManifest> {
        tokio::fs::create_dir_all(staging_dir).await?;
        let staged = ManifestStore::manifest_path(staging_dir);
        let spec = self
            .transfer_spec(&self.config.copy_verb)
            .arg(remote.file_spec(MANIFEST_FILE_NAME))
            .arg(staged.to_string_lossy());
        if let Err(e) = self.transfer_with_retry(&spec, MANIFEST_FILE_NAME).await {
            warn!(error = %e, "Remote manifest fetch failed, treating remote as empty");
        }
        Ok(self.store.load(staging_dir).await)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn validate_remote(&self, remote: &RemoteTarget) -> Result<()> {
        if !self.config.transfer_tool.exists() {
            return Err(SyncError::setup(format!(
                "transfer tool not found at {}",
                self.config.transfer_tool.display()
            )));
        }
        let remote_config = RemoteConfig::load(&self.config.remote_config_path).await?;
        remote_config.validate_provider(remote.provider)
    }

    fn transfer_spec(&self, verb: &str) -> CommandSpec {
        CommandSpec::new(
            self.config.transfer_tool.to_string_lossy(),
            self.config.transfer_timeout,
        )
        .arg(verb)
        .arg("--config")
        .arg(self.config.remote_config_path.to_string_lossy())
    }

    /// Runs one transfer tool invocation with the configured retry bound.
    /// Every failure mode (non-zero exit, timeout, spawn error) is retried
    /// the same way with a fixed delay between attempts.
    async fn transfer_with_retry(&self, spec: &CommandSpec, label: &str) -> Result<CommandOutput> {
        let attempts = self.config.max_attempts;
        let mut last_reason = String::new();
        for attempt in 1..=attempts {
            match self.runner.execute(spec.clone()).await {
                Ok(output) if output.success() => {
                    if attempt > 1 {
                        debug!(file = %label, attempt, "Transfer succeeded after retry");
                    }
                    return Ok(output);
                }
                Ok(output) => {
                    last_reason =
                        format!("exit code {}: {}", output.exit_code, output.stderr.trim());
                }
                Err(e) => last_reason = e.to_string(),
            }
            if attempt < attempts {
                warn!(file = %label, attempt, reason = %last_reason, "Transfer attempt failed, retrying");
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }
        Err(SyncError::TransferFailed {
            attempts,
            reason: last_reason,
        })
    }

    async fn remove_with_retry(&self, path: &Path) -> Result<()> {
        let attempts = self.config.lock_retry_attempts;
        for attempt in 1..=attempts {
            match tokio::fs::remove_file(path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) if attempt < attempts => {
                    let delay = self.config.lock_retry_base_delay * attempt;
                    debug!(path = %path.display(), attempt, error = %e, "Delete blocked, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Rename with copy-and-delete fallback (staging may sit on another
    /// filesystem), retried with increasing backoff for files the game
    /// still holds open.
    async fn move_with_retry(&self, from: &Path, to: &Path) -> Result<()> {
        let attempts = self.config.lock_retry_attempts;
        let mut last_err: Option<std::io::Error> = None;
        for attempt in 1..=attempts {
            match tokio::fs::rename(from, to).await {
                Ok(()) => return Ok(()),
                Err(rename_err) => match tokio::fs::copy(from, to).await {
                    Ok(_) => {
                        let _ = tokio::fs::remove_file(from).await;
                        return Ok(());
                    }
                    Err(copy_err) => {
                        debug!(
                            path = %to.display(),
                            attempt,
                            rename_error = %rename_err,
                            copy_error = %copy_err,
                            "Move blocked, backing off"
                        );
                        last_err = Some(copy_err);
                    }
                },
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.lock_retry_base_delay * attempt).await;
            }
        }
        Err(last_err
            .unwrap_or_else(|| std::io::Error::other("move failed"))
            .into())
    }

    async fn persist(&self, manifest_dir: &Path, manifest: &ChecksumManifest) {
        if let Err(e) = self.store.save(manifest_dir, manifest).await {
            warn!(error = %e, "Manifest persist failed, resumability degraded");
        }
    }
}

fn advance(state: &mut RunState, to: RunState) -> Result<()> {
    RunState::validate_transition(*state, to)?;
    *state = to;
    Ok(())
}

fn done(stats: SyncStats, state: RunState, started: Instant) -> SyncResult {
    SyncResult {
        stats,
        final_state: state,
        elapsed: started.elapsed(),
    }
}
