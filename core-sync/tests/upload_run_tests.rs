//! Upload run behavior: checksum diffing, retry bounds, resumability, and
//! manifest publication ordering.

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{CommandOutput, CommandRunner, CommandSpec};
use core_manifest::{checksum::hash_file, ManifestStore, MANIFEST_FILE_NAME};
use core_paths::KnownRoots;
use core_sync::{ProviderKind, RemoteTarget, RunState, SyncEngine, SyncEngineConfig, SyncError};
use mockall::mock;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{fixed_clock, test_engine, write_tool_and_config, FakeRemoteRunner};

fn remote() -> RemoteTarget {
    RemoteTarget::new(ProviderKind::GoogleDrive, "saves/TestGame")
}

fn write_saves(dir: &TempDir, names: &[(&str, &str)]) -> Vec<PathBuf> {
    let save_dir = dir.path().join("saves");
    fs::create_dir_all(&save_dir).unwrap();
    names
        .iter()
        .map(|(name, content)| {
            let path = save_dir.join(name);
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn first_run_uploads_everything() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "alpha"), ("b.sav", "bravo")]);
    let manifest_dir = dir.path().join("meta");

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.final_state, RunState::Done);
    assert_eq!(result.stats.files_uploaded, 2);
    assert_eq!(result.stats.files_failed, 0);
    assert_eq!(
        runner.remote_bytes("gdrive:saves/TestGame/a.sav").unwrap(),
        b"alpha"
    );
    assert_eq!(
        runner.remote_bytes("gdrive:saves/TestGame/b.sav").unwrap(),
        b"bravo"
    );
}

#[tokio::test]
async fn unchanged_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "alpha"), ("b.sav", "bravo")]);
    let manifest_dir = dir.path().join("meta");
    let cancel = CancellationToken::new();

    engine
        .upload_run(&candidates, &manifest_dir, &remote(), &cancel)
        .await
        .unwrap();
    let calls_after_first = runner.total_calls();

    let second = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &cancel)
        .await
        .unwrap();

    assert_eq!(second.stats.files_uploaded, 0);
    assert_eq!(second.stats.files_skipped, 2);
    // Skipped bytes cover both unchanged files ("alpha" + "bravo").
    assert_eq!(second.stats.bytes_skipped, 10);
    assert_eq!(second.stats.bytes_uploaded, 0);
    // No transfer tool invocations at all the second time around.
    assert_eq!(runner.total_calls(), calls_after_first);
}

#[tokio::test]
async fn only_the_modified_file_is_reuploaded() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(
        &dir,
        &[("a.sav", "alpha"), ("b.sav", "bravo"), ("c.sav", "charlie")],
    );
    let manifest_dir = dir.path().join("meta");
    let cancel = CancellationToken::new();

    engine
        .upload_run(&candidates, &manifest_dir, &remote(), &cancel)
        .await
        .unwrap();

    // b.sav changes in place, c.sav vanishes before the next run.
    fs::write(&candidates[1], "bravo v2").unwrap();
    fs::remove_file(&candidates[2]).unwrap();

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &cancel)
        .await
        .unwrap();

    assert_eq!(result.stats.files_uploaded, 1);
    assert_eq!(result.stats.files_skipped, 2);
    assert_eq!(result.stats.files_failed, 0);
    assert_eq!(result.stats.bytes_uploaded, "bravo v2".len() as u64);
    // Unchanged "alpha" plus the vanished file's last recorded size.
    assert_eq!(
        result.stats.bytes_skipped,
        ("alpha".len() + "charlie".len()) as u64
    );
    assert_eq!(result.stats.bytes_failed, 0);
    assert_eq!(
        runner.remote_bytes("gdrive:saves/TestGame/b.sav").unwrap(),
        b"bravo v2"
    );
}

#[tokio::test]
async fn manifest_reflects_uploaded_bytes_and_is_published_last() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("slot0.sav", "state")]);
    let manifest_dir = dir.path().join("meta");

    engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    let manifest = ManifestStore::new().load(&manifest_dir).await;
    let record = manifest.record("slot0.sav").unwrap();
    let (expected, size) = hash_file(&candidates[0]).await.unwrap();
    assert_eq!(record.checksum, expected);
    assert_eq!(record.file_size, size);
    assert_eq!(record.last_upload, fixed_clock().0);
    assert_eq!(manifest.last_sync_status, "ok");
    assert_eq!(manifest.provider.as_deref(), Some("gdrive"));

    // The manifest is the completion marker: last command, present remotely.
    let calls = runner.calls.lock().unwrap();
    assert!(calls.last().unwrap().contains(MANIFEST_FILE_NAME));
    drop(calls);
    let published = runner
        .remote_bytes("gdrive:saves/TestGame/manifest.json")
        .unwrap();
    let remote_manifest: core_manifest::ChecksumManifest =
        serde_json::from_slice(&published).unwrap();
    assert!(remote_manifest.record("slot0.sav").is_some());
}

#[tokio::test]
async fn failed_file_is_recorded_and_absent_from_manifest() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "alpha"), ("doomed.sav", "x")]);
    let manifest_dir = dir.path().join("meta");
    runner.fail_next("doomed.sav", 3);

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.final_state, RunState::Done);
    assert_eq!(result.stats.files_uploaded, 1);
    assert_eq!(result.stats.files_failed, 1);
    assert_eq!(result.stats.failed_files, vec!["doomed.sav"]);

    // Resumability: the completed transfer is durable, the failed one has
    // no record, so the next run picks it up again.
    let manifest = ManifestStore::new().load(&manifest_dir).await;
    assert!(manifest.record("a.sav").is_some());
    assert!(manifest.record("doomed.sav").is_none());
    assert_eq!(manifest.last_sync_status, "1 failed");

    let retry = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(retry.stats.files_uploaded, 1);
    assert_eq!(retry.stats.files_skipped, 1);
    assert_eq!(retry.stats.files_failed, 0);
}

#[tokio::test]
async fn failed_publication_is_reflected_in_the_stored_status() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "alpha")]);
    let manifest_dir = dir.path().join("meta");
    runner.fail_next(MANIFEST_FILE_NAME, 3);

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.final_state, RunState::Done);
    assert_eq!(result.stats.files_uploaded, 1);
    assert_eq!(result.stats.files_failed, 1);
    assert_eq!(result.stats.failed_files, vec![MANIFEST_FILE_NAME]);
    assert!(result.stats.bytes_failed > 0);

    // The durable status must account for the publication failure, not
    // just the content transfers that preceded it.
    let manifest = ManifestStore::new().load(&manifest_dir).await;
    assert_eq!(manifest.last_sync_status, "1 failed");
    assert!(manifest.record("a.sav").is_some());
}

mock! {
    Runner {}

    #[async_trait]
    impl CommandRunner for Runner {
        async fn execute(&self, spec: CommandSpec) -> bridge_traits::Result<CommandOutput>;
    }
}

fn failure_output() -> CommandOutput {
    CommandOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: "permanent failure".to_string(),
    }
}

#[tokio::test]
async fn retry_bound_is_exactly_three_attempts() {
    let dir = TempDir::new().unwrap();
    let (tool, config_path) = write_tool_and_config(dir.path());
    let candidates = write_saves(&dir, &[("stuck.sav", "x")]);
    let manifest_dir = dir.path().join("meta");

    let mut mock = MockRunner::new();
    mock.expect_execute()
        .withf(|spec| spec.display().contains("stuck.sav"))
        .times(3)
        .returning(|_| Ok(failure_output()));
    mock.expect_execute()
        .withf(|spec| spec.display().contains(MANIFEST_FILE_NAME))
        .times(3)
        .returning(|_| Ok(failure_output()));

    let config = SyncEngineConfig::new(tool, config_path)
        .with_retry_delay(Duration::from_millis(1));
    let engine = SyncEngine::new(config, Arc::new(mock), fixed_clock(), KnownRoots::new());

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.stats.files_failed, 2);
    assert!(result
        .stats
        .failed_files
        .contains(&"stuck.sav".to_string()));
}

#[tokio::test]
async fn transient_failure_succeeds_within_the_bound() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("flaky.sav", "x")]);
    let manifest_dir = dir.path().join("meta");
    runner.fail_next("flaky.sav", 2);

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.stats.files_uploaded, 1);
    assert_eq!(result.stats.files_failed, 0);
    assert_eq!(runner.calls_matching("flaky.sav"), 3);
}

#[tokio::test]
async fn blacklisted_files_are_never_transferred() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("keep.sav", "x"), ("junk.tmp", "y")]);
    let manifest_dir = dir.path().join("meta");

    let mut manifest = core_manifest::ChecksumManifest::default();
    manifest.blacklist.insert(
        "junk.tmp".to_string(),
        core_manifest::FileChecksumRecord {
            checksum: String::new(),
            last_upload: fixed_clock().0,
            path: String::new(),
            file_size: 0,
        },
    );
    ManifestStore::new()
        .save(&manifest_dir, &manifest)
        .await
        .unwrap();

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.stats.files_uploaded, 1);
    assert_eq!(result.stats.files_skipped, 1);
    assert_eq!(runner.calls_matching("junk.tmp"), 0);
}

#[tokio::test]
async fn uploads_disabled_skips_the_whole_run() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "x")]);
    let manifest_dir = dir.path().join("meta");

    let mut manifest = core_manifest::ChecksumManifest::default();
    manifest.can_uploads = false;
    ManifestStore::new()
        .save(&manifest_dir, &manifest)
        .await
        .unwrap();

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.final_state, RunState::Done);
    assert_eq!(result.stats.files_uploaded, 0);
    assert_eq!(result.stats.files_skipped, 1);
    assert_eq!(runner.total_calls(), 0);
}

#[tokio::test]
async fn cancelled_token_stops_before_any_transfer() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "x"), ("b.sav", "y")]);
    let manifest_dir = dir.path().join("meta");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &cancel)
        .await
        .unwrap();

    assert_eq!(result.final_state, RunState::Cancelled);
    assert_eq!(result.stats.files_uploaded, 0);
    // No manifest publication on a cancelled run.
    assert_eq!(runner.calls_matching(MANIFEST_FILE_NAME), 0);
    let manifest = ManifestStore::new().load(&manifest_dir).await;
    assert_eq!(manifest.last_sync_status, "cancelled");
}

#[tokio::test]
async fn missing_transfer_tool_is_a_setup_error() {
    let dir = TempDir::new().unwrap();
    let (_, config_path) = write_tool_and_config(dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "x")]);
    let manifest_dir = dir.path().join("meta");

    let config = SyncEngineConfig::new(dir.path().join("no-such-tool"), config_path);
    let engine = SyncEngine::new(
        config,
        FakeRemoteRunner::new(),
        fixed_clock(),
        KnownRoots::new(),
    );

    let err = engine
        .upload_run(&candidates, &manifest_dir, &remote(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Setup { .. }));
}

#[tokio::test]
async fn unconfigured_provider_is_a_setup_error() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRemoteRunner::new();
    let engine = test_engine(runner.clone(), dir.path());
    let candidates = write_saves(&dir, &[("a.sav", "x")]);
    let manifest_dir = dir.path().join("meta");
    let dropbox = RemoteTarget::new(ProviderKind::Dropbox, "saves/TestGame");

    let err = engine
        .upload_run(&candidates, &manifest_dir, &dropbox, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Setup { .. }));
    assert_eq!(runner.total_calls(), 0);
}
