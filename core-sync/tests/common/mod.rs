#![allow(dead_code)]

//! Shared test collaborators: an in-memory fake of the transfer tool and a
//! fixed clock.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{BridgeError, Clock, CommandOutput, CommandRunner, CommandSpec};
use chrono::{DateTime, TimeZone, Utc};
use core_paths::KnownRoots;
use core_sync::{SyncEngine, SyncEngineConfig};

/// Fake transfer tool. `copyto` moves bytes between the local filesystem and
/// an in-memory remote keyed by path spec; `lsjson` lists the remote.
/// Failures can be scripted per command substring, consumed one per call.
pub struct FakeRemoteRunner {
    pub calls: Mutex<Vec<String>>,
    pub remote: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_counts: Mutex<BTreeMap<String, u32>>,
}

impl FakeRemoteRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            remote: Mutex::new(BTreeMap::new()),
            fail_counts: Mutex::new(BTreeMap::new()),
        })
    }

    /// The next `times` commands whose rendered invocation contains
    /// `substring` fail with exit code 1.
    pub fn fail_next(&self, substring: &str, times: u32) {
        self.fail_counts
            .lock()
            .unwrap()
            .insert(substring.to_string(), times);
    }

    pub fn calls_matching(&self, substring: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(substring))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn put_remote(&self, spec: &str, bytes: &[u8]) {
        self.remote
            .lock()
            .unwrap()
            .insert(spec.to_string(), bytes.to_vec());
    }

    pub fn remote_bytes(&self, spec: &str) -> Option<Vec<u8>> {
        self.remote.lock().unwrap().get(spec).cloned()
    }

    fn scripted_failure(&self, rendered: &str) -> bool {
        let mut fails = self.fail_counts.lock().unwrap();
        for (key, remaining) in fails.iter_mut() {
            if *remaining > 0 && rendered.contains(key.as_str()) {
                *remaining -= 1;
                return true;
            }
        }
        false
    }
}

fn exit(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl CommandRunner for FakeRemoteRunner {
    async fn execute(&self, spec: CommandSpec) -> bridge_traits::Result<CommandOutput> {
        let rendered = spec.display();
        self.calls.lock().unwrap().push(rendered.clone());

        if self.scripted_failure(&rendered) {
            return Ok(exit(1, "scripted failure"));
        }

        match spec.args.first().map(String::as_str) {
            Some("copyto") => {
                let src = spec.args[3].clone();
                let dst = spec.args[4].clone();
                if dst.contains(':') {
                    let bytes = std::fs::read(&src).map_err(BridgeError::from)?;
                    self.remote.lock().unwrap().insert(dst, bytes);
                    Ok(exit(0, ""))
                } else {
                    let remote = self.remote.lock().unwrap();
                    match remote.get(&src) {
                        Some(bytes) => {
                            if let Some(parent) = Path::new(&dst).parent() {
                                std::fs::create_dir_all(parent).map_err(BridgeError::from)?;
                            }
                            std::fs::write(&dst, bytes).map_err(BridgeError::from)?;
                            Ok(exit(0, ""))
                        }
                        None => Ok(exit(1, "object not found")),
                    }
                }
            }
            Some("lsjson") => {
                let prefix = format!("{}/", spec.args[3]);
                let remote = self.remote.lock().unwrap();
                let entries: Vec<serde_json::Value> = remote
                    .iter()
                    .filter(|(key, _)| key.starts_with(&prefix))
                    .map(|(key, bytes)| {
                        serde_json::json!({
                            "Name": &key[prefix.len()..],
                            "Size": bytes.len(),
                            "ModTime": "2026-02-01T10:00:00Z",
                            "IsDir": false,
                        })
                    })
                    .collect();
                Ok(CommandOutput {
                    exit_code: 0,
                    stdout: serde_json::to_string(&entries).unwrap(),
                    stderr: String::new(),
                })
            }
            _ => Ok(exit(2, "unknown verb")),
        }
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()))
}

/// Writes a dummy transfer tool binary and a valid remote configuration
/// under `dir`, returning their paths.
pub fn write_tool_and_config(dir: &Path) -> (PathBuf, PathBuf) {
    let tool = dir.join("rclone");
    std::fs::write(&tool, "#!/bin/sh\n").unwrap();
    let config = dir.join("rclone.conf");
    std::fs::write(
        &config,
        concat!(
            "[gdrive]\n",
            "type = drive\n",
            "token = {\"access_token\":\"test\"}\n",
            "\n",
            "[webdav]\n",
            "type = webdav\n",
            "url = https://dav.example.com\n",
        ),
    )
    .unwrap();
    (tool, config)
}

/// Engine with millisecond delays so retry paths run fast.
pub fn test_engine(runner: Arc<FakeRemoteRunner>, dir: &Path) -> SyncEngine {
    let (tool, config_path) = write_tool_and_config(dir);
    let config = SyncEngineConfig::new(tool, config_path)
        .with_retry_delay(Duration::from_millis(1))
        .with_lock_retry(5, Duration::from_millis(1));
    SyncEngine::new(config, runner, fixed_clock(), KnownRoots::new())
}
