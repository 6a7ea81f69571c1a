//! Process Probe Implementation
//!
//! Poll-based liveness checks. On Linux a process's existence is visible as
//! `/proc/<pid>`; elsewhere the probe reports the capability as unavailable
//! and callers must inject a platform-appropriate implementation.

use async_trait::async_trait;
use bridge_traits::{error::Result, process::ProcessProbe};
use std::time::{Duration, Instant};
use tracing::debug;

/// How often the exit wait re-checks liveness.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// `/proc`-backed process probe.
#[derive(Debug, Clone, Default)]
pub struct ProcProcessProbe;

impl ProcProcessProbe {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "linux")]
    fn is_alive(pid: u32) -> Result<bool> {
        Ok(std::path::Path::new("/proc")
            .join(pid.to_string())
            .exists())
    }

    #[cfg(not(target_os = "linux"))]
    fn is_alive(_pid: u32) -> Result<bool> {
        Err(bridge_traits::BridgeError::NotAvailable(
            "process probing requires a platform-specific implementation".to_string(),
        ))
    }
}

#[async_trait]
impl ProcessProbe for ProcProcessProbe {
    async fn exists(&self, pid: u32) -> Result<bool> {
        Self::is_alive(pid)
    }

    async fn wait_for_exit(&self, pid: u32, max_wait: Duration) -> Result<bool> {
        let started = Instant::now();
        loop {
            if !Self::is_alive(pid)? {
                debug!(pid, "Process exited");
                return Ok(true);
            }
            if started.elapsed() >= max_wait {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
