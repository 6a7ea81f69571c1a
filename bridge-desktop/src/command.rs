//! Command Runner Implementation using tokio::process

use async_trait::async_trait;
use bridge_traits::{
    command::{CommandOutput, CommandRunner, CommandSpec},
    error::{BridgeError, Result},
};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extra time granted for the kill to take effect after a timeout fires.
const KILL_GRACE: std::time::Duration = std::time::Duration::from_millis(100);

/// Tokio-based command runner.
///
/// Spawns the program with piped stdio, waits up to `spec.timeout`, and
/// kills the child on expiry. The child is also configured with
/// `kill_on_drop` so an abandoned future cannot leak a process.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn execute(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let rendered = spec.display();
        debug!(command = %rendered, timeout_secs = spec.timeout.as_secs(), "Executing command");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        if spec.hide_window {
            // CREATE_NO_WINDOW
            command.creation_flags(0x0800_0000);
        }
        #[cfg(not(windows))]
        let _ = spec.hide_window;

        let child = command.spawn().map_err(|e| BridgeError::CommandSpawn {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

        // Dropping the wait future on timeout kills the child via
        // kill_on_drop; the grace window lets the kill land before we return.
        match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(BridgeError::Io(e)),
            Err(_) => {
                warn!(command = %rendered, "Command timed out, killing process");
                tokio::time::sleep(KILL_GRACE).await;
                Err(BridgeError::CommandTimeout {
                    command: rendered,
                    timeout_secs: spec.timeout.as_secs(),
                })
            }
        }
    }
}
