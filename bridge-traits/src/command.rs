//! External Command Execution Abstraction
//!
//! The transfer tool is a black box invoked one file at a time. This module
//! defines the seam the sync engine talks to, so tests can substitute a stub
//! and the real implementation can enforce timeouts and process cleanup.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Captured result of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code. `-1` when the process was killed before exiting.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited cleanly with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Specification of one command invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program to execute (absolute path or `$PATH` name).
    pub program: String,
    /// Arguments, already split (no shell interpretation).
    pub args: Vec<String>,
    /// Hard ceiling on wall-clock runtime. The implementation must kill the
    /// process on expiry and must never block past the timeout plus a small
    /// grace period.
    pub timeout: Duration,
    /// Suppress any console window the host OS would otherwise show.
    pub hide_window: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
            hide_window: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Render the invocation for log lines.
    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

/// Command runner seam.
///
/// Implementations run the program to completion (or timeout), capture output,
/// and kill the underlying process when the timeout expires. A timeout is
/// reported as [`BridgeError::CommandTimeout`](crate::BridgeError::CommandTimeout),
/// not as a `CommandOutput`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::command::{CommandRunner, CommandSpec};
/// use std::time::Duration;
///
/// async fn version(runner: &dyn CommandRunner) -> bridge_traits::Result<String> {
///     let spec = CommandSpec::new("rclone", Duration::from_secs(10)).arg("version");
///     let output = runner.execute(spec).await?;
///     Ok(output.stdout)
/// }
/// ```
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute the command and wait for it to finish or time out.
    async fn execute(&self, spec: CommandSpec) -> Result<CommandOutput>;
}
