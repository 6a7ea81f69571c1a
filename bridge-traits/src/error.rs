use thiserror::Error;

/// Errors surfaced by bridge implementations.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command timed out after {timeout_secs} seconds: {command}")]
    CommandTimeout { command: String, timeout_secs: u64 },

    #[error("Failed to spawn command {command}: {reason}")]
    CommandSpawn { command: String, reason: String },

    #[error("Process {pid} not found")]
    ProcessNotFound { pid: u32 },

    #[error("Event source error: {0}")]
    EventSource(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capability not available: {0}")]
    NotAvailable(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
