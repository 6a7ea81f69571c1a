use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Process {pid} not found")]
    ProcessNotFound { pid: u32 },

    #[error("An activity tracking session is already running")]
    AlreadyTracking,

    #[error("Insufficient privilege to attach event source: {0}")]
    PermissionDenied(String),

    #[error("Event source error: {0}")]
    EventSource(String),

    #[error("Process probe error: {0}")]
    Probe(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Failed to write tracked-file sidecar: {0}")]
    Sidecar(#[from] std::io::Error),

    #[error("Failed to encode tracked-file sidecar: {0}")]
    SidecarEncode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
