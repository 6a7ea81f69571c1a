use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Fatal preflight failure: missing transfer tool, invalid or missing
    /// remote configuration, unknown provider. Aborts the run before any
    /// transfer.
    #[error("Setup failure: {reason}")]
    Setup { reason: String },

    #[error("Unknown provider id: {0}")]
    UnknownProvider(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Per-file transfer failure after the retry bound was exhausted.
    /// Recorded in the run stats, never aborts the run.
    #[error("Transfer failed after {attempts} attempts: {reason}")]
    TransferFailed { attempts: u32, reason: String },

    /// Destination path could not be resolved to an absolute location.
    #[error("Path resolution failed for {name}: {reason}")]
    PathResolution { name: String, reason: String },

    #[error("Manifest error: {0}")]
    Manifest(#[from] core_manifest::ManifestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn setup(reason: impl Into<String>) -> Self {
        Self::Setup {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
