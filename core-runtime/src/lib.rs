//! # Core Runtime
//!
//! Shared runtime infrastructure for the save-sync workspace: logging and
//! tracing initialization.
//!
//! ## Modules
//!
//! - [`logging`] - `tracing-subscriber` setup with format and filter control

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
