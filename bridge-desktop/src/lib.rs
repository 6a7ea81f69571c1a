//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms.
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the collaborator
//! seams defined in `bridge-traits`:
//! - [`ShellCommandRunner`] - transfer-tool execution via `tokio::process`
//!   with an enforced timeout and guaranteed process cleanup
//! - [`ProcProcessProbe`] - poll-based process liveness and exit waiting
//!
//! The kernel event source deliberately has no implementation here: it is an
//! external collaborator wired in by the host, keyed by process id, file
//! path, and operation type.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ProcProcessProbe, ShellCommandRunner};
//! use std::sync::Arc;
//!
//! let runner = Arc::new(ShellCommandRunner::new());
//! let probe = Arc::new(ProcProcessProbe::new());
//! ```

mod command;
mod process;

pub use command::ShellCommandRunner;
pub use process::ProcProcessProbe;
pub use bridge_traits::SystemClock;
