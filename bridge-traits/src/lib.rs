//! # Collaborator Bridge Traits
//!
//! Seams between the sync core and its external collaborators.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and everything the
//! system treats as an outside party: the command-line transfer tool, the
//! kernel-level file I/O event stream, process inspection, and the system
//! clock. Each trait is a capability the core requires but does not own, so
//! tests can substitute scripted stubs and production can wire the desktop
//! implementations from `bridge-desktop`.
//!
//! ## Traits
//!
//! - [`CommandRunner`](command::CommandRunner) - Run the external transfer
//!   tool with a hard timeout and guaranteed process cleanup
//! - [`FileEventSource`](events::FileEventSource) - Subscribable stream of
//!   per-process file I/O events with explicit, idempotent teardown
//! - [`ProcessProbe`](process::ProcessProbe) - Target-process resolution and
//!   cooperative exit waiting
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All traits report failures through [`BridgeError`]. Higher layers map
//! these into their own error taxonomies (setup failures versus transient,
//! retryable transfer failures).

pub mod command;
pub mod error;
pub mod events;
pub mod process;
pub mod time;

pub use command::{CommandOutput, CommandRunner, CommandSpec};
pub use error::{BridgeError, Result};
pub use events::{
    EventCallback, EventInterest, EventSubscription, FileEventSource, FileIoEvent, FileOperation,
};
pub use process::ProcessProbe;
pub use time::{Clock, SystemClock};
