//! # Path Portability Codec
//!
//! Converts absolute paths to and from a machine-independent symbolic form.
//!
//! ## Overview
//!
//! A save recorded on one machine or user account must restore correctly on
//! another. This crate provides:
//! - [`KnownRoots`] - a prioritized table of absolute root directories
//!   (user profile, roaming/local app data, config, the monitored item's
//!   install directory) mapped to placeholder tokens
//! - [`normalize`] / [`expand`] - longest-prefix-wins substitution between
//!   absolute and portable forms, deterministic for a fixed root set
//! - [`remap_user`] - rewrite of the user-account segment of a home path
//!
//! ## Usage
//!
//! ```ignore
//! use core_paths::{normalize, expand, KnownRoots};
//! use std::path::Path;
//!
//! let roots = KnownRoots::discover(Some(Path::new("/opt/game")));
//! let portable = normalize(Path::new("/opt/game/saves/slot0.sav"), &roots);
//! let restored = expand(&portable, &roots);
//! ```

mod codec;
mod roots;

pub use codec::{expand, is_portable, normalize, remap_user};
pub use roots::{
    KnownRoots, RootMapping, TOKEN_CONFIG, TOKEN_DATA, TOKEN_DATA_LOCAL, TOKEN_HOME, TOKEN_INSTALL,
};
