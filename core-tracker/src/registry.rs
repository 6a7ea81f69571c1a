//! One-slot session registry.
//!
//! Exactly one activity tracking session may exist process-wide. The slot is
//! acquired with an atomic compare-exchange and released on finalize or on
//! any setup-failure path, so the invariant holds without ambient mutable
//! state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Atomic one-slot registry guarding the single-session invariant.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: AtomicBool,
}

impl SessionRegistry {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Try to claim the slot. Returns `false` when a session already holds it.
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the slot. Safe to call when not held.
    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Whether a session currently holds the slot.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// The process-wide registry used by default.
pub fn global() -> Arc<SessionRegistry> {
    static GLOBAL: std::sync::OnceLock<Arc<SessionRegistry>> = std::sync::OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(SessionRegistry::new())).clone()
}
