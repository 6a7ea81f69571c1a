//! Kernel File I/O Event Stream Abstraction
//!
//! The activity tracker correlates a live stream of kernel-level file I/O
//! events to one target process. The stream itself is an external
//! collaborator: events are delivered on a thread owned by the source, and
//! the callback must only filter and enqueue, never block or perform I/O.
//!
//! Subscription and teardown are explicit and idempotent: dropping an
//! [`EventSubscription`] (or calling [`EventSubscription::unsubscribe`]
//! twice) detaches at most once.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;

/// File operation kind carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
}

/// One kernel-level file I/O event.
#[derive(Debug, Clone)]
pub struct FileIoEvent {
    /// Process id that performed the operation.
    pub process_id: u32,
    /// Absolute path of the file touched. May be empty when the kernel
    /// could not resolve a name; consumers must tolerate that.
    pub path: PathBuf,
    /// Whether the file was read or written.
    pub operation: FileOperation,
}

/// Which operation kinds a subscription wants delivered.
#[derive(Debug, Clone, Copy)]
pub struct EventInterest {
    pub writes: bool,
    pub reads: bool,
}

/// Callback invoked for every delivered event.
///
/// Invoked from a thread owned by the event source. Implementations must be
/// non-blocking: validate, filter, and hand off under a short-held lock.
pub type EventCallback = Arc<dyn Fn(FileIoEvent) + Send + Sync>;

/// Handle for an active subscription. Teardown is idempotent.
pub trait EventSubscription: Send + Sync {
    /// Detach the callback from the source. Calling this more than once
    /// (or after drop-initiated teardown) is a no-op.
    fn unsubscribe(&self);
}

/// Kernel event source seam.
///
/// # Errors
///
/// `subscribe` fails with
/// [`BridgeError::PermissionDenied`](crate::BridgeError::PermissionDenied)
/// when the caller lacks the privilege to attach a kernel tracing session.
pub trait FileEventSource: Send + Sync {
    /// Attach `callback` to the stream for the requested operation kinds.
    fn subscribe(
        &self,
        interest: EventInterest,
        callback: EventCallback,
    ) -> Result<Box<dyn EventSubscription>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSubscription {
        teardowns: Arc<AtomicUsize>,
    }

    impl EventSubscription for CountingSubscription {
        fn unsubscribe(&self) {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_subscription_teardown_is_explicit() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let sub = CountingSubscription {
            teardowns: teardowns.clone(),
        };

        sub.unsubscribe();
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_file_io_event_clone() {
        let event = FileIoEvent {
            process_id: 42,
            path: PathBuf::from("/saves/slot0.sav"),
            operation: FileOperation::Write,
        };
        let copy = event.clone();
        assert_eq!(copy.process_id, 42);
        assert_eq!(copy.operation, FileOperation::Write);
    }
}
