//! Cooperative cancellation for write operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{StorageError, StorageResult};

/// A cloneable cancellation signal with an optional deadline.
///
/// All clones share one flag: triggering any of them cancels the rest.
/// Cancellation is cooperative. Writers consult the token once, at close
/// time; an operation already blocked inside a filesystem call is not
/// interrupted.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never fires unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that additionally fires once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Trigger the token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True when cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    /// `Err` describing why the token fired, `Ok(())` otherwise.
    ///
    /// Manual cancellation takes precedence over the deadline when both
    /// apply.
    pub fn check(&self) -> StorageResult<()> {
        if self.flag.load(Ordering::SeqCst) {
            return Err(StorageError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(StorageError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
