//! Caller-supplied cancellation and deadline handle.
//!
//! # Responsibility
//! - Carry a cancel flag and an optional deadline into every store call.
//! - Install a SQLite progress handler that interrupts running statements
//!   once the handle fires.
//!
//! # Invariants
//! - Clones share one flag; cancelling any clone cancels all of them.
//! - A fired handle never un-fires.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of SQLite VM instructions between cancellation checks.
const PROGRESS_HANDLER_OPS: i32 = 1_000;

/// Why an operation was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller called [`Cancellation::cancel`].
    Cancelled,
    /// The deadline passed before the operation finished.
    DeadlineExceeded,
}

impl Display for CancelReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::DeadlineExceeded => write!(f, "operation deadline exceeded"),
        }
    }
}

impl Error for CancelReason {}

/// Cancellation handle passed to every store operation.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Creates a handle with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle that fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Creates a handle that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Fires the handle for this value and all of its clones.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason when the handle has fired.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.flag.load(Ordering::SeqCst) {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Fails with the cancel reason when the handle has fired.
    pub fn check(&self) -> Result<(), CancelReason> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Runs `op` with a progress handler that interrupts SQLite when the
    /// handle fires. The handler is removed again before returning.
    pub(crate) fn guard_sqlite<T>(&self, conn: &Connection, op: impl FnOnce() -> T) -> T {
        let handle = self.clone();
        conn.progress_handler(PROGRESS_HANDLER_OPS, Some(move || handle.is_cancelled()));
        let result = op();
        conn.progress_handler(PROGRESS_HANDLER_OPS, None::<fn() -> bool>);
        result
    }
}
