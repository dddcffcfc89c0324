//! Cooperative cancellation token shared between the orchestrator and the
//! numerical kernels.
//!
//! Kernels check the flag between outer iterations; nothing is interrupted
//! mid-row. Timeout and explicit cancel use the same mechanism and differ
//! only in the recorded reason.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::MatchError;

/// Why a token was tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit cancel request.
    Canceled,
    /// Wall-clock budget exhausted.
    Timeout,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    reason: Mutex<Option<CancelReason>>,
}

/// Cheap-to-clone cancellation handle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. The first recorded reason wins; later calls only
    /// keep the flag set.
    pub fn cancel(&self, reason: CancelReason) {
        let mut slot = self.inner.reason.lock();
        if slot.is_none() {
            *slot = Some(reason);
        }
        drop(slot);
        self.inner.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been tripped.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// The recorded reason, when tripped.
    pub fn reason(&self) -> Option<CancelReason> {
        *self.inner.reason.lock()
    }

    /// Error to surface if tripped, `Ok(())` otherwise.
    ///
    /// Kernels call this between outer iterations.
    pub fn check(&self) -> Result<(), MatchError> {
        if !self.is_canceled() {
            return Ok(());
        }
        match self.reason() {
            Some(CancelReason::Timeout) => Err(MatchError::Timeout),
            _ => Err(MatchError::Canceled),
        }
    }
}
