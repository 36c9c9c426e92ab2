//! Cancellable Locking
//!
//! Each device is guarded by one exclusive lock whose acquisition can be
//! abandoned by the waiter.
//!
//! ## Protocol
//! - A bounded(1) channel holds the single permit. Acquiring the lock
//!   means receiving that permit; the guard sends it back on drop.
//! - A [`CancelToken`] is a channel nobody ever sends on. Cancelling
//!   drops its only sender, which disconnects the channel and wakes every
//!   waiter selecting on it.
//! - Waiting is a `select!` over "permit available" and "token
//!   cancelled", so a blocked caller wakes for either without polling.
//! - The data itself sits in a `parking_lot::Mutex` that is only ever
//!   taken by the permit holder, so it never contends.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crossbeam::channel::{bounded, select, Receiver, Sender, TryRecvError};
use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, ScullError};

// =============================================================================
// Cancel Token
// =============================================================================

/// Caller-owned cancellation signal
///
/// Clones share state: cancelling any clone cancels all of them. Once
/// cancelled a token stays cancelled.
#[derive(Clone)]
pub struct CancelToken {
    /// Sole sender; dropped on cancel
    trigger: Arc<Mutex<Option<Sender<()>>>>,

    /// Disconnects when `trigger` is dropped
    cancelled: Receiver<()>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(sender))),
            cancelled: receiver,
        }
    }

    /// Cancel every pending and future lock wait made with this token
    pub fn cancel(&self) {
        self.trigger.lock().take();
    }

    /// Whether `cancel` has been called on this token or a clone
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cancelled.try_recv(), Err(TryRecvError::Disconnected))
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// =============================================================================
// Interruptible Mutex
// =============================================================================

/// Exclusive lock whose blocking acquisition can be cancelled
pub struct InterruptibleMutex<T> {
    permit_tx: Sender<()>,
    permit_rx: Receiver<()>,
    data: Mutex<T>,
}

impl<T> InterruptibleMutex<T> {
    pub fn new(value: T) -> Self {
        let (permit_tx, permit_rx) = bounded(1);
        // Capacity is one and the receiver is alive: cannot fail.
        let _ = permit_tx.try_send(());

        Self {
            permit_tx,
            permit_rx,
            data: Mutex::new(value),
        }
    }

    /// Block until the lock is free or `cancel` fires.
    ///
    /// Returns `Interrupted` without waiting if the token is already
    /// cancelled, or as soon as it is cancelled while blocked. On
    /// `Interrupted` the lock was never held.
    pub fn lock_interruptible(&self, cancel: &CancelToken) -> Result<InterruptibleGuard<'_, T>> {
        if cancel.is_cancelled() {
            return Err(ScullError::Interrupted);
        }

        select! {
            recv(self.permit_rx) -> permit => {
                if permit.is_err() {
                    return Err(ScullError::Interrupted);
                }
            }
            recv(cancel.cancelled) -> _ => return Err(ScullError::Interrupted),
        }

        Ok(self.guard())
    }

    /// Block until the lock is free. Not cancellable.
    pub fn lock(&self) -> InterruptibleGuard<'_, T> {
        // `permit_tx` lives as long as `self`, so this returns with the permit.
        let _ = self.permit_rx.recv();
        self.guard()
    }

    /// Whether some caller currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.permit_rx.is_empty()
    }

    /// Direct access when the caller has exclusive ownership
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    fn guard(&self) -> InterruptibleGuard<'_, T> {
        InterruptibleGuard {
            data: self.data.lock(),
            _permit: Permit(&self.permit_tx),
        }
    }
}

impl<T: Default> Default for InterruptibleMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Scoped lock holder; releases on drop, whatever the exit path
pub struct InterruptibleGuard<'a, T> {
    // Field order matters: the data unlocks before the permit returns.
    data: MutexGuard<'a, T>,
    _permit: Permit<'a>,
}

impl<T> Deref for InterruptibleGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for InterruptibleGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// Returns the permit to the channel when dropped
struct Permit<'a>(&'a Sender<()>);

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}
