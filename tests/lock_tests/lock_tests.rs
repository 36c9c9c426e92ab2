//! Tests for the cancellable lock
//!
//! These tests verify:
//! - CancelToken state is shared between clones
//! - Guards release on every exit path
//! - Blocked waiters wake on release or on cancellation
//! - Mutual exclusion under contention

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scull::lock::{CancelToken, InterruptibleMutex};
use scull::ScullError;

// =============================================================================
// CancelToken Tests
// =============================================================================

#[test]
fn test_new_token_not_cancelled() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn test_cancel_visible_to_clones() {
    let token = CancelToken::new();
    let clone = token.clone();

    clone.cancel();

    assert!(token.is_cancelled());
    assert!(clone.is_cancelled());
}

#[test]
fn test_cancel_is_idempotent() {
    let token = CancelToken::default();
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn test_debug_shows_state() {
    let token = CancelToken::new();
    assert_eq!(format!("{:?}", token), "CancelToken { cancelled: false }");
    token.cancel();
    assert_eq!(format!("{:?}", token), "CancelToken { cancelled: true }");
}

// =============================================================================
// Guard Tests
// =============================================================================

#[test]
fn test_lock_and_release() {
    let mutex = InterruptibleMutex::new(5u32);
    let cancel = CancelToken::new();

    {
        let mut guard = mutex.lock_interruptible(&cancel).unwrap();
        assert!(mutex.is_locked());
        *guard += 1;
    }

    assert!(!mutex.is_locked());
    assert_eq!(*mutex.lock(), 6);
    assert!(!mutex.is_locked());
}

#[test]
fn test_guard_released_on_early_return() {
    fn bump_then_fail(mutex: &InterruptibleMutex<u32>, cancel: &CancelToken) -> scull::Result<()> {
        let mut guard = mutex.lock_interruptible(cancel)?;
        *guard += 1;
        Err(ScullError::OutOfMemory)
    }

    let mutex = InterruptibleMutex::new(0u32);
    let cancel = CancelToken::new();

    assert!(bump_then_fail(&mutex, &cancel).is_err());
    assert!(!mutex.is_locked());
    assert_eq!(*mutex.lock(), 1);
}

#[test]
fn test_guard_released_on_panic() {
    let mutex = Arc::new(InterruptibleMutex::new(0u32));

    let result = {
        let mutex = Arc::clone(&mutex);
        thread::spawn(move || {
            let _guard = mutex.lock();
            panic!("holder panics");
        })
        .join()
    };

    assert!(result.is_err());
    assert!(!mutex.is_locked());
    assert!(mutex.lock_interruptible(&CancelToken::new()).is_ok());
}

#[test]
fn test_cancelled_token_fails_fast() {
    let mutex = InterruptibleMutex::new(());
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = mutex.lock_interruptible(&cancel);

    assert!(matches!(result, Err(ScullError::Interrupted)));
    assert!(!mutex.is_locked());
}

#[test]
fn test_get_mut_bypasses_lock() {
    let mut mutex = InterruptibleMutex::new(vec![1, 2]);
    mutex.get_mut().push(3);
    assert_eq!(*mutex.lock(), vec![1, 2, 3]);
}

// =============================================================================
// Blocking Tests
// =============================================================================

#[test]
fn test_waiter_wakes_on_release() {
    let mutex = Arc::new(InterruptibleMutex::new(0u32));
    let guard = mutex.lock();

    let waiter = {
        let mutex = Arc::clone(&mutex);
        thread::spawn(move || {
            let mut guard = mutex.lock_interruptible(&CancelToken::new()).unwrap();
            *guard += 1;
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished());
    drop(guard);

    waiter.join().unwrap();
    assert_eq!(*mutex.lock(), 1);
}

#[test]
fn test_waiter_wakes_on_cancel() {
    let mutex = Arc::new(InterruptibleMutex::new(0u32));
    let guard = mutex.lock();
    let cancel = CancelToken::new();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let mutex = Arc::clone(&mutex);
            let cancel = cancel.clone();
            thread::spawn(move || mutex.lock_interruptible(&cancel).map(|_| ()))
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    cancel.cancel();

    for waiter in waiters {
        assert!(matches!(waiter.join().unwrap(), Err(ScullError::Interrupted)));
    }

    // The holder still owns the lock; cancellation did not touch it
    assert!(mutex.is_locked());
    drop(guard);
    assert!(!mutex.is_locked());
}

#[test]
fn test_mutual_exclusion_under_contention() {
    let mutex = Arc::new(InterruptibleMutex::new((0u64, false)));

    let mut handles = vec![];

    for _ in 0..8 {
        let mutex = Arc::clone(&mutex);
        handles.push(thread::spawn(move || {
            let cancel = CancelToken::new();
            for _ in 0..1000 {
                let mut guard = mutex.lock_interruptible(&cancel).unwrap();
                assert!(!guard.1, "two holders inside the lock");
                guard.1 = true;
                guard.0 += 1;
                guard.1 = false;
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(mutex.lock().0, 8000);
}
