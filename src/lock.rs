//! Spin-based mutex whose acquisition gives up after a deadline.
//! A caller stuck behind a lock holder that never makes progress gets
//! `LockTimeout` back instead of spinning forever.

use core::time::Duration;
use std::time::Instant;

use crate::config::LOCK_TIMEOUT;
use crate::error::{FsError, Result};

pub type TimedMutexGuard<'a, T> = spin::MutexGuard<'a, T>;

pub struct TimedMutex<T> {
    inner: spin::Mutex<T>,
    timeout: Duration,
}

impl<T> TimedMutex<T> {
    pub const fn new(value: T) -> Self {
        Self::with_timeout(value, LOCK_TIMEOUT)
    }

    pub const fn with_timeout(value: T, timeout: Duration) -> Self {
        Self {
            inner: spin::Mutex::new(value),
            timeout,
        }
    }

    /// Acquires the mutex, failing with `LockTimeout` once the deadline passes.
    pub fn lock(&self) -> Result<TimedMutexGuard<'_, T>> {
        if let Some(guard) = self.inner.try_lock() {
            return Ok(guard);
        }
        let deadline = Instant::now() + self.timeout;
        loop {
            for _ in 0..64 {
                core::hint::spin_loop();
                if let Some(guard) = self.inner.try_lock() {
                    return Ok(guard);
                }
            }
            if Instant::now() >= deadline {
                log::error!("lock not acquired within {:?}", self.timeout);
                return Err(FsError::LockTimeout);
            }
            std::thread::yield_now();
        }
    }

    pub fn try_lock(&self) -> Option<TimedMutexGuard<'_, T>> {
        self.inner.try_lock()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lock_timeout() {
        let mutex = TimedMutex::with_timeout(0u32, Duration::from_millis(10));
        let held = mutex.lock().unwrap();
        assert_eq!(mutex.lock().err(), Some(FsError::LockTimeout));
        drop(held);
        *mutex.lock().unwrap() += 1;
        assert_eq!(mutex.into_inner(), 1);
    }
}
