use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Counting semaphore bounding concurrent discovery calls across the expansion pool.
pub struct Semaphore {
    available: Mutex<usize>,
    freed: Condvar,
}

/// A held permit. Returned to the semaphore on drop, including when discovery fails.
pub struct Permit<'a> {
    sem: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut available = self.sem.available.lock().unwrap_or_else(PoisonError::into_inner);
        *available += 1;
        self.sem.freed.notify_one();
    }
}

impl Semaphore {
    /// `permits` must be non-zero; the engine validates its options before building one.
    pub fn new(permits: usize) -> Self {
        Self {
            available: Mutex::new(permits),
            freed: Condvar::new(),
        }
    }

    /// Block until a permit is free. Also returns how long the caller was held back.
    pub fn acquire(&self) -> (Permit<'_>, Duration) {
        let start = Instant::now();
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        let throttled = *available == 0;
        while *available == 0 {
            available = self.freed.wait(available).unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;

        let waited = if throttled { start.elapsed() } else { Duration::ZERO };
        (Permit { sem: self }, waited)
    }
}
