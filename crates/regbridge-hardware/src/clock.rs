//! Sleep abstraction for the receive-queue poll loop.

use std::time::Duration;

/// Blocks the current thread between receive-queue polls.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
