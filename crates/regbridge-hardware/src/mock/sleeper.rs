//! Sleeper that records requested delays instead of blocking.

use crate::clock::Sleeper;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Records every requested sleep and returns immediately.
///
/// Clones share the same record, so a test can keep one clone while the
/// device owns another.
///
/// # Examples
///
/// ```
/// use regbridge_hardware::clock::Sleeper;
/// use regbridge_hardware::mock::RecordingSleeper;
/// use std::time::Duration;
///
/// let sleeper = RecordingSleeper::new();
/// let observer = sleeper.clone();
///
/// sleeper.sleep(Duration::from_millis(1));
/// assert_eq!(observer.count(), 1);
/// assert_eq!(observer.total(), Duration::from_millis(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sleeps requested so far.
    pub fn count(&self) -> usize {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .sum()
    }

    pub fn reset(&self) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}
