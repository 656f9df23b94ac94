//! Time abstraction allowing discard timers to be driven by a mock clock
//! in tests.

use std::fmt::Debug;
use std::time::Instant;

/// A trait abstracting "now" so that timer deadlines can be tested without
/// real delays.
pub trait Clock: Send + Debug {
    /// Current `Instant`.
    fn now(&self) -> Instant;
}

/// The default clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Test utilities for controlling time manually.
pub mod mock_clock {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// A clock whose current time only moves when the test advances it.
    #[derive(Debug)]
    pub struct MockClock {
        current_time: Mutex<Instant>,
    }

    impl MockClock {
        /// Creates a `MockClock` starting at `start_time`.
        pub fn new(start_time: Instant) -> Self {
            Self {
                current_time: Mutex::new(start_time),
            }
        }

        /// Advances the clock by `duration`.
        pub fn advance(&self, duration: Duration) {
            let mut current = self.current_time.lock().unwrap();
            *current += duration;
        }

        /// Advances the clock by `ms` milliseconds.
        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new(Instant::now())
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current_time.lock().unwrap()
        }
    }
}
