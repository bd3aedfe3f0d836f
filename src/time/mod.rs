//! Wall-clock timing for the demonstration driver.

use std::time::{Duration, Instant};

/// Measures elapsed time from its creation.
pub struct Timer {
    title: String,
    start: Instant,
}

impl Timer {
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self { title: title.to_string(), start: Instant::now() }
    }

    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    #[must_use]
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed().as_millis()
    }
}
