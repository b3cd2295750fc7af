//! Fixture server state
//!
//! Author: hephaex@gmail.com

use ragprobe_core::MockServerConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// State shared across handlers
pub struct MockState {
    /// Latency added before every query reply
    pub delay: Duration,
    /// Server start time
    pub start_time: Instant,
    /// Query counter
    pub request_count: AtomicU64,
}

impl MockState {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &MockServerConfig) -> Self {
        Self::new(Duration::from_millis(config.delay_ms))
    }

    /// Increment query counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total query count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
