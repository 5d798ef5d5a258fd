//! ESP32 time adapter.
//!
//! Monotonic milliseconds plus the async sleep every core loop awaits.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side simulation.
//!
//! Sleeping goes through `async_io_mini::Timer` on both.

use core::time::Duration;

use crate::app::ports::{Clock, Timebase};

/// Time adapter for the ESP32 platform.  Cheap to clone; every clone
/// reads the same clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimebase {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimebase {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Seconds since boot (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

impl Clock for SystemTimebase {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        // SAFETY: reads the free-running esp_timer counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Timebase for SystemTimebase {
    async fn sleep_ms(&self, ms: u64) {
        async_io_mini::Timer::after(Duration::from_millis(ms)).await;
    }
}
