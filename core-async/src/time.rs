//! Timers, timeouts and retry backoff.
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn paced() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(500)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(500));
//! }
//! ```

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
pub use tokio::time::{error::Elapsed, sleep, timeout, Sleep, Timeout};

/// Exponential backoff: `base * 2^attempt`, where `attempt` is zero-based.
///
/// The exponent is capped so that pathological attempt counts cannot overflow.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}

/// Sleeps for `duration` unless it is zero.
///
/// Pacing knobs are commonly zeroed in tests; skipping the timer entirely
/// keeps those runs free of scheduler yields.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
