use chrono::Utc;

/// A trait for sampling the current wall-clock time in milliseconds.
///
/// Implementations of this trait provide the single time reading the
/// stopwatch bookkeeping is based on. Keeping the clock behind a trait
/// allows tests to drive the time deterministically instead of depending
/// on the system clock.
pub trait ClockSource {
    /// Returns the current wall-clock time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// A [`ClockSource`] implementation backed by the system wall clock.
///
/// Readings are taken from [`chrono::Utc`] at millisecond resolution. The
/// wall clock is not monotonic, so readings may be affected by system clock
/// adjustments.
#[derive(Debug, Default)]
pub struct SystemClockSource;

impl ClockSource for SystemClockSource {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
