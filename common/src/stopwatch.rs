use crate::clock_source::{ClockSource, SystemClockSource};

/// The elapsed-time accumulator of the stopwatch.
///
/// A `Stopwatch` keeps the total elapsed milliseconds of all completed run
/// segments and, while running, the wall-clock instant the current segment
/// began. The total elapsed time at any query instant is
/// `accumulated_ms + (now - started_at_ms)` while running and
/// `accumulated_ms` otherwise.
///
/// # Type Parameters
/// - `T`: The clock source implementation (e.g., [`SystemClockSource`]) used to
///   sample the wall clock. Defaults to [`SystemClockSource`].
#[derive(Debug)]
pub struct Stopwatch<T: ClockSource = SystemClockSource> {
    running: bool,
    started_at_ms: i64,
    accumulated_ms: i64,
    clock_source: T,
}

impl Stopwatch<SystemClockSource> {
    /// Creates a new stopped stopwatch using the default [`SystemClockSource`].
    pub fn new() -> Self {
        Stopwatch::new_with_clock(SystemClockSource)
    }
}

impl Default for Stopwatch<SystemClockSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ClockSource> Stopwatch<T> {
    /// Creates a new stopped stopwatch with a custom clock source.
    pub fn new_with_clock(clock_source: T) -> Self {
        Stopwatch {
            running: false,
            started_at_ms: 0,
            accumulated_ms: 0,
            clock_source,
        }
    }

    /// Returns whether the stopwatch is currently advancing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts a new run segment.
    ///
    /// Does nothing while the stopwatch is already running, so a repeated
    /// start neither loses nor gains time.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.started_at_ms = self.clock_source.now_ms();
        }
    }

    /// Finishes the current run segment and folds its duration into the
    /// accumulated total.
    ///
    /// Does nothing while the stopwatch is already stopped.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.accumulated_ms += self.clock_source.now_ms() - self.started_at_ms;
        }
    }

    /// Stops the stopwatch and discards all accumulated time.
    pub fn reset(&mut self) {
        self.running = false;
        self.accumulated_ms = 0;
    }

    /// Returns the total elapsed milliseconds at this instant.
    pub fn elapsed_ms(&self) -> i64 {
        if self.running {
            self.accumulated_ms + self.clock_source.now_ms() - self.started_at_ms
        } else {
            self.accumulated_ms
        }
    }

    /// Formats the elapsed time as a clock string.
    ///
    /// Below one hour the result is `MM:SS.mmm`, from one hour on it is
    /// `HH:MM:SS.mmm`. Hours are padded to two digits but grow unbounded
    /// beyond that.
    pub fn format(&self) -> String {
        format_elapsed(self.elapsed_ms())
    }
}

/// Converts a total amount of milliseconds into a clock string, see
/// [`Stopwatch::format`].
pub fn format_elapsed(total_ms: i64) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 - hours * 60;
    let seconds = total_ms / 1000 - hours * 3600 - minutes * 60;
    let millis = total_ms - hours * 3_600_000 - minutes * 60_000 - seconds * 1000;

    if hours == 0 {
        format!("{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}
