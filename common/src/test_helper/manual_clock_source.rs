use crate::clock_source::ClockSource;
use std::sync::mpsc;

/// A test implementation of [`ClockSource`] that allows deterministic
/// control of the wall clock in unit tests.
///
/// Internally, it uses an [`mpsc::channel`] to receive externally provided
/// clock readings, and a [`RefCell`](std::cell::RefCell) to hold the latest
/// received value.
pub struct ManualClockSource {
    sender: mpsc::Sender<i64>,
    receiver: mpsc::Receiver<i64>,
    now_ms: std::cell::RefCell<i64>,
}

impl Default for ManualClockSource {
    /// Creates a new instance with an internal channel for sending clock
    /// readings and an initial reading of zero.
    fn default() -> Self {
        let (tx, rx) = mpsc::channel::<i64>();
        Self {
            sender: tx,
            receiver: rx,
            // Not synchronized, but sufficient for test usage.
            now_ms: std::cell::RefCell::new(0),
        }
    }
}

impl ManualClockSource {
    /// Returns a clone of the internal sender used to provide clock readings
    /// from outside the test clock source.
    pub fn sender(&self) -> mpsc::Sender<i64> {
        self.sender.clone()
    }

    /// Attempts to receive a new clock reading from the channel.
    ///
    /// If a new reading is available, it replaces the current value.
    /// Returns the latest reading held by this clock source.
    fn receive(&self) -> i64 {
        if let Ok(now_ms) = self.receiver.try_recv() {
            *self.now_ms.borrow_mut() = now_ms;
        }
        *self.now_ms.borrow()
    }
}

impl ClockSource for ManualClockSource {
    /// Returns the current clock reading, receiving the latest value from
    /// the channel if available.
    fn now_ms(&self) -> i64 {
        self.receive()
    }
}

/// Sends a given clock reading through the provided sender to update a
/// [`ManualClockSource`] instance.
///
/// Panics if sending fails, for example if the receiver has been dropped.
pub fn set_clock_ms(sender: &mpsc::Sender<i64>, now_ms: i64) {
    sender
        .send(now_ms)
        .unwrap_or_else(|_| panic!("Failed to send clock reading to the test clock source"));
}
