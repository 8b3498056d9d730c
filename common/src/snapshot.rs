// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The persistable mode of the stopwatch as observed by a host UI.
///
/// The snapshot carries the UI-facing intent state, the millisecond
/// bookkeeping lives in [`Stopwatch`](crate::stopwatch::Stopwatch). A host
/// reacts to snapshot transitions by driving the matching accumulator call.
///
/// The `since_ms` of [`Stopped`](StopwatchSnapshot::Stopped) records when the
/// stop was issued. It is informational only and is never reconciled against
/// the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchSnapshot {
    /// No timer activity yet.
    Initial,
    /// The timer is active, started at `since_ms`.
    Running { since_ms: i64 },
    /// The timer is paused, stopped at `since_ms`.
    Stopped { since_ms: i64 },
}

impl StopwatchSnapshot {
    /// Returns the restoration payload of this snapshot.
    ///
    /// The payload is `[1, since]` for a running snapshot, `[0, since]` for a
    /// stopped one and empty for [`Initial`](StopwatchSnapshot::Initial).
    pub fn payload(&self) -> Vec<i64> {
        match *self {
            StopwatchSnapshot::Initial => vec![],
            StopwatchSnapshot::Running { since_ms } => vec![1, since_ms],
            StopwatchSnapshot::Stopped { since_ms } => vec![0, since_ms],
        }
    }

    /// Restores a snapshot from a restoration payload.
    ///
    /// An empty payload restores [`Initial`](StopwatchSnapshot::Initial). A
    /// pair with a leading `1` restores a running snapshot, any other flag a
    /// stopped one. Malformed payloads are silently normalized to
    /// [`Initial`](StopwatchSnapshot::Initial), restoring never fails.
    pub fn from_payload(payload: &[i64]) -> Self {
        match *payload {
            [1, since_ms] => StopwatchSnapshot::Running { since_ms },
            [_, since_ms] => StopwatchSnapshot::Stopped { since_ms },
            _ => StopwatchSnapshot::Initial,
        }
    }

    /// Serializes a snapshot into its JSON payload representation.
    pub fn to_json(snapshot: &StopwatchSnapshot) -> serde_json::Result<String> {
        serde_json::to_string(snapshot)
    }

    /// Restores a snapshot from a JSON payload.
    ///
    /// Any input that does not parse as a restoration payload restores
    /// [`Initial`](StopwatchSnapshot::Initial).
    pub fn from_json(json: &str) -> StopwatchSnapshot {
        serde_json::from_str(json).unwrap_or(StopwatchSnapshot::Initial)
    }
}

impl Serialize for StopwatchSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let payload = self.payload();
        let mut seq = serializer.serialize_seq(Some(payload.len()))?;
        for value in payload {
            seq.serialize_element(&value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for StopwatchSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = Vec::<i64>::deserialize(deserializer)?;
        Ok(StopwatchSnapshot::from_payload(&payload))
    }
}
