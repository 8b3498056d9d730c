// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common crate for the stopwatch
//!
//! Provides the timekeeping core and the persistable mode snapshot that are
//! used across every module.

pub mod clock_source;
pub mod snapshot;
pub mod stopwatch;
pub mod test_helper;
