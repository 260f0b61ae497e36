// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Millisecond tick source for desktop hosts.

use std::sync::OnceLock;
use std::time::Instant;

static START: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since the first call in this process, wrapping at
/// `u32::MAX` like a hardware tick counter.
///
/// Usable as a [`TimeSource`](fresco_core::engine::TimeSource).
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the tick counter wraps like a hardware timer"
)]
pub fn millis() -> u32 {
    START.get_or_init(Instant::now).elapsed().as_millis() as u32
}
