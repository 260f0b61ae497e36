// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display driver contract.
//!
//! A display driver moves rendered pixels to a physical or virtual screen.
//! The bridge never owns one: it borrows the driver for its own lifetime and
//! calls it with a dirty [`Rect`] and the pixels the engine rendered into it.

use core::fmt;

use crate::engine::Area;

/// Inclusive pixel bounds of a region handed to [`DisplayDriver::flush`].
///
/// `x2`/`y2` name the last column/row *inside* the region, so a single pixel
/// at the origin is `Rect { x1: 0, y1: 0, x2: 0, y2: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left column.
    pub x1: i32,
    /// Top row.
    pub y1: i32,
    /// Right column (inclusive).
    pub x2: i32,
    /// Bottom row (inclusive).
    pub y2: i32,
}

impl Rect {
    /// Creates a rect from inclusive bounds.
    #[inline]
    #[must_use]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Number of columns covered, zero for an inverted rect.
    #[inline]
    #[must_use]
    pub const fn width(self) -> u32 {
        if self.x2 < self.x1 {
            0
        } else {
            self.x2.abs_diff(self.x1) + 1
        }
    }

    /// Number of rows covered, zero for an inverted rect.
    #[inline]
    #[must_use]
    pub const fn height(self) -> u32 {
        if self.y2 < self.y1 {
            0
        } else {
            self.y2.abs_diff(self.y1) + 1
        }
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.width() as usize * self.height() as usize
    }
}

impl From<Area> for Rect {
    fn from(area: Area) -> Self {
        Self {
            x1: area.x1,
            y1: area.y1,
            x2: area.x2,
            y2: area.y2,
        }
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rect({},{}..={},{})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Transports rendered pixels to a screen.
///
/// Implemented by panel drivers (SPI/parallel LCDs) and by simulated
/// framebuffers. The bridge treats every call as synchronous: by the time
/// [`flush`](Self::flush) returns, the pixels must be on the panel or safely
/// queued, because the engine may start drawing into the same buffer right
/// after.
pub trait DisplayDriver {
    /// Panel width in pixels. Queried once, when the bridge initializes.
    fn width(&self) -> u16;

    /// Panel height in pixels. Queried once, when the bridge initializes.
    fn height(&self) -> u16;

    /// Writes `pixels` into `area` of the screen.
    ///
    /// `pixels` holds `area.pixel_count()` pixels in row-major order, in the
    /// session's color format; it is only valid for the duration of the call.
    fn flush(&mut self, pixels: &[u8], area: Rect);
}

impl fmt::Debug for dyn DisplayDriver + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayDriver")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}
