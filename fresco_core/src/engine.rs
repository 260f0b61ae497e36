// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering engine contract.
//!
//! The retained-mode engine owns the widget tree, layout, and drawing. Fresco
//! consumes it only through [`RenderEngine`]: runtime init, tick
//! registration, display sessions, buffer and format assignment, flush
//! callback wiring, and one synchronous [`timer_handler`] entry point.
//! Bindings to a concrete engine implement this trait; `fresco_sim` ships a
//! software implementation for desktop runs.
//!
//! # Flush callbacks
//!
//! The engine calls back into Fresco without knowing Fresco's types. At
//! session setup the bridge registers a plain [`FlushCallback`] and attaches
//! the display driver as the session's user data. When a region is ready the
//! engine invokes the callback with a [`FlushContext`] through which the
//! driver is recovered and the flush acknowledged.
//!
//! [`timer_handler`]: RenderEngine::timer_handler

use core::fmt;

use crate::color::{Color, ColorFormat};
use crate::driver::DisplayDriver;

/// Returns elapsed milliseconds since an arbitrary epoch.
///
/// Must be monotonic for the life of the process (wrapping at `u32::MAX`
/// like any small-device tick counter).
pub type TimeSource = fn() -> u32;

/// Invoked by the engine when a rendered region is ready to be transported.
///
/// Arguments are the session's flush context, the rendered area, and the
/// rendered pixels (valid only for the duration of the call). The callback
/// must call [`FlushContext::flush_ready`] exactly once before returning.
pub type FlushCallback<'a> = fn(&mut dyn FlushContext<'a>, &Area, &[u8]);

/// Engine-side representation of a rendered region (inclusive bounds).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Area {
    /// Left column.
    pub x1: i32,
    /// Top row.
    pub y1: i32,
    /// Right column (inclusive).
    pub x2: i32,
    /// Bottom row (inclusive).
    pub y2: i32,
}

impl Area {
    /// Creates an area from inclusive bounds.
    #[inline]
    #[must_use]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The area covering a whole `width` × `height` screen.
    #[inline]
    #[must_use]
    pub const fn screen(width: u16, height: u16) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    /// Number of columns covered, zero for an inverted area.
    #[inline]
    #[must_use]
    pub const fn width(self) -> u32 {
        if self.x2 < self.x1 {
            0
        } else {
            self.x2.abs_diff(self.x1) + 1
        }
    }

    /// Number of rows covered, zero for an inverted area.
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

    /// Returns `true` if the area covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    /// Smallest area containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Overlap of `self` and `other`, or `None` if they are disjoint.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let clipped = Self {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (!clipped.is_empty()).then_some(clipped)
    }
}

impl fmt::Debug for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Area({},{}..={},{})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// How the engine uses the draw buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Every refresh redraws the whole screen; buffers hold a full frame.
    /// Recommended for small displays.
    #[default]
    Full,
    /// Only invalidated areas are redrawn, in as many chunks as the buffer
    /// size requires.
    Partial,
}

/// Caller-owned draw buffers lent to a session.
///
/// The engine renders into `primary` (and alternates with `secondary` when
/// double-buffering). `size` is the usable size of each buffer in bytes.
pub struct DrawBuffers<'a> {
    /// Buffer the engine renders into.
    pub primary: &'a mut [u8],
    /// Second buffer for double-buffering, if any.
    pub secondary: Option<&'a mut [u8]>,
    /// Usable bytes in each buffer.
    pub size: usize,
}

impl fmt::Debug for DrawBuffers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawBuffers")
            .field("primary_len", &self.primary.len())
            .field("secondary_len", &self.secondary.as_ref().map(|b| b.len()))
            .field("size", &self.size)
            .finish()
    }
}

/// Per-flush view of a session, handed to a [`FlushCallback`].
pub trait FlushContext<'a> {
    /// Returns the display driver attached as the session's user data, if
    /// one was attached.
    fn driver(&mut self) -> Option<&mut (dyn DisplayDriver + 'a)>;

    /// Tells the engine the flushed pixels have been consumed and the buffer
    /// may be reused. Until this is called the engine considers the flush in
    /// progress and will not render into the buffer again.
    fn flush_ready(&mut self);
}

/// Capabilities Fresco consumes from a retained-mode rendering engine.
///
/// The lifetime `'a` bounds everything the engine borrows from the host:
/// draw buffers and the display driver attached to sessions.
///
/// All methods taking a session must tolerate a handle that was already
/// deleted by ignoring it.
pub trait RenderEngine<'a> {
    /// Opaque handle to one display session inside the engine.
    type Session: Copy + Eq + fmt::Debug;

    /// Initializes the engine runtime. Must be idempotent.
    fn init(&mut self);

    /// Installs the engine's tick source, replacing any previous one.
    fn set_tick_source(&mut self, source: TimeSource);

    /// Creates a display session of the given size, or `None` if the engine
    /// cannot.
    fn create_session(&mut self, width: u16, height: u16) -> Option<Self::Session>;

    /// Destroys a session and releases everything it borrowed.
    fn delete_session(&mut self, session: Self::Session);

    /// Assigns draw buffers and the render mode.
    fn set_buffers(&mut self, session: Self::Session, buffers: DrawBuffers<'a>, mode: RenderMode);

    /// Sets the pixel format of the session's buffers.
    fn set_color_format(&mut self, session: Self::Session, format: ColorFormat);

    /// Registers the callback invoked for every rendered region.
    fn set_flush_callback(&mut self, session: Self::Session, callback: FlushCallback<'a>);

    /// Attaches the display driver the flush callback recovers.
    fn set_user_data(&mut self, session: Self::Session, driver: &'a mut dyn DisplayDriver);

    /// Overrides the period of the session's redraw timer.
    fn set_refresh_period(&mut self, session: Self::Session, period_ms: u32);

    /// Sets the background fill of the currently active screen.
    fn set_background(&mut self, color: Color);

    /// Runs due timers, including redraws, and returns the milliseconds
    /// until the next timer is due. May invoke flush callbacks any number of
    /// times before returning.
    fn timer_handler(&mut self) -> u32;
}
