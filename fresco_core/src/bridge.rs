// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rendering bridge.
//!
//! A [`Bridge`] connects one [`DisplayDriver`] to the shared engine
//! [`Runtime`]. It owns exactly one engine display session once initialized
//! and borrows everything else: the driver and the draw buffers stay owned
//! by the host for the lifetime `'a`.
//!
//! # Lifecycle
//!
//! ```text
//!   build() ──► Uninitialized ──init()──► Initialized ──drop──► session deleted
//!                     ▲    │ Err(..)          │ init() = no-op
//!                     └────┘                  │ refresh() = one engine pass
//! ```
//!
//! Building records inputs only. [`Bridge::init`] validates them, brings up
//! the engine runtime, and wires the session; any failure leaves the bridge
//! uninitialized with its inputs intact, so the host can retry.
//!
//! # Example
//!
//! ```rust,ignore
//! let runtime = Runtime::new(engine);
//! let mut bridge = Bridge::builder(&runtime)
//!     .driver(&mut panel)
//!     .buffer(&mut DRAW_BUF)
//!     .time_source(millis)
//!     .config(BridgeConfig::new().with_refresh_hz(100))
//!     .build();
//! bridge.init()?;
//!
//! loop {
//!     bridge.refresh();
//! }
//! ```

use core::fmt;
use core::mem;

use crate::color::{Color, ColorFormat};
use crate::driver::{DisplayDriver, Rect};
use crate::engine::{Area, DrawBuffers, FlushContext, RenderEngine, RenderMode, TimeSource};
use crate::error::{BridgeError, InvalidArgument};
use crate::runtime::Runtime;

/// Pixel format every bridge session uses.
pub const BRIDGE_COLOR_FORMAT: ColorFormat = ColorFormat::Rgb565;

/// Immutable bridge configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BridgeConfig {
    /// How the engine uses the draw buffers.
    pub render_mode: RenderMode,
    /// Target refresh rate in Hz; `0` keeps the engine's default period.
    pub refresh_hz: u32,
    /// Background fill of the active screen.
    pub background: Color,
}

impl BridgeConfig {
    /// Full-screen rendering, engine default refresh period, black
    /// background.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            render_mode: RenderMode::Full,
            refresh_hz: 0,
            background: Color::BLACK,
        }
    }

    /// Sets the render mode.
    #[must_use]
    pub const fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    /// Sets the target refresh rate in Hz.
    #[must_use]
    pub const fn with_refresh_hz(mut self, refresh_hz: u32) -> Self {
        self.refresh_hz = refresh_hz;
        self
    }

    /// Sets the background fill.
    #[must_use]
    pub const fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Redraw timer period implied by [`refresh_hz`](Self::refresh_hz), or
    /// `None` to keep the engine's default.
    #[must_use]
    pub const fn refresh_period_ms(&self) -> Option<u32> {
        1000_u32.checked_div(self.refresh_hz)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the inputs of a [`Bridge`].
///
/// Created by [`Bridge::builder`]. Every input is optional at this stage;
/// missing ones are reported by [`Bridge::init`].
pub struct BridgeBuilder<'a, E> {
    runtime: Runtime<E>,
    driver: Option<&'a mut dyn DisplayDriver>,
    primary: Option<&'a mut [u8]>,
    secondary: Option<&'a mut [u8]>,
    buffer_size: usize,
    time_source: Option<TimeSource>,
    config: BridgeConfig,
}

impl<'a, E> BridgeBuilder<'a, E> {
    /// Display driver the bridge flushes to. Must outlive the bridge.
    #[must_use]
    pub fn driver(mut self, driver: &'a mut dyn DisplayDriver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Primary draw buffer.
    #[must_use]
    pub fn buffer(mut self, buffer: &'a mut [u8]) -> Self {
        self.primary = Some(buffer);
        self
    }

    /// Second draw buffer for double-buffering.
    #[must_use]
    pub fn secondary_buffer(mut self, buffer: &'a mut [u8]) -> Self {
        self.secondary = Some(buffer);
        self
    }

    /// Usable bytes per draw buffer. `0` (the default) derives
    /// `width * height * 2` from the driver.
    #[must_use]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Millisecond tick source registered with the engine.
    #[must_use]
    pub fn time_source(mut self, source: TimeSource) -> Self {
        self.time_source = Some(source);
        self
    }

    /// Bridge configuration.
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Records the inputs in an uninitialized bridge. No engine calls are
    /// made.
    #[must_use]
    pub fn build(self) -> Bridge<'a, E>
    where
        E: RenderEngine<'a>,
    {
        Bridge {
            runtime: self.runtime,
            driver: self.driver,
            primary: self.primary,
            secondary: self.secondary,
            buffer_size: self.buffer_size,
            time_source: self.time_source,
            config: self.config,
            session: None,
            resolution: None,
        }
    }
}

impl<E> fmt::Debug for BridgeBuilder<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("driver", &self.driver)
            .field("primary_len", &self.primary.as_ref().map(|b| b.len()))
            .field("secondary_len", &self.secondary.as_ref().map(|b| b.len()))
            .field("buffer_size", &self.buffer_size)
            .field("time_source", &self.time_source.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Checked inputs, ready to be wired into a session.
struct Plan<'a> {
    width: u16,
    height: u16,
    time_source: TimeSource,
    driver: &'a mut dyn DisplayDriver,
    buffers: DrawBuffers<'a>,
}

/// Rejects a zero size and any buffer shorter than the size.
fn check_buffers(buffers: &DrawBuffers<'_>) -> Result<(), InvalidArgument> {
    let size = buffers.size;
    if size == 0 {
        return Err(InvalidArgument::ZeroBufferSize);
    }
    let secondary = buffers.secondary.as_deref();
    for provided in core::iter::once(buffers.primary.len()).chain(secondary.map(<[u8]>::len)) {
        if provided < size {
            return Err(InvalidArgument::BufferTooSmall {
                required: size,
                provided,
            });
        }
    }
    Ok(())
}

/// Owner of one engine display session, wired to a display driver.
///
/// Not `Clone`: a session has exactly one owner. Moving a bridge moves the
/// session; [`take`](Self::take) moves it out of a place that must stay
/// valid. Dropping an initialized bridge deletes its session, and
/// assigning over one deletes the previous session first.
pub struct Bridge<'a, E: RenderEngine<'a>> {
    runtime: Runtime<E>,
    driver: Option<&'a mut dyn DisplayDriver>,
    primary: Option<&'a mut [u8]>,
    secondary: Option<&'a mut [u8]>,
    buffer_size: usize,
    time_source: Option<TimeSource>,
    config: BridgeConfig,
    session: Option<E::Session>,
    resolution: Option<(u16, u16)>,
}

impl<'a, E: RenderEngine<'a>> Bridge<'a, E> {
    /// Starts collecting the inputs of a bridge on `runtime`.
    #[must_use]
    pub fn builder(runtime: &Runtime<E>) -> BridgeBuilder<'a, E> {
        BridgeBuilder {
            runtime: runtime.clone(),
            driver: None,
            primary: None,
            secondary: None,
            buffer_size: 0,
            time_source: None,
            config: BridgeConfig::new(),
        }
    }

    /// Initializes the engine runtime and wires a display session to the
    /// driver.
    ///
    /// Idempotent: once initialized, further calls return `Ok(())` without
    /// touching the engine.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidArgument`] if the driver, the primary buffer,
    ///   or the time source is missing (checked in that order), or if the
    ///   buffer size is zero or larger than a supplied buffer. No engine call
    ///   is made.
    /// - [`BridgeError::HardwareInitFailed`] if the engine cannot create the
    ///   display session.
    ///
    /// On error the bridge stays uninitialized and keeps its inputs.
    pub fn init(&mut self) -> Result<(), BridgeError> {
        if self.session.is_some() {
            return Ok(());
        }

        let plan = self.plan()?;
        let (width, height) = (plan.width, plan.height);

        self.runtime.ensure_initialized();
        self.runtime.register_tick_source(plan.time_source);

        let Some(session) = self
            .runtime
            .with_engine(|engine| engine.create_session(width, height))
        else {
            self.restore(plan.driver, plan.buffers);
            let err = BridgeError::HardwareInitFailed { width, height };
            log::warn!("bridge init failed: {err}");
            return Err(err);
        };

        let Plan { driver, buffers, .. } = plan;
        let size = buffers.size;
        let config = self.config;

        self.runtime.with_engine(|engine| {
            engine.set_buffers(session, buffers, config.render_mode);
            engine.set_color_format(session, BRIDGE_COLOR_FORMAT);
            engine.set_flush_callback(session, flush_to_driver);
            engine.set_user_data(session, driver);
            if let Some(period) = config.refresh_period_ms() {
                engine.set_refresh_period(session, period);
            }
            engine.set_background(config.background);
        });

        self.buffer_size = size;
        self.resolution = Some((width, height));
        self.session = Some(session);
        log::info!(
            "bridge initialized: {width}x{height}, {size} byte buffer, {:?} mode",
            config.render_mode
        );
        Ok(())
    }

    /// Takes the inputs out of the bridge once they are complete and
    /// consistent. On error every input is left in place.
    fn plan(&mut self) -> Result<Plan<'a>, BridgeError> {
        let (driver, primary) = match (self.driver.take(), self.primary.take()) {
            (Some(driver), Some(primary)) if !primary.is_empty() => (driver, primary),
            (driver, primary) => {
                let missing = if driver.is_none() {
                    InvalidArgument::MissingDriver
                } else {
                    InvalidArgument::MissingBuffer
                };
                self.driver = driver;
                self.primary = primary;
                return Err(missing.into());
            }
        };

        let (width, height) = (driver.width(), driver.height());
        let size = if self.buffer_size > 0 {
            self.buffer_size
        } else {
            usize::from(width) * usize::from(height) * BRIDGE_COLOR_FORMAT.bytes_per_pixel()
        };
        let buffers = DrawBuffers {
            primary,
            secondary: self.secondary.take(),
            size,
        };
        let checked = self
            .time_source
            .ok_or(InvalidArgument::MissingTimeSource)
            .and_then(|time_source| check_buffers(&buffers).map(|()| time_source));

        match checked {
            Ok(time_source) => Ok(Plan {
                width,
                height,
                time_source,
                driver,
                buffers,
            }),
            Err(err) => {
                self.restore(driver, buffers);
                Err(err.into())
            }
        }
    }

    fn restore(&mut self, driver: &'a mut dyn DisplayDriver, buffers: DrawBuffers<'a>) {
        self.driver = Some(driver);
        self.primary = Some(buffers.primary);
        self.secondary = buffers.secondary;
    }

    /// Runs one pass of the engine's timers and redraws.
    ///
    /// Call once per iteration of the host's main loop. Flushes to the driver
    /// happen synchronously inside this call. Does nothing before a
    /// successful [`init`](Self::init).
    pub fn refresh(&mut self) {
        if self.session.is_some() {
            self.runtime.with_engine(|engine| {
                engine.timer_handler();
            });
        }
    }

    /// Moves the session and inputs out, leaving `self` uninitialized and
    /// handle-less. Dropping the emptied bridge is a no-op.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let emptied = Self {
            runtime: self.runtime.clone(),
            driver: None,
            primary: None,
            secondary: None,
            buffer_size: 0,
            time_source: None,
            config: self.config,
            session: None,
            resolution: None,
        };
        mem::replace(self, emptied)
    }

    /// Returns `true` once [`init`](Self::init) has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The engine session owned by this bridge, if initialized.
    #[must_use]
    pub fn session(&self) -> Option<E::Session> {
        self.session
    }

    /// Display size captured from the driver at init.
    #[must_use]
    pub fn resolution(&self) -> Option<(u16, u16)> {
        self.resolution
    }

    /// Buffer size in bytes: the resolved size once initialized, otherwise
    /// the explicit size requested (`0` = derive).
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// The bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The engine runtime this bridge belongs to.
    #[must_use]
    pub fn runtime(&self) -> &Runtime<E> {
        &self.runtime
    }
}

impl<'a, E: RenderEngine<'a>> Drop for Bridge<'a, E> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.runtime
                .with_engine(|engine| engine.delete_session(session));
            log::debug!("display session {session:?} deleted");
        }
    }
}

impl<'a, E: RenderEngine<'a>> fmt::Debug for Bridge<'a, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("session", &self.session)
            .field("resolution", &self.resolution)
            .field("buffer_size", &self.buffer_size)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Flush callback registered for every bridge session.
///
/// Forwards the rendered region to the driver attached to the session and
/// then acknowledges the flush. The acknowledgment is unconditional: an
/// engine that is never told the flush finished keeps waiting for the
/// buffer forever.
pub fn flush_to_driver(ctx: &mut dyn FlushContext<'_>, area: &Area, pixels: &[u8]) {
    match ctx.driver() {
        Some(driver) => driver.flush(pixels, Rect::from(*area)),
        None => log::warn!("flush of {area:?} dropped: no display driver attached"),
    }
    ctx.flush_ready();
}
