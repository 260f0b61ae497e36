// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless software rendering engine.
//!
//! [`SoftEngine`] implements the engine side of the bridge contract on the
//! CPU. Each display session owns one screen, made of a background color and
//! a stack of solid rectangles, which is enough to exercise buffer
//! assignment, invalidation, banded partial rendering, double-buffering and
//! the flush handshake end to end.
//!
//! Sessions are addressed by generational [`SessionId`] handles; a handle to
//! a deleted session is ignored by every call. The oldest live session is the
//! default display, and its screen is the one [`fill_rect`], [`invalidate`]
//! and [`RenderEngine::set_background`] act on.
//!
//! [`fill_rect`]: SoftEngine::fill_rect
//! [`invalidate`]: SoftEngine::invalidate

use core::fmt;

use fresco_core::color::{Color, ColorFormat};
use fresco_core::driver::DisplayDriver;
use fresco_core::engine::{
    Area, DrawBuffers, FlushCallback, FlushContext, RenderEngine, RenderMode, TimeSource,
};
use fresco_core::font::FontFactory;

/// Redraw period of a session that never had one set.
pub const DEFAULT_REFRESH_PERIOD_MS: u32 = 33;

/// Returned by [`RenderEngine::timer_handler`] when no timer is pending.
pub const NO_TIMER_READY: u32 = u32::MAX;

/// Bytes available for font objects in a [`SoftEngine::new`] engine.
pub const DEFAULT_FONT_HEAP: usize = 64 * 1024;

/// Tag of the header section that opens every binary font blob.
///
/// A blob starts with a little-endian section length followed by this tag.
pub const FONT_HEAD_TAG: [u8; 4] = *b"head";

/// A handle to a display session in a [`SoftEngine`].
///
/// Contains both a slot index and a generation counter so that a handle to a
/// deleted session is never confused with a later session in the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    idx: u32,
    generation: u32,
}

impl SessionId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}@gen{})", self.idx, self.generation)
    }
}

/// A font object allocated from the engine's font heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimFont {
    id: u32,
    bytes: usize,
}

impl SimFont {
    /// Engine-unique font number.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Heap bytes held by the font.
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.bytes
    }
}

struct Screen {
    background: Color,
    rects: Vec<(Area, Color)>,
}

impl Screen {
    fn color_at(&self, x: i32, y: i32) -> Color {
        self.rects
            .iter()
            .rev()
            .find(|(area, _)| contains(*area, x, y))
            .map_or(self.background, |&(_, color)| color)
    }

    fn render(&self, band: Area, bytes_per_pixel: usize, pixels: &mut [u8]) {
        let row_bytes = band.width() as usize * bytes_per_pixel;
        for (row, y) in pixels.chunks_exact_mut(row_bytes).zip(band.y1..=band.y2) {
            for (px, x) in row.chunks_exact_mut(bytes_per_pixel).zip(band.x1..=band.x2) {
                px.copy_from_slice(&self.color_at(x, y).to_rgb565().to_ne_bytes());
            }
        }
    }
}

fn contains(area: Area, x: i32, y: i32) -> bool {
    (area.x1..=area.x2).contains(&x) && (area.y1..=area.y2).contains(&y)
}

/// Flush context handed to the session's callback for one band.
struct SimFlush<'s, 'a> {
    driver: &'s mut Option<&'a mut dyn DisplayDriver>,
    ready: bool,
}

impl<'a> FlushContext<'a> for SimFlush<'_, 'a> {
    fn driver(&mut self) -> Option<&mut (dyn DisplayDriver + 'a)> {
        self.driver.as_deref_mut()
    }

    fn flush_ready(&mut self) {
        self.ready = true;
    }
}

struct Session<'a> {
    id: SessionId,
    width: u16,
    height: u16,
    buffers: Option<DrawBuffers<'a>>,
    mode: RenderMode,
    format: ColorFormat,
    callback: Option<FlushCallback<'a>>,
    driver: Option<&'a mut dyn DisplayDriver>,
    period_ms: u32,
    last_redraw: Option<u32>,
    screen: Screen,
    invalid: Option<Area>,
    use_secondary: bool,
    stalled: bool,
    flushes: usize,
}

impl Session<'_> {
    fn screen_area(&self) -> Area {
        Area::screen(self.width, self.height)
    }

    fn invalidate(&mut self, area: Area) {
        let Some(area) = area.intersect(self.screen_area()) else {
            return;
        };
        self.invalid = Some(self.invalid.map_or(area, |dirty| dirty.union(area)));
    }

    /// Renders the invalid region and flushes it band by band.
    fn redraw(&mut self) {
        if self.stalled {
            return;
        }
        let (Some(callback), Some(buffers)) = (self.callback, self.buffers.as_mut()) else {
            return;
        };
        let Some(dirty) = self.invalid.take() else {
            return;
        };

        let region = match self.mode {
            RenderMode::Full => Area::screen(self.width, self.height),
            RenderMode::Partial => dirty,
        };
        let bytes_per_pixel = self.format.bytes_per_pixel();
        let row_bytes = region.width() as usize * bytes_per_pixel;
        let rows = (buffers.size / row_bytes.max(1)).min(region.height() as usize);
        let Some(rows) = i32::try_from(rows).ok().filter(|&rows| rows > 0) else {
            log::error!(
                "{:?}: a {} byte draw buffer cannot hold one {row_bytes} byte row",
                self.id,
                buffers.size
            );
            self.stalled = true;
            return;
        };

        let mut y1 = region.y1;
        while y1 <= region.y2 {
            let band = Area::new(region.x1, y1, region.x2, (y1 + rows - 1).min(region.y2));
            let len = band.height() as usize * row_bytes;
            let target = match (&mut buffers.secondary, self.use_secondary) {
                (Some(secondary), true) => secondary,
                _ => &mut buffers.primary,
            };
            let Some(pixels) = target.get_mut(..len) else {
                log::error!("{:?}: draw buffer shorter than {len} bytes", self.id);
                self.stalled = true;
                return;
            };

            self.screen.render(band, bytes_per_pixel, pixels);
            let mut ctx = SimFlush {
                driver: &mut self.driver,
                ready: false,
            };
            callback(&mut ctx, &band, pixels);
            let ready = ctx.ready;
            self.flushes += 1;

            if !ready {
                log::error!(
                    "{:?}: flush of {band:?} was never acknowledged; session stalled",
                    self.id
                );
                self.stalled = true;
                return;
            }
            if buffers.secondary.is_some() {
                self.use_secondary = !self.use_secondary;
            }
            y1 = band.y2 + 1;
        }
    }
}

/// CPU implementation of [`RenderEngine`] and [`FontFactory`].
///
/// The lifetime `'a` bounds the draw buffers and display drivers lent to
/// sessions.
pub struct SoftEngine<'a> {
    initialized: bool,
    tick: Option<TimeSource>,
    slots: Vec<Option<Session<'a>>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    default_session: Option<SessionId>,
    font_heap_free: usize,
    fonts: Vec<SimFont>,
    next_font: u32,
    failing_fonts: u32,
}

impl<'a> SoftEngine<'a> {
    /// Creates an uninitialized engine with a [`DEFAULT_FONT_HEAP`] font
    /// heap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_font_heap(DEFAULT_FONT_HEAP)
    }

    /// Creates an uninitialized engine whose font heap holds `bytes`.
    #[must_use]
    pub fn with_font_heap(bytes: usize) -> Self {
        Self {
            initialized: false,
            tick: None,
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            default_session: None,
            font_heap_free: bytes,
            fonts: Vec::new(),
            next_font: 0,
            failing_fonts: 0,
        }
    }

    /// Returns whether [`RenderEngine::init`] has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns whether `id` refers to a live session.
    #[must_use]
    pub fn is_alive(&self, id: SessionId) -> bool {
        self.session(id).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// The session whose screen is active, if any.
    #[must_use]
    pub fn default_session(&self) -> Option<SessionId> {
        self.default_session
    }

    /// Flushes issued for `id` so far.
    #[must_use]
    pub fn flush_count(&self, id: SessionId) -> usize {
        self.session(id).map_or(0, |s| s.flushes)
    }

    /// Returns `true` if `id` stopped rendering after an unacknowledged flush
    /// or an unusable draw buffer.
    #[must_use]
    pub fn is_stalled(&self, id: SessionId) -> bool {
        self.session(id).is_some_and(|s| s.stalled)
    }

    /// Redraw period of `id`.
    #[must_use]
    pub fn refresh_period(&self, id: SessionId) -> Option<u32> {
        self.session(id).map(|s| s.period_ms)
    }

    /// Pixel format of `id`'s buffers.
    #[must_use]
    pub fn color_format(&self, id: SessionId) -> Option<ColorFormat> {
        self.session(id).map(|s| s.format)
    }

    /// Background color of `id`'s screen.
    #[must_use]
    pub fn background(&self, id: SessionId) -> Option<Color> {
        self.session(id).map(|s| s.screen.background)
    }

    /// Paints a solid rectangle on the active screen and invalidates it.
    pub fn fill_rect(&mut self, area: Area, color: Color) {
        let Some(session) = self.default_session_mut() else {
            log::warn!("fill_rect without a display session");
            return;
        };
        if area.intersect(session.screen_area()) == Some(session.screen_area()) {
            session.screen.rects.clear();
        }
        session.screen.rects.push((area, color));
        session.invalidate(area);
    }

    /// Marks `area` of the active screen for redraw.
    pub fn invalidate(&mut self, area: Area) {
        if let Some(session) = self.default_session_mut() {
            session.invalidate(area);
        }
    }

    /// Makes the next `attempts` font creations fail as if the heap were
    /// fragmented.
    pub fn fail_next_fonts(&mut self, attempts: u32) {
        self.failing_fonts = attempts;
    }

    /// Font objects created and not yet destroyed.
    #[must_use]
    pub fn live_fonts(&self) -> usize {
        self.fonts.len()
    }

    /// Unallocated font heap bytes.
    #[must_use]
    pub fn font_heap_free(&self) -> usize {
        self.font_heap_free
    }

    fn session(&self, id: SessionId) -> Option<&Session<'a>> {
        let idx = id.idx as usize;
        if self.generation.get(idx) != Some(&id.generation) {
            return None;
        }
        self.slots.get(idx)?.as_ref()
    }

    fn session_mut(&mut self, id: SessionId) -> Option<&mut Session<'a>> {
        let idx = id.idx as usize;
        if self.generation.get(idx) != Some(&id.generation) {
            return None;
        }
        self.slots.get_mut(idx)?.as_mut()
    }

    fn default_session_mut(&mut self) -> Option<&mut Session<'a>> {
        let id = self.default_session?;
        self.session_mut(id)
    }

    fn allocate_slot(&mut self) -> Option<SessionId> {
        if let Some(idx) = self.free_list.pop() {
            let generation = *self.generation.get(idx as usize)?;
            return Some(SessionId { idx, generation });
        }
        let idx = u32::try_from(self.slots.len()).ok()?;
        self.slots.push(None);
        self.generation.push(0);
        Some(SessionId { idx, generation: 0 })
    }
}

impl Default for SoftEngine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SoftEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftEngine")
            .field("initialized", &self.initialized)
            .field("tick_source", &self.tick.is_some())
            .field("sessions", &self.session_count())
            .field("default_session", &self.default_session)
            .field("live_fonts", &self.fonts.len())
            .field("font_heap_free", &self.font_heap_free)
            .finish_non_exhaustive()
    }
}

impl<'a> RenderEngine<'a> for SoftEngine<'a> {
    type Session = SessionId;

    fn init(&mut self) {
        if !self.initialized {
            self.initialized = true;
            log::debug!("soft engine initialized");
        }
    }

    fn set_tick_source(&mut self, source: TimeSource) {
        self.tick = Some(source);
    }

    fn create_session(&mut self, width: u16, height: u16) -> Option<SessionId> {
        if !self.initialized {
            log::warn!("display session requested before engine init");
            return None;
        }
        if width == 0 || height == 0 {
            log::warn!("refusing {width}x{height} display session");
            return None;
        }
        let id = self.allocate_slot()?;
        let mut session = Session {
            id,
            width,
            height,
            buffers: None,
            mode: RenderMode::Full,
            format: ColorFormat::default(),
            callback: None,
            driver: None,
            period_ms: DEFAULT_REFRESH_PERIOD_MS,
            last_redraw: None,
            screen: Screen {
                background: Color::WHITE,
                rects: Vec::new(),
            },
            invalid: None,
            use_secondary: false,
            stalled: false,
            flushes: 0,
        };
        session.invalidate(session.screen_area());
        *self.slots.get_mut(id.idx as usize)? = Some(session);
        if self.default_session.is_none() {
            self.default_session = Some(id);
        }
        log::debug!("{id:?}: {width}x{height} display session created");
        Some(id)
    }

    fn delete_session(&mut self, session: SessionId) {
        if !self.is_alive(session) {
            return;
        }
        let idx = session.idx as usize;
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = None;
        }
        if let Some(generation) = self.generation.get_mut(idx) {
            *generation = generation.wrapping_add(1);
        }
        self.free_list.push(session.idx);
        if self.default_session == Some(session) {
            self.default_session = self.slots.iter().flatten().map(|s| s.id).next();
        }
        log::debug!("{session:?}: display session deleted");
    }

    fn set_buffers(&mut self, session: SessionId, buffers: DrawBuffers<'a>, mode: RenderMode) {
        if let Some(s) = self.session_mut(session) {
            s.buffers = Some(buffers);
            s.mode = mode;
            s.use_secondary = false;
            s.invalidate(s.screen_area());
        }
    }

    fn set_color_format(&mut self, session: SessionId, format: ColorFormat) {
        if let Some(s) = self.session_mut(session) {
            s.format = format;
        }
    }

    fn set_flush_callback(&mut self, session: SessionId, callback: FlushCallback<'a>) {
        if let Some(s) = self.session_mut(session) {
            s.callback = Some(callback);
        }
    }

    fn set_user_data(&mut self, session: SessionId, driver: &'a mut dyn DisplayDriver) {
        if let Some(s) = self.session_mut(session) {
            s.driver = Some(driver);
        }
    }

    fn set_refresh_period(&mut self, session: SessionId, period_ms: u32) {
        if let Some(s) = self.session_mut(session) {
            s.period_ms = period_ms;
        }
    }

    fn set_background(&mut self, color: Color) {
        if let Some(session) = self.default_session_mut() {
            session.screen.background = color;
            session.invalidate(session.screen_area());
        }
    }

    /// Redraws every session whose period has elapsed. Returns the
    /// milliseconds until the next session is due, or [`NO_TIMER_READY`].
    fn timer_handler(&mut self) -> u32 {
        let now = self.tick.map_or(0, |tick| tick());
        let mut next = NO_TIMER_READY;
        for session in self.slots.iter_mut().flatten() {
            match session.last_redraw.map(|last| now.wrapping_sub(last)) {
                Some(elapsed) if elapsed < session.period_ms => {
                    next = next.min(session.period_ms - elapsed);
                }
                _ => {
                    session.last_redraw = Some(now);
                    session.redraw();
                    next = next.min(session.period_ms);
                }
            }
        }
        next
    }
}

impl FontFactory for SoftEngine<'_> {
    type Font = SimFont;

    fn create_font(&mut self, data: &[u8]) -> Option<SimFont> {
        if self.failing_fonts > 0 {
            self.failing_fonts -= 1;
            log::debug!("font allocation failed (injected)");
            return None;
        }
        if data.get(4..8) != Some(&FONT_HEAD_TAG[..]) {
            log::warn!("rejecting {} byte font blob without a header", data.len());
            return None;
        }
        if data.len() > self.font_heap_free {
            log::debug!(
                "font heap exhausted: {} bytes requested, {} free",
                data.len(),
                self.font_heap_free
            );
            return None;
        }
        self.font_heap_free -= data.len();
        let font = SimFont {
            id: self.next_font,
            bytes: data.len(),
        };
        self.next_font = self.next_font.wrapping_add(1);
        self.fonts.push(font);
        Some(font)
    }

    fn destroy_font(&mut self, font: SimFont) {
        let Some(pos) = self.fonts.iter().position(|f| *f == font) else {
            log::warn!("destroying unknown font {}", font.id);
            return;
        };
        self.fonts.swap_remove(pos);
        self.font_heap_free += font.bytes;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use fresco_core::bridge::flush_to_driver;
    use fresco_core::driver::Rect;

    use super::*;

    thread_local! {
        static NOW: Cell<u32> = const { Cell::new(0) };
    }

    fn now() -> u32 {
        NOW.with(Cell::get)
    }

    fn advance(ms: u32) {
        NOW.with(|now| now.set(now.get() + ms));
    }

    type FlushLog = Rc<RefCell<Vec<(Rect, Vec<u8>)>>>;

    struct CaptureDriver {
        width: u16,
        height: u16,
        flushes: FlushLog,
    }

    impl CaptureDriver {
        fn new(width: u16, height: u16) -> Self {
            Self {
                width,
                height,
                flushes: Rc::default(),
            }
        }
    }

    impl DisplayDriver for CaptureDriver {
        fn width(&self) -> u16 {
            self.width
        }

        fn height(&self) -> u16 {
            self.height
        }

        fn flush(&mut self, pixels: &[u8], area: Rect) {
            self.flushes.borrow_mut().push((area, pixels.to_vec()));
        }
    }

    fn never_ack(_: &mut dyn FlushContext<'_>, _: &Area, _: &[u8]) {}

    fn font_blob(len: usize) -> Vec<u8> {
        let mut blob = vec![0_u8; len];
        blob[4..8].copy_from_slice(&FONT_HEAD_TAG);
        blob
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut engine = SoftEngine::new();
        engine.init();
        let first = engine.create_session(8, 8).unwrap();
        engine.delete_session(first);
        let second = engine.create_session(8, 8).unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(!engine.is_alive(first));
        engine.set_refresh_period(first, 1);
        engine.delete_session(first);
        assert!(engine.is_alive(second));
        assert_eq!(
            engine.refresh_period(second),
            Some(DEFAULT_REFRESH_PERIOD_MS)
        );
    }

    #[test]
    fn sessions_need_init_and_a_size() {
        let mut engine = SoftEngine::new();
        assert_eq!(engine.create_session(8, 8), None);
        engine.init();
        assert_eq!(engine.create_session(0, 8), None);
        assert!(engine.create_session(8, 8).is_some());
    }

    #[test]
    fn full_mode_flushes_whole_screen_once() {
        let mut display = CaptureDriver::new(4, 3);
        let flushes = Rc::clone(&display.flushes);
        let mut buf = vec![0_u8; 4 * 3 * 2];
        let mut engine = SoftEngine::new();
        engine.init();
        engine.set_tick_source(now);
        let id = engine.create_session(4, 3).unwrap();
        engine.set_buffers(
            id,
            DrawBuffers {
                primary: &mut buf,
                secondary: None,
                size: 24,
            },
            RenderMode::Full,
        );
        engine.set_flush_callback(id, flush_to_driver);
        engine.set_user_data(id, &mut display);
        engine.set_background(Color::rgb(0, 0, 0xff));

        engine.timer_handler();

        let flushes = flushes.borrow();
        assert_eq!(flushes.len(), 1);
        let (rect, pixels) = &flushes[0];
        assert_eq!(*rect, Rect::new(0, 0, 3, 2));
        assert_eq!(pixels.len(), 24);
        assert_eq!(&pixels[..2], &0x001f_u16.to_ne_bytes());
    }

    #[test]
    fn partial_mode_splits_into_bands() {
        let mut display = CaptureDriver::new(10, 10);
        let flushes = Rc::clone(&display.flushes);
        let mut buf = vec![0_u8; 10 * 4 * 2];
        let mut engine = SoftEngine::new();
        engine.init();
        engine.set_tick_source(now);
        let id = engine.create_session(10, 10).unwrap();
        engine.set_buffers(
            id,
            DrawBuffers {
                primary: &mut buf,
                secondary: None,
                size: 80,
            },
            RenderMode::Partial,
        );
        engine.set_flush_callback(id, flush_to_driver);
        engine.set_user_data(id, &mut display);

        engine.timer_handler();
        let rects: Vec<Rect> = flushes.borrow().iter().map(|(r, _)| *r).collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 9, 3),
                Rect::new(0, 4, 9, 7),
                Rect::new(0, 8, 9, 9),
            ]
        );

        flushes.borrow_mut().clear();
        engine.fill_rect(Area::new(2, 2, 3, 3), Color::WHITE);
        engine.invalidate(Area::new(6, 5, 7, 5));
        advance(DEFAULT_REFRESH_PERIOD_MS);
        engine.timer_handler();
        let rects: Vec<Rect> = flushes.borrow().iter().map(|(r, _)| *r).collect();
        assert_eq!(rects, vec![Rect::new(2, 2, 7, 5)]);
    }

    #[test]
    fn redraw_waits_for_the_period() {
        let mut display = CaptureDriver::new(4, 4);
        let mut buf = vec![0_u8; 32];
        let mut engine = SoftEngine::new();
        engine.init();
        engine.set_tick_source(now);
        let id = engine.create_session(4, 4).unwrap();
        engine.set_buffers(
            id,
            DrawBuffers {
                primary: &mut buf,
                secondary: None,
                size: 32,
            },
            RenderMode::Full,
        );
        engine.set_flush_callback(id, flush_to_driver);
        engine.set_user_data(id, &mut display);
        engine.set_refresh_period(id, 10);

        assert_eq!(engine.timer_handler(), 10);
        assert_eq!(engine.flush_count(id), 1);

        engine.invalidate(Area::screen(4, 4));
        advance(4);
        assert_eq!(engine.timer_handler(), 6);
        assert_eq!(engine.flush_count(id), 1);

        advance(6);
        engine.timer_handler();
        assert_eq!(engine.flush_count(id), 2);
    }

    #[test]
    fn double_buffering_alternates() {
        let mut display = CaptureDriver::new(2, 4);
        let mut primary = vec![0_u8; 8];
        let mut secondary = vec![0_u8; 8];
        let mut engine = SoftEngine::new();
        engine.init();
        let id = engine.create_session(2, 4).unwrap();
        engine.set_buffers(
            id,
            DrawBuffers {
                primary: &mut primary,
                secondary: Some(secondary.as_mut_slice()),
                size: 8,
            },
            RenderMode::Partial,
        );
        engine.set_flush_callback(id, flush_to_driver);
        engine.set_user_data(id, &mut display);
        engine.set_background(Color::WHITE);
        engine.timer_handler();
        assert_eq!(engine.flush_count(id), 2);
        drop(engine);

        assert!(primary.iter().all(|&b| b == 0xff));
        assert!(secondary.iter().all(|&b| b == 0xff));
    }

    #[test]
    fn unacknowledged_flush_stalls_session() {
        let mut display = CaptureDriver::new(10, 10);
        let mut buf = vec![0_u8; 40];
        let mut engine = SoftEngine::new();
        engine.init();
        engine.set_tick_source(now);
        let id = engine.create_session(10, 10).unwrap();
        engine.set_buffers(
            id,
            DrawBuffers {
                primary: &mut buf,
                secondary: None,
                size: 40,
            },
            RenderMode::Partial,
        );
        engine.set_flush_callback(id, never_ack);
        engine.set_user_data(id, &mut display);

        engine.timer_handler();
        assert!(engine.is_stalled(id));
        assert_eq!(engine.flush_count(id), 1);

        engine.invalidate(Area::screen(10, 10));
        advance(DEFAULT_REFRESH_PERIOD_MS);
        engine.timer_handler();
        assert_eq!(engine.flush_count(id), 1);
    }

    #[test]
    fn deleting_default_session_promotes_the_next() {
        let mut engine = SoftEngine::new();
        engine.init();
        let first = engine.create_session(8, 8).unwrap();
        let second = engine.create_session(16, 16).unwrap();
        assert_eq!(engine.default_session(), Some(first));

        engine.delete_session(first);
        assert_eq!(engine.default_session(), Some(second));
        engine.set_background(Color::hex(0x00_ff_00));
        assert_eq!(engine.background(second), Some(Color::hex(0x00_ff_00)));
    }

    #[test]
    fn fonts_need_a_header_and_heap() {
        let mut engine = SoftEngine::with_font_heap(100);
        assert_eq!(engine.create_font(&[0; 64]), None);
        assert_eq!(engine.create_font(&font_blob(8)[..7]), None);

        let font = engine.create_font(&font_blob(60)).unwrap();
        assert_eq!(font.bytes(), 60);
        assert_eq!(engine.font_heap_free(), 40);
        assert_eq!(engine.create_font(&font_blob(60)), None);

        engine.destroy_font(font);
        assert_eq!(engine.font_heap_free(), 100);
        assert_eq!(engine.live_fonts(), 0);
    }

    #[test]
    fn injected_font_failures_are_transient() {
        let mut engine = SoftEngine::new();
        engine.fail_next_fonts(2);
        let blob = font_blob(32);
        assert_eq!(engine.create_font(&blob), None);
        assert_eq!(engine.create_font(&blob), None);
        assert!(engine.create_font(&blob).is_some());
        assert_eq!(engine.live_fonts(), 1);
    }
}
