// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for the engine, driver and font capabilities.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::mem;

use crate::color::{Color, ColorFormat};
use crate::driver::{DisplayDriver, Rect};
use crate::engine::{
    Area, DrawBuffers, FlushCallback, FlushContext, RenderEngine, RenderMode, TimeSource,
};
use crate::font::FontFactory;

/// Session handle handed out by [`MockEngine`], numbered from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct MockSession(pub(crate) u32);

/// One recorded engine call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Init,
    SetTickSource,
    CreateSession {
        width: u16,
        height: u16,
    },
    SetBuffers {
        session: MockSession,
        size: usize,
        mode: RenderMode,
        double_buffered: bool,
    },
    SetColorFormat(MockSession, ColorFormat),
    SetFlushCallback(MockSession),
    SetUserData(MockSession),
    SetRefreshPeriod(MockSession, u32),
    SetBackground(Color),
    DeleteSession(MockSession),
    TimerHandler,
}

struct SessionState<'a> {
    id: MockSession,
    buffers: Option<DrawBuffers<'a>>,
    callback: Option<FlushCallback<'a>>,
    driver: Option<&'a mut dyn DisplayDriver>,
    pending: Vec<Area>,
    acks: usize,
}

/// Engine that records every call and flushes only what a test queues.
#[derive(Default)]
pub(crate) struct MockEngine<'a> {
    pub(crate) calls: Vec<Call>,
    pub(crate) fail_create: bool,
    next_id: u32,
    tick: Option<TimeSource>,
    sessions: Vec<SessionState<'a>>,
}

impl<'a> MockEngine<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Reads the registered tick source.
    pub(crate) fn now(&self) -> Option<u32> {
        self.tick.map(|now| now())
    }

    /// Makes the next `timer_handler` flush `area` of `session`.
    pub(crate) fn queue_flush(&mut self, session: MockSession, area: Area) {
        if let Some(state) = self.session_mut(session) {
            state.pending.push(area);
        }
    }

    /// Flush acknowledgments received for `session`.
    pub(crate) fn acks(&self, session: MockSession) -> usize {
        self.sessions
            .iter()
            .find(|s| s.id == session)
            .map_or(0, |s| s.acks)
    }

    fn session_mut(&mut self, session: MockSession) -> Option<&mut SessionState<'a>> {
        self.sessions.iter_mut().find(|s| s.id == session)
    }
}

struct SessionFlush<'s, 'a> {
    driver: &'s mut Option<&'a mut dyn DisplayDriver>,
    acks: &'s mut usize,
}

impl<'a> FlushContext<'a> for SessionFlush<'_, 'a> {
    fn driver(&mut self) -> Option<&mut (dyn DisplayDriver + 'a)> {
        self.driver.as_deref_mut()
    }

    fn flush_ready(&mut self) {
        *self.acks += 1;
    }
}

impl<'a> RenderEngine<'a> for MockEngine<'a> {
    type Session = MockSession;

    fn init(&mut self) {
        self.calls.push(Call::Init);
    }

    fn set_tick_source(&mut self, source: TimeSource) {
        self.calls.push(Call::SetTickSource);
        self.tick = Some(source);
    }

    fn create_session(&mut self, width: u16, height: u16) -> Option<MockSession> {
        self.calls.push(Call::CreateSession { width, height });
        if self.fail_create {
            return None;
        }
        let id = MockSession(self.next_id);
        self.next_id += 1;
        self.sessions.push(SessionState {
            id,
            buffers: None,
            callback: None,
            driver: None,
            pending: Vec::new(),
            acks: 0,
        });
        Some(id)
    }

    fn delete_session(&mut self, session: MockSession) {
        self.calls.push(Call::DeleteSession(session));
        self.sessions.retain(|s| s.id != session);
    }

    fn set_buffers(&mut self, session: MockSession, buffers: DrawBuffers<'a>, mode: RenderMode) {
        self.calls.push(Call::SetBuffers {
            session,
            size: buffers.size,
            mode,
            double_buffered: buffers.secondary.is_some(),
        });
        if let Some(state) = self.session_mut(session) {
            state.buffers = Some(buffers);
        }
    }

    fn set_color_format(&mut self, session: MockSession, format: ColorFormat) {
        self.calls.push(Call::SetColorFormat(session, format));
    }

    fn set_flush_callback(&mut self, session: MockSession, callback: FlushCallback<'a>) {
        self.calls.push(Call::SetFlushCallback(session));
        if let Some(state) = self.session_mut(session) {
            state.callback = Some(callback);
        }
    }

    fn set_user_data(&mut self, session: MockSession, driver: &'a mut dyn DisplayDriver) {
        self.calls.push(Call::SetUserData(session));
        if let Some(state) = self.session_mut(session) {
            state.driver = Some(driver);
        }
    }

    fn set_refresh_period(&mut self, session: MockSession, period_ms: u32) {
        self.calls.push(Call::SetRefreshPeriod(session, period_ms));
    }

    fn set_background(&mut self, color: Color) {
        self.calls.push(Call::SetBackground(color));
    }

    fn timer_handler(&mut self) -> u32 {
        self.calls.push(Call::TimerHandler);
        for state in &mut self.sessions {
            let pending = mem::take(&mut state.pending);
            let Some(callback) = state.callback else {
                continue;
            };
            for area in pending {
                let wanted = area.pixel_count() * 2;
                let pixels: &[u8] = match &state.buffers {
                    Some(b) => &b.primary[..wanted.min(b.size).min(b.primary.len())],
                    None => &[],
                };
                let mut ctx = SessionFlush {
                    driver: &mut state.driver,
                    acks: &mut state.acks,
                };
                callback(&mut ctx, &area, pixels);
            }
        }
        5
    }
}

/// Flush context outside any engine, counting acknowledgments.
pub(crate) struct MockFlushContext<'a> {
    driver: Option<&'a mut dyn DisplayDriver>,
    pub(crate) acks: usize,
}

impl<'a> MockFlushContext<'a> {
    pub(crate) fn detached() -> Self {
        Self {
            driver: None,
            acks: 0,
        }
    }

    pub(crate) fn attached(driver: &'a mut dyn DisplayDriver) -> Self {
        Self {
            driver: Some(driver),
            acks: 0,
        }
    }
}

impl<'a> FlushContext<'a> for MockFlushContext<'a> {
    fn driver(&mut self) -> Option<&mut (dyn DisplayDriver + 'a)> {
        self.driver.as_deref_mut()
    }

    fn flush_ready(&mut self) {
        self.acks += 1;
    }
}

/// Driver that logs each flushed rect and pixel byte count.
pub(crate) struct RecordingDriver {
    width: u16,
    height: u16,
    log: Rc<RefCell<Vec<(Rect, usize)>>>,
}

impl RecordingDriver {
    pub(crate) fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            log: Rc::default(),
        }
    }

    /// Shared handle to the flush log, readable while the driver is lent out.
    pub(crate) fn log(&self) -> Rc<RefCell<Vec<(Rect, usize)>>> {
        Rc::clone(&self.log)
    }
}

impl DisplayDriver for RecordingDriver {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn flush(&mut self, pixels: &[u8], area: Rect) {
        self.log.borrow_mut().push((area, pixels.len()));
    }
}

/// Font handle issued by [`MockFonts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MockFont(pub(crate) u32);

/// Font factory with scripted failures.
///
/// An empty blob never loads; otherwise creation fails for the number of
/// attempts set by [`fail_next`](Self::fail_next) and then succeeds.
#[derive(Debug, Default)]
pub(crate) struct MockFonts {
    next_id: u32,
    failures_left: u32,
    live: Vec<MockFont>,
    created: usize,
    destroyed: usize,
}

impl MockFonts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next(&mut self, attempts: u32) {
        self.failures_left = attempts;
    }

    pub(crate) fn live(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn created(&self) -> usize {
        self.created
    }

    pub(crate) fn destroyed(&self) -> usize {
        self.destroyed
    }
}

impl FontFactory for MockFonts {
    type Font = MockFont;

    fn create_font(&mut self, data: &[u8]) -> Option<MockFont> {
        if data.is_empty() {
            return None;
        }
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return None;
        }
        let font = MockFont(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.live.push(font);
        Some(font)
    }

    fn destroy_font(&mut self, font: MockFont) {
        assert!(
            self.live.contains(&font),
            "{font:?} destroyed twice or never created"
        );
        self.live.retain(|f| *f != font);
        self.destroyed += 1;
    }
}
