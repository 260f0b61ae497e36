// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared engine runtime.
//!
//! A retained-mode engine is a process-wide resource: there is exactly one
//! runtime and at most one active tick source. [`Runtime`] makes that state
//! an explicit object instead of hiding it inside each bridge. Clones of a
//! `Runtime` are handles to the same engine, so every bridge built from one
//! runtime shares:
//!
//! - **Initialization**: the engine's `init()` runs on the first
//!   [`ensure_initialized`](Runtime::ensure_initialized) and never again.
//! - **Tick source**: [`register_tick_source`](Runtime::register_tick_source)
//!   overwrites whatever was registered before. The last writer wins; there
//!   is no per-bridge tick source.
//!
//! The runtime is single-threaded (`!Send`, `!Sync`). The engine is borrowed
//! mutably for the duration of each call into it, so re-entering the runtime
//! from inside [`RenderEngine::timer_handler`] (for example by refreshing a
//! bridge from a display driver's `flush`) panics instead of corrupting
//! engine state.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::engine::{RenderEngine, TimeSource};

struct State<E> {
    engine: E,
    initialized: bool,
    tick_source: Option<TimeSource>,
}

/// Shared handle to the process-wide engine runtime.
pub struct Runtime<E> {
    state: Rc<RefCell<State<E>>>,
}

impl<E> Clone for Runtime<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E> Runtime<E> {
    /// Wraps an engine that has not been initialized yet.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                engine,
                initialized: false,
                tick_source: None,
            })),
        }
    }

    /// Returns whether the engine runtime has been initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Returns whether a tick source is registered.
    #[must_use]
    pub fn has_tick_source(&self) -> bool {
        self.state.borrow().tick_source.is_some()
    }

    /// Reads the registered tick source, if any.
    #[must_use]
    pub fn now_ms(&self) -> Option<u32> {
        let source = self.state.borrow().tick_source;
        source.map(|now| now())
    }

    /// Returns `true` if `other` is a handle to the same runtime.
    #[must_use]
    pub fn same_runtime(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Runs `f` with exclusive access to the engine.
    ///
    /// # Panics
    ///
    /// Panics if called while the engine is already borrowed, i.e. from
    /// inside a flush callback.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.state.borrow_mut().engine)
    }

    /// Initializes the engine runtime if no one has yet.
    ///
    /// Safe to call from every bridge and from the host; only the first call
    /// reaches the engine.
    pub fn ensure_initialized<'a>(&self)
    where
        E: RenderEngine<'a>,
    {
        let mut state = self.state.borrow_mut();
        if state.initialized {
            return;
        }
        state.engine.init();
        state.initialized = true;
        log::debug!("engine runtime initialized");
    }

    /// Makes `source` the engine's tick source, replacing any previous one.
    pub fn register_tick_source<'a>(&self, source: TimeSource)
    where
        E: RenderEngine<'a>,
    {
        let mut state = self.state.borrow_mut();
        if state.tick_source.is_some() {
            log::debug!("replacing registered tick source");
        }
        state.engine.set_tick_source(source);
        state.tick_source = Some(source);
    }
}

impl<E> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Runtime")
                .field("initialized", &state.initialized)
                .field("tick_source", &state.tick_source.is_some())
                .field("handles", &Rc::strong_count(&self.state))
                .finish_non_exhaustive(),
            Err(_) => f.write_str("Runtime(<engine in use>)"),
        }
    }
}
