// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering bridge and font resource management for retained-mode GUI
//! engines on small displays.
//!
//! `fresco_core` sits between a framebuffer-oriented display driver and a
//! GUI rendering engine that owns widgets, layout, and drawing. The engine
//! knows nothing about how pixels reach the panel; the bridge hands it draw
//! buffers, a millisecond tick, and a flush channel, then forwards every
//! rendered region to the driver. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   host main loop
//!       │ refresh()
//!       ▼
//!   Bridge ──► Runtime<E> ──► RenderEngine::timer_handler()
//!                                   │ flush callback (area, pixels)
//!                                   ▼
//!                             flush_to_driver ──► DisplayDriver::flush()
//!                                   │
//!                                   └──► FlushContext::flush_ready()
//! ```
//!
//! **[`bridge`]**: [`Bridge`](bridge::Bridge): session ownership, the
//! `Uninitialized → Initialized` state machine, and the flush protocol.
//!
//! **[`runtime`]**: [`Runtime`](runtime::Runtime), the one engine runtime
//! shared by every bridge, with init-once and last-writer-wins tick
//! registration.
//!
//! **[`engine`]**: The [`RenderEngine`](engine::RenderEngine) capability
//! contract that engine bindings implement.
//!
//! **[`driver`]**: The [`DisplayDriver`](driver::DisplayDriver) capability
//! contract and its dirty [`Rect`](driver::Rect).
//!
//! **[`font`]**: Retry-with-backoff font loading into host-owned
//! [`FontSlot`](font::FontSlot)s.
//!
//! **[`color`]**: Colors and the fixed 16-bit pixel format.
//!
//! **[`error`]**: [`BridgeError`](error::BridgeError).
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables [`StdDelay`](font::StdDelay), a
//!   thread-sleep [`Delay`](font::Delay) for desktop hosts.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bridge;
pub mod color;
pub mod driver;
pub mod engine;
pub mod error;
pub mod font;
pub mod runtime;

#[cfg(test)]
mod testing;
