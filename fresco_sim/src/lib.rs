// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Desktop simulation for `fresco_core`.
//!
//! Runs a bridge without a panel or a GUI library: [`SoftEngine`] renders on
//! the CPU, [`FramebufferDisplay`] stands in for the panel, and
//! [`clock::millis`] supplies the tick.
//!
//! ```rust,ignore
//! let mut panel = FramebufferDisplay::new(320, 240);
//! let mut buf = vec![0_u8; 320 * 240 * 2];
//! let runtime = Runtime::new(SoftEngine::new());
//! let mut bridge = Bridge::builder(&runtime)
//!     .driver(&mut panel)
//!     .buffer(&mut buf)
//!     .time_source(clock::millis)
//!     .build();
//! bridge.init()?;
//! bridge.refresh();
//! ```

pub mod clock;
pub mod display;
pub mod engine;

pub use display::FramebufferDisplay;
pub use engine::{SessionId, SimFont, SoftEngine};
pub use fresco_core::font::StdDelay;
