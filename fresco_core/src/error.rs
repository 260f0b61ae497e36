// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridge errors.
//!
//! [`BridgeError::InvalidArgument`] covers caller-fixable problems detected
//! before any engine call. [`BridgeError::HardwareInitFailed`] means the
//! engine refused to create a display session; hosts should treat it as a
//! boot fault.
//!
//! Font loading has no error type: exhausting retries is a soft failure that
//! leaves the font's slot empty.

/// Caller-fixable problem with the inputs of a [`Bridge`](crate::bridge::Bridge).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum InvalidArgument {
    /// No display driver was supplied.
    #[error("display driver required")]
    MissingDriver,
    /// No primary draw buffer was supplied, or it is empty.
    #[error("draw buffer required")]
    MissingBuffer,
    /// No tick source was supplied.
    #[error("time source required")]
    MissingTimeSource,
    /// The buffer size resolved to zero bytes (explicit size omitted and the
    /// driver reports a zero dimension).
    #[error("draw buffer size resolved to zero")]
    ZeroBufferSize,
    /// A draw buffer is shorter than the buffer size handed to the engine.
    #[error("draw buffer holds {provided} bytes but {required} are required")]
    BufferTooSmall {
        /// Bytes the engine will use.
        required: usize,
        /// Bytes in the supplied buffer.
        provided: usize,
    },
}

/// Reason [`Bridge::init`](crate::bridge::Bridge::init) failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum BridgeError {
    /// An input was missing or inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    /// The engine could not create a display session.
    #[error("rendering engine could not create a {width}x{height} display session")]
    HardwareInitFailed {
        /// Requested session width.
        width: u16,
        /// Requested session height.
        height: u16,
    },
}

impl BridgeError {
    /// Returns `true` for errors the caller can fix by supplying different
    /// inputs.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` if the engine refused to create the display session.
    #[must_use]
    pub const fn is_hardware(&self) -> bool {
        matches!(self, Self::HardwareInitFailed { .. })
    }
}
