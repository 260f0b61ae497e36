// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory display panel.

use fresco_core::driver::{DisplayDriver, Rect};

/// [`DisplayDriver`] backed by an RGB565 framebuffer.
///
/// Every flush is blitted into the framebuffer (clipped to the panel) and its
/// rect recorded, so a host or test can inspect both what reached the panel
/// and how it was delivered.
#[derive(Clone, Debug)]
pub struct FramebufferDisplay {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
    flushes: Vec<Rect>,
}

impl FramebufferDisplay {
    /// Creates a black `width` × `height` panel.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; usize::from(width) * usize::from(height)],
            flushes: Vec::new(),
        }
    }

    /// The RGB565 word at `(x, y)`, or `None` outside the panel.
    #[must_use]
    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    /// The whole framebuffer, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Rects of every flush received, in order.
    #[must_use]
    pub fn flushes(&self) -> &[Rect] {
        &self.flushes
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u16::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u16::try_from(y).ok().filter(|&y| y < self.height)?;
        Some(usize::from(y) * usize::from(self.width) + usize::from(x))
    }
}

impl DisplayDriver for FramebufferDisplay {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn flush(&mut self, pixels: &[u8], area: Rect) {
        self.flushes.push(area);
        let expected = area.pixel_count() * 2;
        if pixels.len() < expected {
            log::warn!(
                "flush of {area:?} carried {} bytes, expected {expected}",
                pixels.len()
            );
        }
        let row_bytes = area.width() as usize * 2;
        if row_bytes == 0 {
            return;
        }
        for (row, y) in pixels.chunks_exact(row_bytes).zip(area.y1..=area.y2) {
            for (px, x) in row.chunks_exact(2).zip(area.x1..=area.x2) {
                if let Some(idx) = self.index(x, y) {
                    self.pixels[idx] = u16::from_ne_bytes([px[0], px[1]]);
                }
            }
        }
    }
}
