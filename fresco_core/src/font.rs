// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font resource management.
//!
//! Binary font blobs live in read-only memory; the engine turns a blob into a
//! font object allocated on its own heap. Allocation can fail transiently when
//! that heap is fragmented, so creation is retried with exponential backoff
//! ([`RetryPolicy`]).
//!
//! The manager keeps no state of its own. Each [`FontEntry`] points at a
//! host-owned [`FontSlot`], and the slot is the only record of whether the
//! font is loaded. Slots and entries can be `static`, so the table itself can
//! sit in read-only memory with only the slots in RAM:
//!
//! - [`FontLoader::load_essential`] fills the empty slots of essential
//!   entries (boot, splash screen).
//! - [`FontLoader::load`] fills every empty slot.
//! - [`unload`] destroys every loaded font and empties its slot.
//! - [`count_loaded`] counts populated slots.
//!
//! Loading and unloading are idempotent. Exhausting the retries for one entry
//! is a soft failure: the slot stays empty, a warning is logged, and the
//! remaining entries are still processed.
//!
//! Retrying blocks the caller for up to
//! [`RetryPolicy::worst_case_delay_ms`]. Load fonts at startup or on explicit
//! demand, never from the refresh path.
//!
//! ```rust,ignore
//! static SPLASH: FontSlot<SimFont> = FontSlot::new();
//! static BODY: FontSlot<SimFont> = FontSlot::new();
//! static FONTS: [FontEntry<'static, SimFont>; 2] = [
//!     FontEntry::new(&SPLASH, SPLASH_BIN, "splash").essential(),
//!     FontEntry::new(&BODY, BODY_BIN, "body"),
//! ];
//!
//! let mut loader = FontLoader::new(StdDelay);
//! loader.load_essential(&mut engine, &FONTS);
//! // ...splash screen...
//! loader.load(&mut engine, &FONTS);
//! ```

use core::fmt;

use spin::Mutex;

/// Engine capability that turns font blobs into font objects.
pub trait FontFactory {
    /// Handle to an engine-owned font object.
    type Font;

    /// Creates a font object from a binary font blob, or `None` if the engine
    /// could not (malformed blob, allocation failure).
    fn create_font(&mut self, data: &[u8]) -> Option<Self::Font>;

    /// Destroys a font object created by [`create_font`](Self::create_font).
    fn destroy_font(&mut self, font: Self::Font);
}

/// Host-owned storage for one loaded font.
///
/// An empty slot means "not loaded". Dropping a populated slot does not
/// destroy its font; call [`unload`] or [`free_font`] first.
///
/// The slot is `Sync` when the font handle is `Send`, so it can be a
/// `static`. The lock is held only for the duration of each access.
pub struct FontSlot<F>(Mutex<Option<F>>);

impl<F> FontSlot<F> {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self(Mutex::new(None))
    }

    /// Returns `true` if the slot holds a font.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.0.lock().is_some()
    }

    /// Returns a copy of the font handle, if loaded.
    #[must_use]
    pub fn get(&self) -> Option<F>
    where
        F: Clone,
    {
        self.0.lock().clone()
    }

    fn put(&self, font: F) {
        *self.0.lock() = Some(font);
    }

    fn take(&self) -> Option<F> {
        self.0.lock().take()
    }
}

impl<F> Default for FontSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for FontSlot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_lock() {
            Some(font) => write!(f, "FontSlot(loaded: {})", font.is_some()),
            None => f.write_str("FontSlot(<locked>)"),
        }
    }
}

/// One row of the host's font table.
///
/// Entries are immutable; loading writes only to the slot they point at.
pub struct FontEntry<'s, F> {
    /// Slot the loaded font is stored in.
    pub target: &'s FontSlot<F>,
    /// Binary font blob.
    pub data: &'s [u8],
    /// Name used in log messages.
    pub name: &'s str,
    /// Loaded by [`FontLoader::load_essential`].
    pub essential: bool,
}

impl<'s, F> FontEntry<'s, F> {
    /// Creates a non-essential entry.
    #[must_use]
    pub const fn new(target: &'s FontSlot<F>, data: &'s [u8], name: &'s str) -> Self {
        Self {
            target,
            data,
            name,
            essential: false,
        }
    }

    /// Marks the entry as essential.
    #[must_use]
    pub const fn essential(mut self) -> Self {
        self.essential = true;
        self
    }
}

impl<F> Clone for FontEntry<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for FontEntry<'_, F> {}

impl<F> fmt::Debug for FontEntry<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontEntry")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .field("essential", &self.essential)
            .field("target", self.target)
            .finish()
    }
}

/// Bounded retry with exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    /// Creation attempts per font, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further one.
    pub base_delay_ms: u32,
}

impl RetryPolicy {
    /// Five attempts starting at 10 ms.
    pub const DEFAULT: Self = Self::new(5, 10);

    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay_ms: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    /// Delay after failed attempt number `attempt` (zero-based):
    /// `base_delay_ms << attempt`, saturating at `u32::MAX`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> u32 {
        let shifted = u64::from(self.base_delay_ms) << attempt.min(32);
        u32::try_from(shifted).unwrap_or(u32::MAX)
    }

    /// Total time a font that never loads blocks the caller.
    #[must_use]
    pub fn worst_case_delay_ms(&self) -> u32 {
        (0..self.max_attempts).fold(0_u32, |total, attempt| {
            total.saturating_add(self.delay_after(attempt))
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Blocking millisecond delay used between retries.
pub trait Delay {
    /// Blocks for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

impl<F: FnMut(u32)> Delay for F {
    fn delay_ms(&mut self, ms: u32) {
        self(ms);
    }
}

/// Retries immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

/// Sleeps the current thread.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(core::time::Duration::from_millis(ms.into()));
    }
}

/// Outcome of one [`FontLoader::load`] or [`FontLoader::load_essential`]
/// pass.
///
/// Informational: a failed font is never an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LoadSummary {
    /// Entries with an empty slot that were tried.
    pub attempted: usize,
    /// Entries whose font was created.
    pub loaded: usize,
    /// Entries that exhausted their retries.
    pub failed: usize,
}

impl LoadSummary {
    /// Returns `true` if every attempted font loaded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Loads font tables under a [`RetryPolicy`].
#[derive(Debug)]
pub struct FontLoader<D> {
    policy: RetryPolicy,
    delay: D,
}

impl<D: Delay> FontLoader<D> {
    /// Creates a loader with [`RetryPolicy::DEFAULT`].
    #[must_use]
    pub fn new(delay: D) -> Self {
        Self {
            policy: RetryPolicy::DEFAULT,
            delay,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The retry policy in use.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Creates one font, retrying on failure.
    ///
    /// Every failed attempt is followed by the policy's backoff delay,
    /// including the last one. Returns `None` once all attempts failed.
    pub fn load_font<P: FontFactory>(&mut self, factory: &mut P, data: &[u8]) -> Option<P::Font> {
        for attempt in 0..self.policy.max_attempts {
            if let Some(font) = factory.create_font(data) {
                return Some(font);
            }
            self.delay.delay_ms(self.policy.delay_after(attempt));
        }
        None
    }

    /// Loads every entry whose slot is empty.
    pub fn load<P: FontFactory>(
        &mut self,
        factory: &mut P,
        entries: &[FontEntry<'_, P::Font>],
    ) -> LoadSummary {
        self.load_matching(factory, entries, |_| true)
    }

    /// Loads every essential entry whose slot is empty. Non-essential entries
    /// are not touched.
    pub fn load_essential<P: FontFactory>(
        &mut self,
        factory: &mut P,
        entries: &[FontEntry<'_, P::Font>],
    ) -> LoadSummary {
        self.load_matching(factory, entries, |entry| entry.essential)
    }

    fn load_matching<P: FontFactory>(
        &mut self,
        factory: &mut P,
        entries: &[FontEntry<'_, P::Font>],
        wanted: impl Fn(&FontEntry<'_, P::Font>) -> bool,
    ) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for entry in entries.iter().filter(|&entry| wanted(entry)) {
            if entry.target.is_loaded() {
                continue;
            }
            summary.attempted += 1;
            match self.load_font(factory, entry.data) {
                Some(font) => {
                    entry.target.put(font);
                    summary.loaded += 1;
                    log::debug!("font `{}` loaded ({} bytes)", entry.name, entry.data.len());
                }
                None => {
                    summary.failed += 1;
                    log::warn!(
                        "font `{}` not loaded after {} attempts",
                        entry.name,
                        self.policy.max_attempts
                    );
                }
            }
        }
        summary
    }
}

/// Destroys every loaded font in `entries` and empties its slot.
///
/// Returns the number of fonts destroyed. Must run before the engine that
/// created the fonts is torn down.
pub fn unload<P: FontFactory>(factory: &mut P, entries: &[FontEntry<'_, P::Font>]) -> usize {
    entries
        .iter()
        .filter(|entry| free_font(factory, entry.target))
        .count()
}

/// Destroys the font in `slot`, if any, and empties the slot.
///
/// Returns `true` if a font was destroyed.
pub fn free_font<P: FontFactory>(factory: &mut P, slot: &FontSlot<P::Font>) -> bool {
    match slot.take() {
        Some(font) => {
            factory.destroy_font(font);
            true
        }
        None => false,
    }
}

/// Number of entries whose slot holds a font.
#[must_use]
pub fn count_loaded<F>(entries: &[FontEntry<'_, F>]) -> usize {
    entries.iter().filter(|entry| entry.target.is_loaded()).count()
}
