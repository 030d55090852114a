//! Event queue and event sources
//!
//! The main loop blocks in [`EventSource::wait_event`] between iterations;
//! sources push what happened into a double-buffered [`EventQueue`], and
//! the context consumes it after a swap.
//!
//! # Design Principles
//!
//! - **Single blocking point**: the loop only suspends inside the source
//! - **Double Buffering**: events pushed while handling a batch wait for
//!   the next one
//! - **Swappable clocks**: [`TimerSource`] follows the wall clock,
//!   [`FixedStepSource`] replays a fixed step for deterministic runs

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::error::GfmResult;

// ============================================================================
// Event Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// Wall time advanced by this many milliseconds
    Timer { elapsed_ms: u32 },
    /// The window (or host) asked the game to close
    Quit,
    /// Window resized; the backbuffer keeps its size
    Resize { width: u32, height: u32 },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed by a source become visible to `iter`/`drain` after
/// [`swap`](Self::swap).
#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<Event>,
    processing: VecDeque<Event>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 16;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, event: Event) {
        self.pending.push_back(event);
    }

    /// Make pushed events available and drop the previous batch
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.processing.iter()
    }

    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Event Sources
// ============================================================================

/// Where the main loop gets time (and any host events) from
pub trait EventSource {
    /// Block for up to `timeout_ms`, then push whatever happened.
    ///
    /// Must push at least one event so the loop makes progress.
    fn wait_event(&mut self, timeout_ms: u32, queue: &mut EventQueue) -> GfmResult<()>;
}

/// Wall-clock timer that sleeps until the next tick is due
#[derive(Debug)]
pub struct TimerSource {
    last: Instant,
    /// Sub-millisecond remainder carried to the next event
    carry: Duration,
}

impl TimerSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            carry: Duration::ZERO,
        }
    }
}

impl Default for TimerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TimerSource {
    fn wait_event(&mut self, timeout_ms: u32, queue: &mut EventQueue) -> GfmResult<()> {
        if timeout_ms > 0 {
            thread::sleep(Duration::from_millis(u64::from(timeout_ms)));
        }
        let now = Instant::now();
        let elapsed = now.duration_since(self.last) + self.carry;
        self.last = now;

        let whole_ms = elapsed.as_millis();
        self.carry = elapsed - Duration::from_millis(whole_ms as u64);
        let elapsed_ms = u32::try_from(whole_ms).unwrap_or(u32::MAX);
        queue.push(Event::Timer { elapsed_ms });
        Ok(())
    }
}

/// Deterministic source: every wait reports exactly `step_ms`, without
/// sleeping, and optionally quits after a number of waits
#[derive(Debug, Clone)]
pub struct FixedStepSource {
    step_ms: u32,
    remaining: Option<u32>,
}

impl FixedStepSource {
    #[must_use]
    pub const fn new(step_ms: u32) -> Self {
        Self {
            step_ms,
            remaining: None,
        }
    }

    /// Push [`Event::Quit`] instead of time after `waits` calls
    #[must_use]
    pub const fn with_limit(mut self, waits: u32) -> Self {
        self.remaining = Some(waits);
        self
    }
}

impl EventSource for FixedStepSource {
    fn wait_event(&mut self, _timeout_ms: u32, queue: &mut EventQueue) -> GfmResult<()> {
        match self.remaining.as_mut() {
            Some(0) => queue.push(Event::Quit),
            Some(left) => {
                *left -= 1;
                queue.push(Event::Timer {
                    elapsed_ms: self.step_ms,
                });
            }
            None => queue.push(Event::Timer {
                elapsed_ms: self.step_ms,
            }),
        }
        Ok(())
    }
}
