//! Fixed-timestep frame scheduler
//!
//! Wall-clock time is fed in milliseconds and converted into whole update
//! and draw ticks. Each accumulator keeps its time scaled by the target
//! rate (`ms * rate`), so a 60 Hz loop fed `16, 17, 17` ms produces exactly
//! three ticks and no drift.
//!
//! # Example
//!
//! ```ignore
//! let mut scheduler = FrameScheduler::new(60, 60)?;
//! scheduler.update_accumulators(elapsed_ms);
//! while scheduler.is_updating() {
//!     scheduler.update_begin()?;
//!     game.update(scheduler.update_elapsed_ms());
//!     scheduler.update_end()?;
//! }
//! while scheduler.is_drawing() {
//!     scheduler.draw_begin()?;
//!     game.draw();
//!     scheduler.draw_end()?;
//! }
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::core::error::{GfmError, GfmResult};

/// Highest rate accepted unless configured otherwise
pub const DEFAULT_MAX_RATE: u32 = 500;

// ============================================================================
// Accumulator
// ============================================================================

/// One tick source: time goes in, whole ticks come out.
///
/// Time is added as `ms * step` and a tick is produced every `threshold`
/// units. In rate mode `step` is the rate and `threshold` is 1000; in raw
/// mode `step` is 1 and `threshold` is the tick length in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accumulator {
    step: u64,
    threshold: u64,
    acc: u64,
    pending: u32,
}

impl Accumulator {
    const fn with_rate(rate: u32) -> Self {
        Self {
            step: rate as u64,
            threshold: 1000,
            acc: 0,
            pending: 0,
        }
    }

    const fn with_delay(delay_ms: u32) -> Self {
        Self {
            step: 1,
            threshold: delay_ms as u64,
            acc: 0,
            pending: 0,
        }
    }

    fn add(&mut self, ms: u32, max_pending: Option<u32>) {
        self.acc += u64::from(ms) * self.step;
        while self.acc >= self.threshold {
            self.acc -= self.threshold;
            self.pending = self.pending.saturating_add(1);
        }
        if let Some(max) = max_pending {
            self.pending = self.pending.min(max);
        }
    }

    /// Milliseconds until the next tick, rounded up
    const fn delay(&self) -> u32 {
        let missing = self.threshold - self.acc;
        missing.div_ceil(self.step) as u32
    }

    /// Tick length in whole milliseconds
    const fn tick_ms(&self) -> u32 {
        (self.threshold / self.step) as u32
    }

    fn tick_secs(&self) -> f64 {
        self.threshold as f64 / (self.step as f64 * 1000.0)
    }
}

// ============================================================================
// Frame Scheduler
// ============================================================================

/// Update/draw pacing with per-second observed rates
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    update: Accumulator,
    draw: Accumulator,
    max_rate: u32,
    max_pending: Option<u32>,
    in_update: bool,
    in_draw: bool,
    window_ms: u32,
    updates_this_second: u32,
    draws_this_second: u32,
    last_ups: u32,
    last_dps: u32,
}

impl FrameScheduler {
    /// Create a scheduler targeting `ups` updates and `dps` draws per second
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero rate, `FpsTooHigh` above
    /// [`DEFAULT_MAX_RATE`]
    pub fn new(ups: u32, dps: u32) -> GfmResult<Self> {
        let mut scheduler = Self {
            update: Accumulator::with_rate(1),
            draw: Accumulator::with_rate(1),
            max_rate: DEFAULT_MAX_RATE,
            max_pending: None,
            in_update: false,
            in_draw: false,
            window_ms: 0,
            updates_this_second: 0,
            draws_this_second: 0,
            last_ups: 0,
            last_dps: 0,
        };
        scheduler.set_fps(ups, dps)?;
        Ok(scheduler)
    }

    /// Change the highest rate [`set_fps`](Self::set_fps) accepts
    pub fn set_max_rate(&mut self, max_rate: u32) -> GfmResult<()> {
        if max_rate == 0 || max_rate > 1000 {
            return Err(GfmError::InvalidArgument(format!(
                "max rate {max_rate} outside 1..=1000"
            )));
        }
        self.max_rate = max_rate;
        Ok(())
    }

    /// Cap how many ticks of each kind may pile up; `None` disables the cap
    pub fn set_max_pending(&mut self, max_pending: Option<u32>) -> GfmResult<()> {
        if max_pending == Some(0) {
            return Err(GfmError::InvalidArgument("max pending of zero".into()));
        }
        self.max_pending = max_pending;
        Ok(())
    }

    /// Set the update and draw rates, dropping accumulated time
    pub fn set_fps(&mut self, ups: u32, dps: u32) -> GfmResult<()> {
        if ups == 0 || dps == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "rates must be positive (ups {ups}, dps {dps})"
            )));
        }
        let highest = ups.max(dps);
        if highest > self.max_rate {
            return Err(GfmError::FpsTooHigh(highest));
        }
        self.update = Accumulator::with_rate(ups);
        self.draw = Accumulator::with_rate(dps);
        log::debug!("Scheduler set to {ups} ups / {dps} dps");
        Ok(())
    }

    /// Raw mode: set tick lengths directly in milliseconds
    pub fn set_delays(&mut self, update_ms: u32, draw_ms: u32) -> GfmResult<()> {
        if update_ms == 0 || draw_ms == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "tick lengths must be positive ({update_ms}ms, {draw_ms}ms)"
            )));
        }
        let shortest = update_ms.min(draw_ms);
        if 1000 / shortest > self.max_rate {
            return Err(GfmError::FpsTooHigh(1000 / shortest));
        }
        self.update = Accumulator::with_delay(update_ms);
        self.draw = Accumulator::with_delay(draw_ms);
        Ok(())
    }

    /// Feed elapsed wall time into both accumulators
    pub fn update_accumulators(&mut self, elapsed_ms: u32) {
        self.update.add(elapsed_ms, self.max_pending);
        self.draw.add(elapsed_ms, self.max_pending);

        self.window_ms += elapsed_ms;
        if self.window_ms >= 1000 {
            // Subtraction, not modulo: a long stall skips the windows it spans
            self.window_ms -= 1000;
            self.last_ups = self.updates_this_second;
            self.last_dps = self.draws_this_second;
            self.updates_this_second = 0;
            self.draws_this_second = 0;
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_updating(&self) -> bool {
        self.update.pending > 0
    }

    #[inline]
    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        self.draw.pending > 0
    }

    pub fn update_begin(&mut self) -> GfmResult<()> {
        if self.update.pending == 0 {
            return Err(GfmError::NotInitialized("update tick"));
        }
        if self.in_update {
            return Err(GfmError::AlreadyInitialized("update tick"));
        }
        self.in_update = true;
        Ok(())
    }

    pub fn update_end(&mut self) -> GfmResult<()> {
        if !self.in_update {
            return Err(GfmError::NotInitialized("update tick"));
        }
        self.in_update = false;
        self.update.pending -= 1;
        self.updates_this_second += 1;
        Ok(())
    }

    pub fn draw_begin(&mut self) -> GfmResult<()> {
        if self.draw.pending == 0 {
            return Err(GfmError::NotInitialized("draw tick"));
        }
        if self.in_draw {
            return Err(GfmError::AlreadyInitialized("draw tick"));
        }
        self.in_draw = true;
        Ok(())
    }

    pub fn draw_end(&mut self) -> GfmResult<()> {
        if !self.in_draw {
            return Err(GfmError::NotInitialized("draw tick"));
        }
        self.in_draw = false;
        self.draw.pending -= 1;
        self.draws_this_second += 1;
        Ok(())
    }

    /// Milliseconds until either accumulator produces its next tick
    #[must_use]
    pub fn delay(&self) -> u32 {
        if self.is_updating() || self.is_drawing() {
            return 0;
        }
        self.update.delay().min(self.draw.delay())
    }

    /// Per-tick time budget handed to updates, in milliseconds
    #[inline]
    #[must_use]
    pub const fn update_elapsed_ms(&self) -> u32 {
        self.update.tick_ms()
    }

    /// Per-tick time budget handed to updates, in seconds
    #[must_use]
    pub fn update_elapsed_secs(&self) -> f64 {
        self.update.tick_secs()
    }

    /// Length of a draw tick in whole milliseconds
    #[inline]
    #[must_use]
    pub const fn draw_elapsed_ms(&self) -> u32 {
        self.draw.tick_ms()
    }

    /// Target draws per second
    #[must_use]
    pub fn draw_rate(&self) -> f64 {
        1.0 / self.draw.tick_secs()
    }

    #[inline]
    #[must_use]
    pub const fn updates_pending(&self) -> u32 {
        self.update.pending
    }

    #[inline]
    #[must_use]
    pub const fn draws_pending(&self) -> u32 {
        self.draw.pending
    }

    #[inline]
    #[must_use]
    pub const fn updates_this_second(&self) -> u32 {
        self.updates_this_second
    }

    #[inline]
    #[must_use]
    pub const fn draws_this_second(&self) -> u32 {
        self.draws_this_second
    }

    /// Updates counted over the last full second
    #[inline]
    #[must_use]
    pub const fn ups(&self) -> u32 {
        self.last_ups
    }

    /// Draws counted over the last full second
    #[inline]
    #[must_use]
    pub const fn dps(&self) -> u32 {
        self.last_dps
    }

    /// Residual accumulated time of the update and draw accumulators,
    /// scaled by their rates
    #[must_use]
    pub const fn residual(&self) -> (u64, u64) {
        (self.update.acc, self.draw.acc)
    }

    /// Drop every accumulated tick and the current rate window
    pub fn reset(&mut self) {
        self.update.acc = 0;
        self.update.pending = 0;
        self.draw.acc = 0;
        self.draw.pending = 0;
        self.in_update = false;
        self.in_draw = false;
        self.window_ms = 0;
        self.updates_this_second = 0;
        self.draws_this_second = 0;
    }
}

// ============================================================================
// FPS Counter
// ============================================================================

/// Measures how long update and draw ticks take on the wall clock
#[derive(Debug)]
pub struct FpsCounter {
    /// Draw time history for averaging
    draw_times: VecDeque<Duration>,
    max_samples: usize,
    update_started: Option<Instant>,
    draw_started: Option<Instant>,
    last_update: Duration,
    last_draw: Duration,
    avg_draw_ms: f32,
    min_draw_ms: f32,
    max_draw_ms: f32,
    total_draws: u64,
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            draw_times: VecDeque::with_capacity(120),
            max_samples: 120,
            update_started: None,
            draw_started: None,
            last_update: Duration::ZERO,
            last_draw: Duration::ZERO,
            avg_draw_ms: 0.0,
            min_draw_ms: 0.0,
            max_draw_ms: 0.0,
            total_draws: 0,
        }
    }

    pub fn update_begin(&mut self) {
        self.update_started = Some(Instant::now());
    }

    pub fn update_end(&mut self) {
        if let Some(start) = self.update_started.take() {
            self.last_update = start.elapsed();
        }
    }

    pub fn draw_begin(&mut self) {
        self.draw_started = Some(Instant::now());
    }

    pub fn draw_end(&mut self) {
        if let Some(start) = self.draw_started.take() {
            self.record_draw(start.elapsed());
        }
    }

    /// Record a draw tick that took `took`
    pub fn record_draw(&mut self, took: Duration) {
        self.total_draws += 1;
        self.last_draw = took;
        if self.draw_times.len() >= self.max_samples {
            self.draw_times.pop_front();
        }
        self.draw_times.push_back(took);

        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;
        for &dt in &self.draw_times {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        let count = self.draw_times.len() as f32;
        self.avg_draw_ms = total.as_secs_f32() * 1000.0 / count;
        self.min_draw_ms = min.as_secs_f32() * 1000.0;
        self.max_draw_ms = max.as_secs_f32() * 1000.0;
    }

    #[must_use]
    pub fn last_update_ms(&self) -> f32 {
        self.last_update.as_secs_f32() * 1000.0
    }

    #[must_use]
    pub fn last_draw_ms(&self) -> f32 {
        self.last_draw.as_secs_f32() * 1000.0
    }

    #[must_use]
    pub fn avg_draw_ms(&self) -> f32 {
        self.avg_draw_ms
    }

    #[must_use]
    pub fn min_draw_ms(&self) -> f32 {
        self.min_draw_ms
    }

    #[must_use]
    pub fn max_draw_ms(&self) -> f32 {
        self.max_draw_ms
    }

    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    /// One-line summary combining these timings with the scheduler's rates
    #[must_use]
    pub fn format_stats(&self, scheduler: &FrameScheduler) -> String {
        format!(
            "UPS: {} | DPS: {} | Draw: {:.2}ms (min: {:.2}, max: {:.2})",
            scheduler.ups(),
            scheduler.dps(),
            self.avg_draw_ms,
            self.min_draw_ms,
            self.max_draw_ms
        )
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut FrameScheduler) -> (u32, u32) {
        let mut updates = 0;
        while scheduler.is_updating() {
            scheduler.update_begin().unwrap();
            scheduler.update_end().unwrap();
            updates += 1;
        }
        let mut draws = 0;
        while scheduler.is_drawing() {
            scheduler.draw_begin().unwrap();
            scheduler.draw_end().unwrap();
            draws += 1;
        }
        (updates, draws)
    }

    #[test]
    fn test_pacing_at_sixty() {
        let mut scheduler = FrameScheduler::new(60, 60).unwrap();
        scheduler.update_accumulators(16);
        scheduler.update_accumulators(17);
        scheduler.update_accumulators(17);

        assert_eq!(scheduler.updates_pending(), 3);
        assert_eq!(scheduler.draws_pending(), 3);

        assert_eq!(drain(&mut scheduler), (3, 3));
        assert_eq!(scheduler.updates_this_second(), 3);
        assert_eq!(scheduler.draws_this_second(), 3);
        assert_eq!(scheduler.residual(), (0, 0));
    }

    #[test]
    fn test_rate_limits() {
        assert!(matches!(
            FrameScheduler::new(0, 60),
            Err(GfmError::InvalidArgument(_))
        ));
        assert_eq!(
            FrameScheduler::new(60, 600).unwrap_err(),
            GfmError::FpsTooHigh(600)
        );

        let mut scheduler = FrameScheduler::new(60, 60).unwrap();
        scheduler.set_max_rate(1000).unwrap();
        assert!(scheduler.set_fps(600, 60).is_ok());
    }

    #[test]
    fn test_independent_rates() {
        let mut scheduler = FrameScheduler::new(60, 30).unwrap();
        scheduler.update_accumulators(100);
        assert_eq!(scheduler.updates_pending(), 6);
        assert_eq!(scheduler.draws_pending(), 3);
        assert_eq!(scheduler.update_elapsed_ms(), 16);
        assert!((scheduler.update_elapsed_secs() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_raw_delays() {
        let mut scheduler = FrameScheduler::new(60, 60).unwrap();
        scheduler.set_delays(25, 50).unwrap();
        scheduler.update_accumulators(60);
        assert_eq!(scheduler.updates_pending(), 2);
        assert_eq!(scheduler.draws_pending(), 1);
        assert_eq!(scheduler.update_elapsed_ms(), 25);
        assert!(scheduler.set_delays(1, 50).is_err());
    }

    #[test]
    fn test_delay_until_next_tick() {
        let mut scheduler = FrameScheduler::new(50, 25).unwrap();
        assert_eq!(scheduler.delay(), 20);
        scheduler.update_accumulators(15);
        assert_eq!(scheduler.delay(), 5);
        scheduler.update_accumulators(5);
        assert_eq!(scheduler.delay(), 0);
        drain(&mut scheduler);
        assert_eq!(scheduler.delay(), 20);
    }

    #[test]
    fn test_max_pending_cap() {
        let mut scheduler = FrameScheduler::new(60, 60).unwrap();
        scheduler.set_max_pending(Some(2)).unwrap();
        scheduler.update_accumulators(500);
        assert_eq!(scheduler.updates_pending(), 2);
        assert!(scheduler.set_max_pending(Some(0)).is_err());
    }

    #[test]
    fn test_per_second_window() {
        let mut scheduler = FrameScheduler::new(10, 5).unwrap();
        for _ in 0..10 {
            scheduler.update_accumulators(100);
            drain(&mut scheduler);
        }
        assert_eq!(scheduler.ups(), 9);
        assert_eq!(scheduler.updates_this_second(), 1);

        scheduler.update_accumulators(0);
        assert_eq!(scheduler.dps(), 4);
    }

    #[test]
    fn test_tick_protocol_errors() {
        let mut scheduler = FrameScheduler::new(60, 60).unwrap();
        assert!(scheduler.update_begin().is_err());
        assert!(scheduler.draw_end().is_err());

        scheduler.update_accumulators(40);
        scheduler.update_begin().unwrap();
        assert!(scheduler.update_begin().is_err());
        scheduler.update_end().unwrap();
        assert_eq!(scheduler.updates_pending(), 1);
    }

    #[test]
    fn test_fps_counter_stats() {
        let mut counter = FpsCounter::new();
        counter.record_draw(Duration::from_millis(2));
        counter.record_draw(Duration::from_millis(4));

        assert_eq!(counter.total_draws(), 2);
        assert!((counter.avg_draw_ms() - 3.0).abs() < 0.01);
        assert!((counter.min_draw_ms() - 2.0).abs() < 0.01);
        assert!((counter.max_draw_ms() - 4.0).abs() < 0.01);

        let scheduler = FrameScheduler::new(60, 60).unwrap();
        assert!(counter.format_stats(&scheduler).starts_with("UPS: 0"));
    }

    #[test]
    fn test_fps_counter_begin_end() {
        let mut counter = FpsCounter::new();
        counter.draw_end();
        assert_eq!(counter.total_draws(), 0);
        counter.draw_begin();
        counter.draw_end();
        assert_eq!(counter.total_draws(), 1);
    }
}
