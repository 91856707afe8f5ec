//! Tick-driven recording clock
//!
//! Elapsed time is counted in whole ticks rather than sampled from a wall
//! clock, so the ceiling is reached on an exact tick boundary.

use std::time::Duration;

/// Period of the recording tick
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Hard cap on a single recording
pub const MAX_RECORDING_DURATION: Duration = Duration::from_secs(15);

/// Counts ticks of a fixed period up to a fixed ceiling
#[derive(Debug, Clone)]
pub struct RecordingClock {
    period: Duration,
    ceiling: Duration,
    ticks: u32,
}

impl RecordingClock {
    /// Clock with the standard 100 ms period and 15 s ceiling
    pub fn new() -> Self {
        Self::with_period(TICK_INTERVAL, MAX_RECORDING_DURATION)
    }

    pub fn with_period(period: Duration, ceiling: Duration) -> Self {
        Self {
            period,
            ceiling,
            ticks: 0,
        }
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    /// Advance one tick and return the new elapsed time
    ///
    /// Saturates at the ceiling.
    pub fn advance(&mut self) -> Duration {
        if !self.is_exhausted() {
            self.ticks = self.ticks.saturating_add(1);
        }
        self.elapsed()
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        (self.period * self.ticks).min(self.ceiling)
    }

    #[inline]
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn remaining(&self) -> Duration {
        self.ceiling.saturating_sub(self.elapsed())
    }

    /// Elapsed/ceiling ratio in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.ceiling.is_zero() {
            return 1.0;
        }
        (self.elapsed().as_secs_f64() / self.ceiling.as_secs_f64()).min(1.0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.elapsed() >= self.ceiling
    }
}

impl Default for RecordingClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_after_150_ticks() {
        let mut clock = RecordingClock::new();
        for _ in 0..149 {
            clock.advance();
            assert!(!clock.is_exhausted());
        }
        assert_eq!(clock.advance(), Duration::from_secs(15));
        assert!(clock.is_exhausted());
        assert_eq!(clock.elapsed().as_secs_f64(), 15.0);
    }

    #[test]
    fn test_advance_saturates() {
        let mut clock = RecordingClock::with_period(Duration::from_millis(400), Duration::from_secs(1));
        clock.advance();
        clock.advance();
        clock.advance();
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        clock.advance();
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert_eq!(clock.progress(), 1.0);
    }

    #[test]
    fn test_progress_and_remaining() {
        let mut clock = RecordingClock::new();
        for _ in 0..75 {
            clock.advance();
        }
        assert!((clock.progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(clock.remaining(), Duration::from_millis(7_500));

        clock.reset();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
