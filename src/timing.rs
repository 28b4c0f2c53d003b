//! Fixed-framerate pacing.

use std::time::{Duration, Instant};

/// Sleeps out the remainder of a fixed frame period.
///
/// A frame that overruns its budget is not compensated for; the next one
/// simply starts late.
pub struct FramePacer {
    period: Duration,
    frame_start: Instant,
}

impl FramePacer {
    pub fn new(period: Duration) -> Self {
        FramePacer {
            period,
            frame_start: Instant::now(),
        }
    }

    /// Blocks until the current frame's budget is spent, then starts the
    /// next frame's clock.
    pub fn pace(&mut self) {
        let remaining = Self::remaining(self.period, self.frame_start.elapsed());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.frame_start = Instant::now();
    }

    /// Budget left in a frame, clamped at zero.
    fn remaining(period: Duration, elapsed: Duration) -> Duration {
        period.saturating_sub(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_budget() {
        let period = Duration::from_micros(16_667);
        assert_eq!(
            FramePacer::remaining(period, Duration::from_millis(10)),
            Duration::from_micros(6_667)
        );
        assert_eq!(FramePacer::remaining(period, period), Duration::ZERO);
    }

    #[test]
    fn test_overrun_clamps_to_zero() {
        let period = Duration::from_micros(16_667);
        assert_eq!(
            FramePacer::remaining(period, Duration::from_millis(30)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_pace_sleeps_out_the_period() {
        // sleep never undershoots, so the full period is a lower bound
        let start = Instant::now();
        let mut pacer = FramePacer::new(Duration::from_millis(20));
        pacer.pace();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
