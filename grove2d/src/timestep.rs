use std::time::Duration;

/// Fixed-timestep accumulator.
///
/// Wall time is fed in with [`accumulate`](Self::accumulate) and drained one
/// step at a time with [`consume_step`](Self::consume_step). After draining,
/// the leftover is always shorter than one step and is exposed to rendering
/// as [`alpha`](Self::alpha).
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    max_frame_delta: Duration,
    accumulator: Duration,
}

impl FixedTimestep {
    pub fn new(step: Duration, max_frame_delta: Duration) -> Self {
        Self {
            step: step.max(Duration::from_nanos(1)),
            max_frame_delta,
            accumulator: Duration::ZERO,
        }
    }

    /// Add one frame's wall time, clamped to the per-frame ceiling.
    ///
    /// Returns the amount actually added.
    pub fn accumulate(&mut self, delta: Duration) -> Duration {
        let clamped = delta.min(self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped);
        clamped
    }

    /// Consume one step if enough time has accumulated.
    ///
    /// Call this in a loop until it returns `false`.
    pub fn consume_step(&mut self) -> bool {
        if self.accumulator >= self.step {
            self.accumulator -= self.step;
            true
        } else {
            false
        }
    }

    /// Interpolation factor between the last two simulated steps, in `[0, 1)`
    /// once all whole steps have been consumed.
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.step.as_secs_f64()) as f32
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Convert a wall delta in seconds to a `Duration`, treating negative or
    /// non-finite input as zero.
    pub fn delta_from_secs(seconds: f32) -> Duration {
        if seconds.is_finite() && seconds > 0.0 {
            Duration::try_from_secs_f32(seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sixty_hz() -> FixedTimestep {
        FixedTimestep::new(
            Duration::from_secs_f64(1.0 / 60.0),
            Duration::from_millis(250),
        )
    }

    fn drain(timestep: &mut FixedTimestep) -> u32 {
        let mut steps = 0;
        while timestep.consume_step() {
            steps += 1;
        }
        steps
    }

    #[test]
    fn test_step_count_matches_floor() {
        let mut timestep = sixty_hz();
        let step = timestep.step();
        let deltas = [3, 16, 17, 40, 5, 100, 33, 250].map(Duration::from_millis);

        for delta in deltas {
            let before = timestep.accumulator();
            timestep.accumulate(delta);
            let total = before + delta;
            let expected_steps = (total.as_nanos() / step.as_nanos()) as u32;
            let expected_rest = Duration::from_nanos((total.as_nanos() % step.as_nanos()) as u64);

            assert_eq!(drain(&mut timestep), expected_steps);
            assert_eq!(timestep.accumulator(), expected_rest);
            assert!(timestep.accumulator() < step);
        }
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut stalled = sixty_hz();
        let mut capped = sixty_hz();
        assert_eq!(stalled.accumulate(Duration::from_secs(3)), Duration::from_millis(250));
        capped.accumulate(Duration::from_millis(250));

        assert_eq!(drain(&mut stalled), drain(&mut capped));
        assert_eq!(stalled.accumulator(), capped.accumulator());
    }

    #[test]
    fn test_alpha_in_unit_range() {
        let mut timestep = sixty_hz();
        timestep.accumulate(Duration::from_millis(25));
        assert_eq!(drain(&mut timestep), 1);
        let alpha = timestep.alpha();
        assert!((0.0..1.0).contains(&alpha));
        assert!((alpha - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_delta_from_secs() {
        assert_eq!(FixedTimestep::delta_from_secs(-1.0), Duration::ZERO);
        assert_eq!(FixedTimestep::delta_from_secs(f32::NAN), Duration::ZERO);
        assert_eq!(FixedTimestep::delta_from_secs(0.5), Duration::from_millis(500));
    }
}
