use std::time::{Duration, Instant};

pub struct Time {
    start: Instant,
    last: Instant,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::from_secs_f32(0.0) }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates variable frame time and hands it out in fixed slices so the
/// physics step stays decoupled from render cadence.
pub struct FixedStepper {
    accumulator: f32,
    fixed_dt: f32,
}

impl FixedStepper {
    pub fn new(fixed_dt: f32) -> Self {
        Self { accumulator: 0.0, fixed_dt: fixed_dt.max(1.0 / 1000.0) }
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Adds frame time to the backlog. Returns the seconds discarded when the
    /// backlog exceeds `max_backlog` (worst-case cost per frame stays bounded).
    pub fn accumulate(&mut self, dt: f32, max_backlog: f32) -> Option<f32> {
        if !dt.is_finite() || dt <= 0.0 {
            return None;
        }
        self.accumulator += dt;
        if self.accumulator > max_backlog {
            let dropped = self.accumulator - max_backlog;
            self.accumulator = max_backlog;
            Some(dropped)
        } else {
            None
        }
    }

    pub fn pop(&mut self) -> Option<f32> {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            Some(self.fixed_dt)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepper_pops_whole_slices_only() {
        let mut stepper = FixedStepper::new(1.0 / 60.0);
        stepper.accumulate(0.025, 1.0);
        assert_eq!(stepper.pop(), Some(1.0 / 60.0));
        assert_eq!(stepper.pop(), None);
    }

    #[test]
    fn stepper_clamps_backlog() {
        let mut stepper = FixedStepper::new(1.0 / 60.0);
        let dropped = stepper.accumulate(2.0, 0.25).expect("backlog clamped");
        assert!((dropped - 1.75).abs() < 1e-6);
        let mut steps = 0;
        while stepper.pop().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 15);
    }

    #[test]
    fn stepper_ignores_degenerate_dt() {
        let mut stepper = FixedStepper::new(1.0 / 60.0);
        stepper.accumulate(f32::NAN, 0.25);
        stepper.accumulate(-1.0, 0.25);
        assert_eq!(stepper.pop(), None);
    }
}
