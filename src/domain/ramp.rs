/// Volume fade ramps.
///
/// A ramp moves linearly from one level to another in a fixed number of
/// discrete steps spread evenly over its duration. The frame loop polls it;
/// every step boundary that has passed since the last poll is applied at once,
/// so a stalled frame never slows a fade down.

#[derive(Clone, Debug)]
pub struct Ramp {
    from: f32,
    to: f32,
    steps: u32,
    step_ms: f64,
    start_ms: u64,
    applied: u32,
}

impl Ramp {
    pub fn new(from: f32, to: f32, duration_ms: u64, steps: u32, start_ms: u64) -> Self {
        let steps = steps.max(1);
        Ramp {
            from,
            to,
            steps,
            step_ms: duration_ms as f64 / steps as f64,
            start_ms,
            applied: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.applied >= self.steps
    }

    /// Level after `step` of `steps`, clamped between the endpoints.
    pub fn level_at(&self, step: u32) -> f32 {
        let step = step.min(self.steps);
        let delta = (self.to - self.from) / self.steps as f32;
        let level = self.from + delta * step as f32;
        if self.to >= self.from {
            level.min(self.to)
        } else {
            level.max(self.to)
        }
    }

    /// New level if at least one more step boundary has passed.
    pub fn advance(&mut self, now_ms: u64) -> Option<f32> {
        if self.is_done() {
            return None;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f64;
        let due = ((elapsed / self.step_ms).floor() as u32).min(self.steps);
        if due <= self.applied {
            return None;
        }
        self.applied = due;
        Some(if self.is_done() { self.to } else { self.level_at(due) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_in_reaches_target_after_duration() {
        let mut r = Ramp::new(0.0, 0.5, 2_000, 50, 0);
        assert_eq!(r.advance(39), None);
        let first = r.advance(40).unwrap();
        assert!((first - 0.01).abs() < 1e-6);
        assert_eq!(r.advance(2_000), Some(0.5));
        assert!(r.is_done());
        assert_eq!(r.advance(3_000), None);
    }

    #[test]
    fn fade_out_is_linear_and_never_negative() {
        let mut r = Ramp::new(0.5, 0.0, 800, 40, 1_000);
        let half = r.advance(1_400).unwrap();
        assert!((half - 0.25).abs() < 1e-4);
        assert_eq!(r.advance(1_800), Some(0.0));
        assert!(r.level_at(100) >= 0.0);
    }

    #[test]
    fn skipped_frames_apply_all_due_steps() {
        let mut r = Ramp::new(0.0, 1.0, 100, 10, 0);
        assert_eq!(r.advance(55), Some(r.level_at(5)));
        assert_eq!(r.advance(59), None);
    }
}
