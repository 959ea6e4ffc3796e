/// Gesture thresholds: turn raw wheel deltas and swipes into ±1 steps.
///
/// Positive wheel deltas (scroll right / down) and swipes that move the
/// pointer left / up both mean "next". Anything inside the threshold is
/// ignored.

/// A completed single-pointer swipe, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Swipe {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl Swipe {
    /// Positive when the pointer travelled left.
    pub fn dx(&self) -> f32 {
        self.start_x - self.end_x
    }

    /// Positive when the pointer travelled up.
    pub fn dy(&self) -> f32 {
        self.start_y - self.end_y
    }
}

/// One wheel event's delta against a strict threshold.
pub fn wheel_step(delta: f32, threshold: f32) -> Option<isize> {
    if delta > threshold {
        Some(1)
    } else if delta < -threshold {
        Some(-1)
    } else {
        None
    }
}

pub fn swipe_step_x(swipe: &Swipe, threshold: f32) -> Option<isize> {
    wheel_step(swipe.dx(), threshold)
}

pub fn swipe_step_y(swipe: &Swipe, threshold: f32) -> Option<isize> {
    wheel_step(swipe.dy(), threshold)
}
