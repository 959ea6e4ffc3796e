/// Vertically paginated project slideshow: one project per page.
///
/// Uses the same lock as the persona carousel: while a page transition is in
/// flight every request is dropped. Unlike the carousel the list does not
/// wrap; moving past either end is ignored.

use crate::domain::timer::{self, TimerSlot};

pub struct ProjectSlideshow {
    len: usize,
    current: usize,
    previous: usize,
    moved_ms: u64,
    duration_ms: u64,
    lock: TimerSlot,
}

impl ProjectSlideshow {
    pub fn new(len: usize, duration_ms: u64) -> Self {
        ProjectSlideshow {
            len,
            current: 0,
            previous: 0,
            moved_ms: 0,
            duration_ms,
            lock: TimerSlot::new(),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_animating(&self) -> bool {
        self.lock.is_armed()
    }

    /// Move by `delta` pages. Returns the new index if the move was accepted.
    pub fn step(&mut self, delta: isize, now_ms: u64) -> Option<usize> {
        if self.is_animating() || self.len == 0 {
            return None;
        }
        let target = self.current as isize + delta;
        if target < 0 || target >= self.len as isize || target as usize == self.current {
            return None;
        }
        self.previous = self.current;
        self.current = target as usize;
        self.moved_ms = now_ms;
        self.lock.arm(now_ms, self.duration_ms);
        Some(self.current)
    }

    pub fn update(&mut self, now_ms: u64) -> bool {
        self.lock.fire(now_ms).is_some()
    }

    /// Eased vertical position in pages (`current * 100vh` in page units).
    pub fn offset(&self, now_ms: u64) -> f32 {
        let t = timer::ease_out(timer::progress(self.moved_ms, self.duration_ms, now_ms));
        let from = self.previous as f32;
        let to = self.current as f32;
        from + (to - from) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_down_and_locks_for_the_transition() {
        let mut s = ProjectSlideshow::new(4, 700);
        assert_eq!(s.step(1, 0), Some(1));
        assert_eq!(s.step(1, 100), None);
        assert!(s.update(700));
        assert_eq!(s.step(1, 700), Some(2));
    }

    #[test]
    fn does_not_wrap_at_the_ends() {
        let mut s = ProjectSlideshow::new(2, 700);
        assert_eq!(s.step(-1, 0), None);
        assert_eq!(s.step(1, 0), Some(1));
        s.update(700);
        assert_eq!(s.step(1, 700), None);
        assert_eq!(s.current(), 1);
    }

    #[test]
    fn offset_interpolates_between_pages() {
        let mut s = ProjectSlideshow::new(3, 700);
        assert_eq!(s.offset(0), 0.0);
        s.step(1, 1_000);
        assert_eq!(s.offset(1_000), 0.0);
        let mid = s.offset(1_350);
        assert!(mid > 0.5 && mid < 1.0);
        assert_eq!(s.offset(1_700), 1.0);
    }

    #[test]
    fn empty_slideshow_ignores_everything() {
        let mut s = ProjectSlideshow::new(0, 700);
        assert_eq!(s.step(1, 0), None);
        assert_eq!(s.step(-1, 0), None);
    }
}
