/// One-shot timer slots driven by the frame loop's monotonic clock.
///
/// A slot holds at most one pending deadline. Re-arming replaces (and so
/// cancels) whatever was pending; every arm hands out a fresh token so a
/// stale callback can never be mistaken for the current one.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Clone, Debug, Default)]
pub struct TimerSlot {
    pending: Option<(TimerToken, u64)>,
    generation: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the slot to fire `delay_ms` after `now_ms`.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) -> TimerToken {
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.pending = Some((token, now_ms.saturating_add(delay_ms)));
        token
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn deadline(&self) -> Option<u64> {
        self.pending.map(|(_, at)| at)
    }

    #[cfg(test)]
    /// Whether `token` is still the pending arm of this slot.
    pub fn is_current(&self, token: TimerToken) -> bool {
        matches!(self.pending, Some((t, _)) if t == token)
    }

    /// Returns the token once when the deadline has passed, disarming the slot.
    pub fn fire(&mut self, now_ms: u64) -> Option<TimerToken> {
        match self.pending {
            Some((token, at)) if now_ms >= at => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }
}

/// Ease-out cubic, the curve used by every slide in the UI.
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Linear progress of `now_ms` through `[start_ms, start_ms + duration_ms]`.
pub fn progress(start_ms: u64, duration_ms: u64, now_ms: u64) -> f32 {
    if duration_ms == 0 {
        return 1.0;
    }
    let elapsed = now_ms.saturating_sub(start_ms);
    (elapsed as f32 / duration_ms as f32).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut slot = TimerSlot::new();
        let token = slot.arm(100, 800);
        assert_eq!(slot.fire(899), None);
        assert_eq!(slot.fire(900), Some(token));
        assert_eq!(slot.fire(901), None);
        assert!(!slot.is_armed());
    }

    #[test]
    fn rearming_cancels_previous_token() {
        let mut slot = TimerSlot::new();
        let first = slot.arm(0, 100);
        let second = slot.arm(50, 100);
        assert_ne!(first, second);
        assert!(!slot.is_current(first));
        assert_eq!(slot.fire(120), None);
        assert_eq!(slot.fire(150), Some(second));
    }

    #[test]
    fn cancel_disarms() {
        let mut slot = TimerSlot::new();
        slot.arm(0, 10);
        slot.cancel();
        assert_eq!(slot.fire(1_000), None);
        assert_eq!(slot.deadline(), None);
    }

    #[test]
    fn easing_is_clamped_and_monotonic() {
        assert_eq!(ease_out(-1.0), 0.0);
        assert_eq!(ease_out(2.0), 1.0);
        assert!(ease_out(0.25) < ease_out(0.5));
        assert_eq!(progress(0, 0, 5), 1.0);
        assert_eq!(progress(100, 200, 200), 0.5);
    }
}
