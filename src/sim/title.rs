/// Title screen transition.
///
/// Two slides share one duration: the screen slides up into view when it is
/// shown, and slides back down when "back" is pressed. The switch back to the
/// selection screen is deferred until the exit slide has finished.

use crate::domain::timer::{self, TimerSlot};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TitleSignal {
    /// Exit slide finished; the root should show the selection screen.
    ReturnToSelection,
}

pub struct TitleScreen {
    duration_ms: u64,
    entrance_ms: Option<u64>,
    exit_started_ms: Option<u64>,
    exit_timer: TimerSlot,
}

impl TitleScreen {
    pub fn new(duration_ms: u64) -> Self {
        TitleScreen {
            duration_ms,
            entrance_ms: None,
            exit_started_ms: None,
            exit_timer: TimerSlot::new(),
        }
    }

    /// Reset for a fresh entrance.
    pub fn show(&mut self, now_ms: u64) {
        self.entrance_ms = Some(now_ms);
        self.exit_started_ms = None;
        self.exit_timer.cancel();
    }

    /// Re-show without replaying the entrance (coming back from the gallery).
    pub fn resume(&mut self) {
        self.entrance_ms = None;
        self.exit_started_ms = None;
        self.exit_timer.cancel();
    }

    pub fn is_exiting(&self) -> bool {
        self.exit_started_ms.is_some()
    }

    /// Start the exit slide. Returns false if one is already running.
    pub fn back(&mut self, now_ms: u64) -> bool {
        if self.is_exiting() {
            return false;
        }
        self.exit_started_ms = Some(now_ms);
        self.exit_timer.arm(now_ms, self.duration_ms);
        true
    }

    /// "Enter" is refused once an exit is under way.
    pub fn enter(&self) -> bool {
        !self.is_exiting()
    }

    pub fn update(&mut self, now_ms: u64) -> Option<TitleSignal> {
        self.exit_timer.fire(now_ms).map(|_| TitleSignal::ReturnToSelection)
    }

    /// Vertical displacement as a fraction of screen height: 1.0 = fully
    /// below the viewport, 0.0 = in place.
    pub fn offset(&self, now_ms: u64) -> f32 {
        match (self.exit_started_ms, self.entrance_ms) {
            (Some(start), _) => timer::ease_out(timer::progress(start, self.duration_ms, now_ms)),
            (None, Some(start)) => {
                1.0 - timer::ease_out(timer::progress(start, self.duration_ms, now_ms))
            }
            (None, None) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_defers_the_screen_change() {
        let mut t = TitleScreen::new(800);
        t.show(0);
        assert!(t.back(1_000));
        assert!(t.is_exiting());
        assert_eq!(t.update(1_799), None);
        assert_eq!(t.update(1_800), Some(TitleSignal::ReturnToSelection));
        assert_eq!(t.update(1_801), None);
    }

    #[test]
    fn second_back_is_ignored() {
        let mut t = TitleScreen::new(800);
        t.show(0);
        assert!(t.back(100));
        assert!(!t.back(500));
        assert_eq!(t.update(899), None);
        assert!(t.update(900).is_some());
    }

    #[test]
    fn enter_refused_while_exiting() {
        let mut t = TitleScreen::new(800);
        t.show(0);
        assert!(t.enter());
        t.back(10);
        assert!(!t.enter());
    }

    #[test]
    fn slide_in_then_slide_out_offsets() {
        let mut t = TitleScreen::new(800);
        t.show(0);
        assert_eq!(t.offset(0), 1.0);
        assert_eq!(t.offset(800), 0.0);
        t.back(1_000);
        assert_eq!(t.offset(1_000), 0.0);
        assert_eq!(t.offset(1_800), 1.0);
    }

    #[test]
    fn resume_skips_the_entrance() {
        let mut t = TitleScreen::new(800);
        t.resume();
        assert_eq!(t.offset(5), 0.0);
    }

    #[test]
    fn show_clears_a_pending_exit() {
        let mut t = TitleScreen::new(800);
        t.show(0);
        t.back(0);
        t.show(100);
        assert!(!t.is_exiting());
        assert_eq!(t.update(10_000), None);
    }
}
