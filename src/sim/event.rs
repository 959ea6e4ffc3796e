/// Intents fed into the app state and events it emits back.
///
/// Input adapters (keyboard, mouse, gamepad) translate raw input into
/// `Intent`s; the presentation layer consumes `AppEvent`s for sound cues.

use crate::domain::carousel::Transition;
use crate::domain::gesture::Swipe;
use crate::sim::world::Screen;

/// Something the user asked for, independent of the device it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    Left,
    Right,
    Up,
    Down,
    Confirm,
    Back,
    ToggleSound,
    /// Number key, zero-based (key `1` is card 0).
    Digit(usize),
    /// One horizontal wheel event; positive scrolls right.
    WheelX(f32),
    /// One vertical wheel event; positive scrolls down.
    WheelY(f32),
    Swipe(Swipe),
    Click(ClickTarget),
    Quit,
}

/// Clickable regions the renderer lays out each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    ArrowLeft,
    ArrowRight,
    Dot(usize),
    Persona,
    SoundToggle,
    TitleBack,
    TitleEnter,
    Card(usize),
    DetailBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Navigate,
    Select,
    Close,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    /// Only emitted while sound is on.
    Cue(SoundCue),
    ScreenChanged(Screen),
    Navigated(Transition),
    PersonaSelected(usize),
    TitleClosing,
    SlideChanged(usize),
    ProjectOpened { persona: usize, project: usize },
    SoundChanged(bool),
    Quit,
}

/// Screen rectangles (terminal cells) mapped to click targets.
#[derive(Clone, Debug, Default)]
pub struct HitMap {
    regions: Vec<(u16, u16, u16, u16, ClickTarget)>,
}

impl HitMap {
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn add(&mut self, x: u16, y: u16, w: u16, h: u16, target: ClickTarget) {
        if w > 0 && h > 0 {
            self.regions.push((x, y, w, h, target));
        }
    }

    /// Topmost region containing the cell; later regions win.
    pub fn hit(&self, col: u16, row: u16) -> Option<ClickTarget> {
        self.regions
            .iter()
            .rev()
            .find(|&&(x, y, w, h, _)| {
                let inside = |p: u16, start: u16, len: u16| p >= start && u32::from(p - start) < u32::from(len);
                inside(col, x, w) && inside(row, y, h)
            })
            .map(|r| r.4)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.regions.len()
    }
}
