/// Terminal input tracker.
///
/// Drains crossterm events once per frame and sorts them into:
///   - fresh key presses (edge-triggered; Release events are ignored)
///   - pointer gestures: clicks, drags (reported as swipes) and wheel notches
///
/// Drag distances are converted from cells to pixels with the configured
/// cell size so swipe thresholds read the same as on a touch screen.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::config::InputConfig;
use crate::domain::gesture::Swipe;
use crate::sim::event::Intent;

/// A pointer gesture in terminal cells (clicks) or pixels (swipes).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pointer {
    Click { col: u16, row: u16 },
    Swipe(Swipe),
    WheelX(f32),
    WheelY(f32),
}

pub struct InputState {
    /// Keys pressed during the most recent `drain_events()` call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Pointer gestures completed during the most recent drain.
    pub pointer: Vec<Pointer>,

    drag_start: Option<(u16, u16)>,
    cell_w: f32,
    cell_h: f32,
    wheel_step: f32,
}

impl InputState {
    pub fn new(cfg: &InputConfig) -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            pointer: Vec::with_capacity(4),
            drag_start: None,
            cell_w: cfg.cell_width_px,
            cell_h: cfg.cell_height_px,
            wheel_step: cfg.wheel_step,
        }
    }

    /// Drain all pending terminal events.
    /// Call this once per frame, before the state update.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.pointer.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    self.raw_events.push(key);
                    self.fresh_presses.push(key.code);
                }
                Ok(Event::Mouse(mouse)) => {
                    if let Some(p) = self.translate_mouse(mouse) {
                        self.pointer.push(p);
                    }
                }
                _ => {}
            }
        }
    }

    /// Fold one mouse event into the drag tracker.
    pub fn translate_mouse(&mut self, mouse: MouseEvent) -> Option<Pointer> {
        let horizontal = mouse.modifiers.contains(KeyModifiers::SHIFT);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_start = Some((mouse.column, mouse.row));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let (sx, sy) = self.drag_start.take()?;
                if (sx, sy) == (mouse.column, mouse.row) {
                    return Some(Pointer::Click { col: sx, row: sy });
                }
                Some(Pointer::Swipe(Swipe {
                    start_x: sx as f32 * self.cell_w,
                    start_y: sy as f32 * self.cell_h,
                    end_x: mouse.column as f32 * self.cell_w,
                    end_y: mouse.row as f32 * self.cell_h,
                }))
            }
            // Shift+wheel scrolls sideways, as in most browsers.
            MouseEventKind::ScrollDown if horizontal => Some(Pointer::WheelX(self.wheel_step)),
            MouseEventKind::ScrollUp if horizontal => Some(Pointer::WheelX(-self.wheel_step)),
            MouseEventKind::ScrollDown => Some(Pointer::WheelY(self.wheel_step)),
            MouseEventKind::ScrollUp => Some(Pointer::WheelY(-self.wheel_step)),
            MouseEventKind::ScrollRight => Some(Pointer::WheelX(self.wheel_step)),
            MouseEventKind::ScrollLeft => Some(Pointer::WheelX(-self.wheel_step)),
            _ => None,
        }
    }

    pub fn presses(&self) -> &[KeyCode] {
        &self.fresh_presses
    }

    /// Any key press or click this frame (wheel and drags don't count).
    pub fn interacted(&self) -> bool {
        !self.fresh_presses.is_empty()
            || self.pointer.iter().any(|p| matches!(p, Pointer::Click { .. }))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Keyboard binding for a single key.
pub fn key_intent(code: KeyCode) -> Option<Intent> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Intent::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Intent::Right),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Intent::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::Down),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Intent::Confirm),
        KeyCode::Esc | KeyCode::Backspace => Some(Intent::Back),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Intent::ToggleSound),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Intent::Quit),
        KeyCode::Char(c @ '1'..='9') => Some(Intent::Digit(c as usize - '1' as usize)),
        _ => None,
    }
}
