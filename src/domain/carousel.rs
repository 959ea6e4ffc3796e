/// Persona carousel: the selection screen's navigation state machine.
///
/// ## States
///   - `Idle`: accepts navigation requests
///   - `Animating`: a fixed-length slide is in flight; every request is dropped
///
/// The list is circular for ±1 movement. Requests past either end wrap to the
/// opposite end, and the direction follows the requested (unwrapped) index so
/// that wrapping forward still slides right.

use crate::domain::timer::{self, TimerSlot};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NavPhase {
    Idle,
    Animating,
}

/// Snapshot of the navigation state, as the renderer and tests see it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NavState {
    pub outgoing: Option<usize>,
    pub incoming: usize,
    pub direction: Direction,
    pub phase: NavPhase,
}

/// An accepted navigation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
}

pub struct Carousel {
    len: usize,
    state: NavState,
    settle: TimerSlot,
    started_ms: u64,
    duration_ms: u64,
}

impl Carousel {
    pub fn new(len: usize, duration_ms: u64) -> Self {
        Carousel {
            len,
            state: NavState {
                outgoing: None,
                incoming: 0,
                direction: Direction::Right,
                phase: NavPhase::Idle,
            },
            settle: TimerSlot::new(),
            started_ms: 0,
            duration_ms,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn current(&self) -> usize {
        self.state.incoming
    }

    pub fn is_idle(&self) -> bool {
        self.state.phase == NavPhase::Idle
    }

    /// Request a move to `requested`, which may lie one step outside the list.
    pub fn navigate_to(&mut self, requested: isize, now_ms: u64) -> Option<Transition> {
        if self.state.phase == NavPhase::Animating || self.len == 0 {
            return None;
        }

        let len = self.len as isize;
        let wrapped = if requested < 0 {
            self.len - 1
        } else if requested >= len {
            0
        } else {
            requested as usize
        };

        let from = self.state.incoming;
        if wrapped == from {
            return None;
        }

        let direction = if requested < 0 {
            Direction::Left
        } else if requested >= len {
            Direction::Right
        } else if wrapped > from {
            Direction::Right
        } else {
            Direction::Left
        };

        self.state = NavState {
            outgoing: Some(from),
            incoming: wrapped,
            direction,
            phase: NavPhase::Animating,
        };
        self.settle.arm(now_ms, self.duration_ms);
        self.started_ms = now_ms;

        Some(Transition { from, to: wrapped, direction })
    }

    /// Relative move, e.g. `step(-1, now)` for "previous".
    pub fn step(&mut self, delta: isize, now_ms: u64) -> Option<Transition> {
        self.navigate_to(self.state.incoming as isize + delta, now_ms)
    }

    /// Advance the clock. Returns true when a transition settled on this call.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if self.settle.fire(now_ms).is_some() {
            self.state.outgoing = None;
            self.state.phase = NavPhase::Idle;
            true
        } else {
            false
        }
    }

    /// Eased slide progress in `[0, 1]`; 1 when idle.
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.state.phase == NavPhase::Idle {
            return 1.0;
        }
        timer::ease_out(timer::progress(self.started_ms, self.duration_ms, now_ms))
    }
}
