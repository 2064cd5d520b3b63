//!
//! Input Debouncing
//!
//! Keys, bumpers and limit switches all bounce.  A [`Debouncer`] is fed one
//! raw sample per manager tick and only reports an [`Edge`] once the input
//! has held its new value for a configurable number of consecutive samples.
//!

/// The four states of the debounce machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceState {
    /// The input is settled released
    Released,
    /// The input reads pressed but has not held long enough
    PressedDebounce,
    /// The input is settled pressed
    Pressed,
    /// The input reads released but has not held long enough
    ReleaseDebounce,
}

/// A confirmed change of the input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// The input settled pressed
    Pressed,
    /// The input settled released
    Released,
}

/// Debounces a single boolean input
#[derive(Clone, Debug)]
pub struct Debouncer {
    /// The current state of the machine
    state: DebounceState,
    /// Consecutive samples seen in the current debounce state
    count: u16,
    /// Consecutive samples required to confirm an edge
    samples: u16,
}

impl Debouncer {
    /// Create a released debouncer confirming edges after `samples`
    /// consecutive matching samples (at least one).
    pub const fn new(samples: u16) -> Self {
        Self {
            state: DebounceState::Released,
            count: 0,
            samples: if samples == 0 { 1 } else { samples },
        }
    }

    /// The current state of the machine
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Whether the input is settled pressed
    pub fn is_pressed(&self) -> bool {
        matches!(
            self.state,
            DebounceState::Pressed | DebounceState::ReleaseDebounce
        )
    }

    /// Return to the settled released state
    pub fn reset(&mut self) {
        self.state = DebounceState::Released;
        self.count = 0;
    }

    /// Feed one raw sample, returning the edge it confirms (if any)
    pub fn update(&mut self, pressed: bool) -> Option<Edge> {
        match (self.state, pressed) {
            (DebounceState::Released, true) => {
                self.count = 0;
                self.advance(DebounceState::PressedDebounce)
            }
            (DebounceState::PressedDebounce, true) | (DebounceState::ReleaseDebounce, false) => {
                self.advance(self.state)
            }
            (DebounceState::PressedDebounce, false) => {
                self.reset();
                None
            }
            (DebounceState::Pressed, false) => {
                self.count = 0;
                self.advance(DebounceState::ReleaseDebounce)
            }
            (DebounceState::ReleaseDebounce, true) => {
                self.state = DebounceState::Pressed;
                self.count = 0;
                None
            }
            (DebounceState::Released, false) | (DebounceState::Pressed, true) => None,
        }
    }

    /// Count one more sample in a debounce state, settling once enough
    /// samples have been seen
    fn advance(&mut self, waiting: DebounceState) -> Option<Edge> {
        self.count = self.count.saturating_add(1);
        if self.count < self.samples {
            self.state = waiting;
            return None;
        }

        self.count = 0;
        if waiting == DebounceState::PressedDebounce {
            self.state = DebounceState::Pressed;
            Some(Edge::Pressed)
        } else {
            self.state = DebounceState::Released;
            Some(Edge::Released)
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(3)
    }
}
