//! Tracks whether the user is manipulating the view.
//!
//! Touch and pointer signals from the drawing surface feed one two-state
//! gate. There is no debouncing: start and move mark the gate active, a
//! single end or cancel returns it to idle no matter how many starts came
//! before.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionSignal {
    Start,
    Move,
    End,
}

#[derive(Debug, Default)]
pub struct InteractionGate {
    state: InteractionState,
}

impl InteractionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == InteractionState::Active
    }

    /// Apply a signal. Returns the new state when it changed.
    pub fn apply(&mut self, signal: InteractionSignal) -> Option<InteractionState> {
        let next = match signal {
            InteractionSignal::Start | InteractionSignal::Move => InteractionState::Active,
            InteractionSignal::End => InteractionState::Idle,
        };
        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }

    pub fn on_interaction_start(&mut self) -> Option<InteractionState> {
        self.apply(InteractionSignal::Start)
    }

    pub fn on_interaction_move(&mut self) -> Option<InteractionState> {
        self.apply(InteractionSignal::Move)
    }

    pub fn on_interaction_end(&mut self) -> Option<InteractionState> {
        self.apply(InteractionSignal::End)
    }
}
