//! Multi-touch bookkeeping for a single-pointer orbit.
//!
//! The first finger down owns the drag. Extra fingers only count towards the
//! "any touch point is down" rule, so the interaction ends when the last
//! finger lifts, not the first. If the drag finger lifts early, the next
//! remaining finger to move takes the drag over.

use std::collections::HashSet;

use vitrine_core::InteractionSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// First finger down.
    Begin,
    /// The drag finger moved.
    Drag,
    /// A remaining finger takes over the drag.
    Adopt,
    /// The drag finger lifted while others stay down.
    Release,
    /// Last finger lifted.
    Finish,
    /// A known secondary finger changed.
    Hold,
    /// Unknown or repeated touch id.
    Ignore,
}

impl TouchAction {
    pub fn signal(self) -> Option<InteractionSignal> {
        match self {
            Self::Begin => Some(InteractionSignal::Start),
            Self::Drag | Self::Adopt => Some(InteractionSignal::Move),
            Self::Finish => Some(InteractionSignal::End),
            Self::Release | Self::Hold | Self::Ignore => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct TouchTracker {
    down: HashSet<u64>,
    primary: Option<u64>,
}

impl TouchTracker {
    pub fn active_count(&self) -> usize {
        self.down.len()
    }

    pub fn started(&mut self, id: u64) -> TouchAction {
        if !self.down.insert(id) {
            return TouchAction::Ignore;
        }
        match self.primary {
            Some(_) => TouchAction::Hold,
            None if self.down.len() == 1 => {
                self.primary = Some(id);
                TouchAction::Begin
            }
            None => {
                self.primary = Some(id);
                TouchAction::Adopt
            }
        }
    }

    pub fn moved(&mut self, id: u64) -> TouchAction {
        if !self.down.contains(&id) {
            return TouchAction::Ignore;
        }
        match self.primary {
            Some(primary) if primary == id => TouchAction::Drag,
            Some(_) => TouchAction::Hold,
            None => {
                self.primary = Some(id);
                TouchAction::Adopt
            }
        }
    }

    /// Also used for cancelled touches.
    pub fn ended(&mut self, id: u64) -> TouchAction {
        if !self.down.remove(&id) {
            return TouchAction::Ignore;
        }
        if self.down.is_empty() {
            self.primary = None;
            TouchAction::Finish
        } else if self.primary == Some(id) {
            self.primary = None;
            TouchAction::Release
        } else {
            TouchAction::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{InteractionGate, InteractionState};

    fn feed(gate: &mut InteractionGate, action: TouchAction) -> TouchAction {
        if let Some(signal) = action.signal() {
            gate.apply(signal);
        }
        action
    }

    #[test]
    fn single_finger_begins_drags_and_finishes() {
        let mut touches = TouchTracker::default();
        assert_eq!(touches.started(7), TouchAction::Begin);
        assert_eq!(touches.moved(7), TouchAction::Drag);
        assert_eq!(touches.ended(7), TouchAction::Finish);
        assert_eq!(touches.active_count(), 0);
    }

    #[test]
    fn lifting_a_second_finger_keeps_the_interaction_active() {
        let mut touches = TouchTracker::default();
        let mut gate = InteractionGate::new();

        feed(&mut gate, touches.started(0));
        feed(&mut gate, touches.started(1));
        assert_eq!(feed(&mut gate, touches.ended(1)), TouchAction::Hold);
        assert_eq!(gate.state(), InteractionState::Active);

        assert_eq!(feed(&mut gate, touches.moved(0)), TouchAction::Drag);
        assert_eq!(gate.state(), InteractionState::Active);

        assert_eq!(feed(&mut gate, touches.ended(0)), TouchAction::Finish);
        assert_eq!(gate.state(), InteractionState::Idle);
    }

    #[test]
    fn remaining_finger_adopts_the_drag_when_the_first_lifts() {
        let mut touches = TouchTracker::default();
        let mut gate = InteractionGate::new();

        feed(&mut gate, touches.started(0));
        feed(&mut gate, touches.started(1));
        assert_eq!(touches.moved(1), TouchAction::Hold);
        assert_eq!(feed(&mut gate, touches.ended(0)), TouchAction::Release);
        assert_eq!(gate.state(), InteractionState::Active);

        assert_eq!(feed(&mut gate, touches.moved(1)), TouchAction::Adopt);
        assert_eq!(touches.moved(1), TouchAction::Drag);
        assert_eq!(feed(&mut gate, touches.ended(1)), TouchAction::Finish);
        assert_eq!(gate.state(), InteractionState::Idle);
    }

    #[test]
    fn unknown_and_repeated_ids_are_ignored() {
        let mut touches = TouchTracker::default();
        assert_eq!(touches.moved(3), TouchAction::Ignore);
        assert_eq!(touches.ended(3), TouchAction::Ignore);
        assert_eq!(touches.started(3), TouchAction::Begin);
        assert_eq!(touches.started(3), TouchAction::Ignore);
        assert_eq!(touches.active_count(), 1);
    }

    #[test]
    fn only_begin_drag_adopt_and_finish_reach_the_gate() {
        assert_eq!(TouchAction::Begin.signal(), Some(InteractionSignal::Start));
        assert_eq!(TouchAction::Adopt.signal(), Some(InteractionSignal::Move));
        assert_eq!(TouchAction::Finish.signal(), Some(InteractionSignal::End));
        assert_eq!(TouchAction::Release.signal(), None);
        assert_eq!(TouchAction::Hold.signal(), None);
    }
}
