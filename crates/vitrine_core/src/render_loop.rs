//! Per-frame update/draw cycle.
//!
//! ```text
//! Stopped --start--> Running <--interaction--> Suspended --stop--> Stopped
//! ```
//!
//! In [`RenderMode::Continuous`] the scheduler ticks every frame for as long
//! as the loop runs and interaction only holds the rotation. In
//! [`RenderMode::OnDemand`] an active interaction cancels the scheduled
//! frames; while suspended, only orbit "change" signals produce a frame,
//! and interaction end resumes the loop.

use serde::Deserialize;

use crate::engine::{FrameScheduler, RenderEngine};
use crate::interaction::InteractionState;

pub const DEFAULT_ROTATION_PER_FRAME: f32 = 0.009;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    #[default]
    Continuous,
    OnDemand,
}

impl RenderMode {
    pub const ALL: &'static [RenderMode] = &[RenderMode::Continuous, RenderMode::OnDemand];

    pub fn label(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::OnDemand => "on-demand",
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
    Suspended,
}

/// Snapshot of the other components' state, read once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInputs {
    pub content_ready: bool,
    pub interaction: InteractionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub drew: bool,
    pub rotated: bool,
}

#[derive(Debug)]
pub struct RenderLoopController {
    mode: RenderMode,
    state: LoopState,
    rotation_per_frame: f32,
    pending_frame: bool,
    frames_drawn: u64,
}

impl RenderLoopController {
    pub fn new(mode: RenderMode, rotation_per_frame: f32) -> Self {
        Self {
            mode,
            state: LoopState::Stopped,
            rotation_per_frame,
            pending_frame: false,
            frames_drawn: 0,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn rotation_per_frame(&self) -> f32 {
        self.rotation_per_frame
    }

    pub fn start(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.state != LoopState::Stopped {
            return;
        }
        self.state = LoopState::Running;
        scheduler.register_frame_loop();
        log::debug!("Render loop started ({})", self.mode);
    }

    pub fn stop(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.state == LoopState::Stopped {
            return;
        }
        if self.state == LoopState::Running {
            scheduler.cancel_frame_loop();
        }
        self.state = LoopState::Stopped;
        self.pending_frame = false;
        log::debug!("Render loop stopped after {} frames", self.frames_drawn);
    }

    pub fn on_interaction_start(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.mode == RenderMode::OnDemand && self.state == LoopState::Running {
            scheduler.cancel_frame_loop();
            self.state = LoopState::Suspended;
        }
    }

    pub fn on_interaction_end(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.state == LoopState::Suspended {
            self.state = LoopState::Running;
            self.pending_frame = false;
            scheduler.register_frame_loop();
        }
    }

    /// Orbit controls moved the camera.
    pub fn on_controls_change(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.state == LoopState::Suspended && !self.pending_frame {
            self.pending_frame = true;
            scheduler.request_frame();
        }
    }

    pub fn tick<E: RenderEngine>(&mut self, engine: &mut E, inputs: FrameInputs) -> FrameReport {
        match self.state {
            LoopState::Stopped => return FrameReport::default(),
            LoopState::Suspended if !self.pending_frame => return FrameReport::default(),
            LoopState::Suspended => self.pending_frame = false,
            LoopState::Running => {}
        }

        let mut rotated = false;
        if inputs.content_ready && inputs.interaction == InteractionState::Idle {
            if let Some(rotation) = engine.model_rotation_mut() {
                *rotation += self.rotation_per_frame;
                rotated = true;
            }
        }

        engine.draw();
        self.frames_drawn += 1;
        FrameReport {
            drew: true,
            rotated,
        }
    }
}
