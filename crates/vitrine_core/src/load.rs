//! Asset load session tracking and overlay state.
//!
//! One session per `begin_load`. Progress callbacks may arrive any number of
//! times before exactly one terminal callback (complete or error). Once the
//! outcome is terminal every further callback is rejected with
//! [`ViewerError::InvalidStateTransition`] and leaves state untouched.
//!
//! Overlay changes are not pushed to the host directly. They are queued and
//! drained with [`AssetLoadState::take_overlay_update`] on the host's next
//! frame, which lets repeated progress events collapse into one paint.

use std::time::{Duration, Instant};

use crate::error::{AssetLoadError, ViewerError, ViewerResult};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadProgress {
    pub loaded_count: u32,
    pub total_count: u32,
    /// Always within `[0, 1]`.
    pub fraction: f32,
}

impl LoadProgress {
    pub fn percent(&self) -> u32 {
        (self.fraction * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Pending,
    Succeeded,
    Failed(AssetLoadError),
}

impl LoadOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How a reported load failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep the overlay up in its soft-fail presentation.
    #[default]
    SoftFail,
    /// Behave as if the load succeeded with no content. Some deployments
    /// point at a missing asset on purpose and only want the reveal.
    TreatAsSuccess,
}

impl FailurePolicy {
    pub fn from_flag(treat_failure_as_success: bool) -> Self {
        if treat_failure_as_success {
            Self::TreatAsSuccess
        } else {
            Self::SoftFail
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPresentation {
    Loading,
    SoftFail,
    Hidden,
}

/// Everything the overlay needs to paint one state.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub presentation: OverlayPresentation,
    /// Horizontal scale of the progress bar fill.
    pub fraction: f32,
    pub percent_label: String,
    pub blur_visible: bool,
    /// Progress bar track and fill.
    pub indicator_visible: bool,
    pub label_visible: bool,
}

impl OverlayView {
    pub fn loading(fraction: f32) -> Self {
        Self {
            presentation: OverlayPresentation::Loading,
            fraction,
            percent_label: percent_label(fraction),
            blur_visible: true,
            indicator_visible: true,
            label_visible: true,
        }
    }

    /// Blur and bar drop away; the overlay stays up with the last percentage.
    pub fn soft_fail(fraction: f32) -> Self {
        Self {
            presentation: OverlayPresentation::SoftFail,
            fraction,
            percent_label: percent_label(fraction),
            blur_visible: false,
            indicator_visible: false,
            label_visible: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            presentation: OverlayPresentation::Hidden,
            fraction: 1.0,
            percent_label: percent_label(1.0),
            blur_visible: false,
            indicator_visible: false,
            label_visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.presentation != OverlayPresentation::Hidden
    }
}

fn percent_label(fraction: f32) -> String {
    format!("{} %", (fraction * 100.0).round() as u32)
}

/// What the host should do once the settle delay after success has elapsed.
#[derive(Debug, PartialEq)]
pub enum Reveal<M> {
    /// Hide the overlay and attach the loaded content to the scene.
    Attach(M),
    /// Hide the overlay; there is nothing to attach.
    HideOnly,
}

#[derive(Debug)]
struct LoadSession<M> {
    source_id: String,
    progress: LoadProgress,
    outcome: LoadOutcome,
    staged: Option<M>,
    reveal_at: Option<Instant>,
    revealed: bool,
}

#[derive(Debug)]
pub struct AssetLoadState<M> {
    session: Option<LoadSession<M>>,
    policy: FailurePolicy,
    settle_delay: Duration,
    overlay: OverlayView,
    overlay_dirty: bool,
}

impl<M> AssetLoadState<M> {
    pub fn new(policy: FailurePolicy, settle_delay: Duration) -> Self {
        Self {
            session: None,
            policy,
            settle_delay,
            overlay: OverlayView::loading(0.0),
            overlay_dirty: false,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn source_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.source_id.as_str())
    }

    /// `None` until the first `begin_load`.
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.session.as_ref().map(|s| &s.outcome)
    }

    pub fn progress(&self) -> LoadProgress {
        self.session.as_ref().map(|s| s.progress).unwrap_or_default()
    }

    pub fn overlay(&self) -> &OverlayView {
        &self.overlay
    }

    /// True once the success reveal has happened; the model may rotate from here on.
    pub fn is_content_ready(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.outcome == LoadOutcome::Succeeded && s.revealed)
    }

    pub fn begin_load(&mut self, source_id: &str) -> ViewerResult<()> {
        if let Some(session) = &self.session {
            if !session.outcome.is_terminal() {
                return Err(ViewerError::AlreadyLoading(session.source_id.clone()));
            }
        }

        log::info!("Loading asset '{source_id}'");
        self.session = Some(LoadSession {
            source_id: source_id.to_string(),
            progress: LoadProgress::default(),
            outcome: LoadOutcome::Pending,
            staged: None,
            reveal_at: None,
            revealed: false,
        });
        self.publish(OverlayView::loading(0.0));
        Ok(())
    }

    pub fn on_progress(&mut self, items_loaded: u32, items_total: u32) -> ViewerResult<()> {
        let session = self.pending_session(LoadSignal::Progress)?;
        session.progress.loaded_count = items_loaded;
        session.progress.total_count = items_total;
        if items_total == 0 {
            return Ok(());
        }

        let fraction = (items_loaded as f32 / items_total as f32).clamp(0.0, 1.0);
        session.progress.fraction = fraction;
        log::debug!("{} %", session.progress.percent());
        self.publish(OverlayView::loading(fraction));
        Ok(())
    }

    pub fn on_complete(&mut self, content: M, now: Instant) -> ViewerResult<()> {
        let settle_delay = self.settle_delay;
        let session = self.pending_session(LoadSignal::Complete)?;
        session.outcome = LoadOutcome::Succeeded;
        session.staged = Some(content);
        session.reveal_at = Some(now + settle_delay);
        log::info!("Asset '{}' loaded", session.source_id);
        Ok(())
    }

    pub fn on_error(&mut self, error: AssetLoadError, now: Instant) -> ViewerResult<()> {
        let settle_delay = self.settle_delay;
        let policy = self.policy;
        let session = self.pending_session(LoadSignal::Error)?;
        match policy {
            FailurePolicy::SoftFail => {
                log::warn!("{error}");
                session.outcome = LoadOutcome::Failed(error);
                let fraction = session.progress.fraction;
                self.publish(OverlayView::soft_fail(fraction));
            }
            FailurePolicy::TreatAsSuccess => {
                log::info!("{error}; revealing anyway");
                session.outcome = LoadOutcome::Succeeded;
                session.reveal_at = Some(now + settle_delay);
            }
        }
        Ok(())
    }

    /// Fire the success reveal once its settle delay has elapsed. Returns
    /// `Some` at most once per session.
    pub fn poll(&mut self, now: Instant) -> Option<Reveal<M>> {
        let session = self.session.as_mut()?;
        if session.revealed || session.outcome != LoadOutcome::Succeeded {
            return None;
        }
        if session.reveal_at.is_some_and(|at| now < at) {
            return None;
        }

        session.revealed = true;
        let reveal = match session.staged.take() {
            Some(content) => Reveal::Attach(content),
            None => Reveal::HideOnly,
        };
        self.publish(OverlayView::hidden());
        Some(reveal)
    }

    /// When the pending reveal is due, if there is one.
    pub fn next_deadline(&self) -> Option<Instant> {
        let session = self.session.as_ref()?;
        if session.revealed {
            return None;
        }
        session.reveal_at
    }

    /// Drain the queued overlay change, if any.
    pub fn take_overlay_update(&mut self) -> Option<OverlayView> {
        if !self.overlay_dirty {
            return None;
        }
        self.overlay_dirty = false;
        Some(self.overlay.clone())
    }

    fn publish(&mut self, view: OverlayView) {
        self.overlay = view;
        self.overlay_dirty = true;
    }

    fn pending_session(&mut self, signal: LoadSignal) -> ViewerResult<&mut LoadSession<M>> {
        let Some(session) = self.session.as_mut() else {
            return Err(ViewerError::InvalidStateTransition(signal.without_session()));
        };
        if session.outcome.is_terminal() {
            return Err(ViewerError::InvalidStateTransition(signal.after_terminal()));
        }
        Ok(session)
    }
}

#[derive(Clone, Copy)]
enum LoadSignal {
    Progress,
    Complete,
    Error,
}

impl LoadSignal {
    fn without_session(self) -> &'static str {
        match self {
            Self::Progress => "progress reported without a load session",
            Self::Complete => "completion reported without a load session",
            Self::Error => "error reported without a load session",
        }
    }

    fn after_terminal(self) -> &'static str {
        match self {
            Self::Progress => "progress reported after the load finished",
            Self::Complete => "completion reported after the load finished",
            Self::Error => "error reported after the load finished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(500);

    fn soft_fail_state() -> AssetLoadState<&'static str> {
        AssetLoadState::new(FailurePolicy::SoftFail, SETTLE)
    }

    #[test]
    fn progress_then_complete_reveals_after_settle_delay() {
        let t0 = Instant::now();
        let mut state = soft_fail_state();
        state.begin_load("m1").expect("first session should start");

        state.on_progress(5, 10).expect("progress while pending");
        assert_eq!(state.progress().fraction, 0.5);
        state.on_progress(10, 10).expect("progress while pending");
        state.on_complete("handle", t0).expect("complete while pending");

        assert_eq!(state.outcome(), Some(&LoadOutcome::Succeeded));
        assert!(!state.is_content_ready());
        assert_eq!(state.poll(t0 + Duration::from_millis(499)), None);
        assert!(state.overlay().is_visible());

        assert_eq!(state.poll(t0 + SETTLE), Some(Reveal::Attach("handle")));
        assert!(state.is_content_ready());
        assert!(!state.overlay().is_visible());

        let err = state
            .on_error(AssetLoadError::new("m1", "late"), t0)
            .expect_err("error after success is rejected");
        assert!(matches!(err, ViewerError::InvalidStateTransition(_)));
        assert_eq!(state.outcome(), Some(&LoadOutcome::Succeeded));
    }

    #[test]
    fn second_complete_neither_restages_nor_rearms_timer() {
        let t0 = Instant::now();
        let mut state = soft_fail_state();
        state.begin_load("m1").unwrap();
        state.on_complete("first", t0).unwrap();
        assert!(state.on_complete("second", t0 + SETTLE).is_err());
        assert_eq!(state.next_deadline(), Some(t0 + SETTLE));

        assert_eq!(state.poll(t0 + SETTLE), Some(Reveal::Attach("first")));
        assert_eq!(state.poll(t0 + SETTLE * 4), None);
        assert!(state.on_complete("third", t0 + SETTLE * 4).is_err());
        assert_eq!(state.poll(t0 + SETTLE * 8), None);
        assert_eq!(state.next_deadline(), None);
    }

    #[test]
    fn zero_total_leaves_fraction_unchanged() {
        let mut state = soft_fail_state();
        state.begin_load("m1").unwrap();
        state.on_progress(3, 4).unwrap();
        state.take_overlay_update();

        state.on_progress(0, 0).expect("zero total is tolerated");
        let fraction = state.progress().fraction;
        assert_eq!(fraction, 0.75);
        assert!(!fraction.is_nan());
        assert_eq!(state.take_overlay_update(), None);
    }

    #[test]
    fn fraction_is_clamped_to_unit_range() {
        let mut state = soft_fail_state();
        state.begin_load("m1").unwrap();
        for (loaded, total) in [(0, 3), (1, 3), (7, 3), (2, 1), (u32::MAX, 1)] {
            state.on_progress(loaded, total).unwrap();
            let fraction = state.progress().fraction;
            assert!((0.0..=1.0).contains(&fraction), "{loaded}/{total} -> {fraction}");
        }
        assert_eq!(state.progress().fraction, 1.0);
    }

    #[test]
    fn immediate_error_enters_soft_fail_and_never_stages_content() {
        let t0 = Instant::now();
        let mut state = soft_fail_state();
        state.begin_load("m1").unwrap();
        state
            .on_error(AssetLoadError::new("m1", "404"), t0)
            .expect("error while pending");

        assert!(matches!(state.outcome(), Some(LoadOutcome::Failed(_))));
        let view = state.take_overlay_update().expect("soft-fail is published");
        assert_eq!(view.presentation, OverlayPresentation::SoftFail);
        assert!(!view.blur_visible);
        assert!(!view.indicator_visible);
        assert!(view.label_visible);
        assert!(view.is_visible());

        assert_eq!(state.poll(t0 + SETTLE * 10), None);
        assert!(!state.is_content_ready());
        assert!(state.on_complete("late", t0).is_err());
    }

    #[test]
    fn treat_as_success_reveals_without_content() {
        let t0 = Instant::now();
        let mut state: AssetLoadState<&str> =
            AssetLoadState::new(FailurePolicy::TreatAsSuccess, SETTLE);
        state.begin_load("missing.gltf").unwrap();
        state
            .on_error(AssetLoadError::new("missing.gltf", "404"), t0)
            .unwrap();

        assert_eq!(state.outcome(), Some(&LoadOutcome::Succeeded));
        assert_eq!(state.poll(t0 + SETTLE), Some(Reveal::HideOnly));
        let view = state.take_overlay_update().expect("hidden is published");
        assert_eq!(view.presentation, OverlayPresentation::Hidden);
    }

    #[test]
    fn begin_load_rejects_a_second_pending_session() {
        let t0 = Instant::now();
        let mut state = soft_fail_state();
        state.begin_load("m1").unwrap();
        let err = state.begin_load("m2").expect_err("pending session blocks a new one");
        assert_eq!(err, ViewerError::AlreadyLoading("m1".to_string()));

        state.on_error(AssetLoadError::new("m1", "boom"), t0).unwrap();
        state.begin_load("m2").expect("terminal session can be replaced");
        assert_eq!(state.source_id(), Some("m2"));
        assert_eq!(state.outcome(), Some(&LoadOutcome::Pending));
    }

    #[test]
    fn callbacks_without_a_session_are_rejected() {
        let mut state = soft_fail_state();
        assert!(state.on_progress(1, 2).is_err());
        assert!(state.on_complete("x", Instant::now()).is_err());
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn overlay_updates_are_batched_until_drained() {
        let mut state = soft_fail_state();
        state.begin_load("m1").unwrap();
        state.on_progress(1, 4).unwrap();
        state.on_progress(2, 4).unwrap();
        state.on_progress(3, 4).unwrap();

        let view = state.take_overlay_update().expect("latest progress is queued");
        assert_eq!(view.fraction, 0.75);
        assert_eq!(view.percent_label, "75 %");
        assert_eq!(state.take_overlay_update(), None);
    }
}
