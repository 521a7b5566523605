use crate::capture::CaptureHost;
use crate::comparison::{ComparisonSlider, HitTarget, Reference, SliderState, INITIAL_POSITION, REST_POSITION};
use crate::image_loader::ImageSlots;
use log::{debug, info};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(500);
pub const MODE_FADE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Setup,
    Comparing,
}

/// One-shot move of the divider to its resting position shortly after the
/// comparison opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSweep {
    due: Instant,
}

impl RevealSweep {
    pub fn due(&self) -> Instant {
        self.due
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}

/// Read-only snapshot handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionView {
    pub mode: SessionMode,
    pub slider: SliderState,
    pub can_compare: bool,
}

/// Owns the mode, the slider and the image slots. All writes go through here.
pub struct Session {
    mode: SessionMode,
    slider: ComparisonSlider,
    slots: ImageSlots,
    reveal: Option<RevealSweep>,
    reveal_delay: Duration,
    mode_changed_at: Instant,
}

impl Session {
    pub fn new(reveal_delay: Duration, now: Instant) -> Self {
        Self {
            mode: SessionMode::Setup,
            slider: ComparisonSlider::new(),
            slots: ImageSlots::new(),
            reveal: None,
            reveal_delay,
            mode_changed_at: now,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn slider(&self) -> SliderState {
        self.slider.state()
    }

    pub fn slots(&self) -> &ImageSlots {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut ImageSlots {
        &mut self.slots
    }

    pub fn pending_reveal(&self) -> Option<RevealSweep> {
        self.reveal
    }

    pub fn can_compare(&self) -> bool {
        self.mode == SessionMode::Setup && self.slots.is_complete()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.mode,
            slider: self.slider.state(),
            can_compare: self.can_compare(),
        }
    }

    /// Setup -> Comparing. The divider starts at the left edge and sweeps to
    /// the middle once the reveal delay has passed.
    pub fn enter_comparison(&mut self, now: Instant) -> bool {
        if !self.can_compare() {
            return false;
        }
        self.slider.teardown();
        self.slider.set_position(INITIAL_POSITION);
        self.reveal = Some(RevealSweep {
            due: now + self.reveal_delay,
        });
        self.set_mode(SessionMode::Comparing, now);
        true
    }

    /// Back to Setup: pending reveal cancelled, any drag torn down, divider
    /// back at its initial position. Slots are kept.
    pub fn reset(&mut self, now: Instant) {
        if self.reveal.take().is_some() {
            debug!("Cancelled pending reveal");
        }
        self.slider.teardown();
        self.slider.set_position(INITIAL_POSITION);
        if self.mode != SessionMode::Setup {
            self.set_mode(SessionMode::Setup, now);
        }
    }

    /// Fires the reveal once it is due. Returns true if state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.reveal {
            Some(reveal) if reveal.is_due(now) => {
                self.reveal = None;
                if self.mode != SessionMode::Comparing {
                    return false;
                }
                debug!("Reveal sweep to {}", REST_POSITION);
                self.slider.set_position(REST_POSITION);
                true
            }
            _ => false,
        }
    }

    pub fn press(&mut self, x: f32, target: HitTarget, reference: Reference, host: Rc<dyn CaptureHost>) {
        if self.mode != SessionMode::Comparing {
            return;
        }
        if self.reveal.take().is_some() {
            debug!("Press cancelled pending reveal");
        }
        self.slider.press(x, target, reference, host);
    }

    pub fn drag(&mut self, x: f32, reference: Reference) -> bool {
        if self.mode != SessionMode::Comparing {
            return false;
        }
        self.slider.drag(x, reference)
    }

    pub fn release(&mut self) {
        self.slider.release();
    }

    /// Progress in [0, 1] of the fade that follows the last mode change.
    pub fn transition_progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.mode_changed_at);
        (elapsed.as_secs_f32() / MODE_FADE.as_secs_f32()).min(1.0)
    }

    fn set_mode(&mut self, mode: SessionMode, now: Instant) {
        info!("Session mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.mode_changed_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::DetachedHost;
    use crate::image_loader::Slot;

    fn host() -> Rc<dyn CaptureHost> {
        Rc::new(DetachedHost)
    }

    fn ready_session(now: Instant) -> Session {
        let mut session = Session::new(DEFAULT_REVEAL_DELAY, now);
        for slot in Slot::ALL {
            session
                .slots_mut()
                .submit(slot, slot.key(), vec![0], "image/png")
                .unwrap();
        }
        session
    }

    #[test]
    fn cannot_compare_until_all_slots_are_filled() {
        let now = Instant::now();
        let mut session = Session::new(DEFAULT_REVEAL_DELAY, now);
        assert!(!session.can_compare());
        assert!(!session.enter_comparison(now));
        assert_eq!(session.mode(), SessionMode::Setup);

        session
            .slots_mut()
            .submit(Slot::Light, "l", vec![0], "image/png")
            .unwrap();
        session
            .slots_mut()
            .submit(Slot::Dark, "d", vec![0], "image/png")
            .unwrap();
        assert!(!session.can_compare());
    }

    #[test]
    fn entry_resets_then_reveals_after_delay() {
        let start = Instant::now();
        let mut session = ready_session(start);
        session.slider.set_position(37.0);

        assert!(session.enter_comparison(start));
        assert_eq!(session.slider().position, 0.0);

        assert!(!session.tick(start + Duration::from_millis(499)));
        assert_eq!(session.slider().position, 0.0);

        assert!(session.tick(start + DEFAULT_REVEAL_DELAY));
        assert_eq!(session.slider().position, 50.0);
        assert!(session.pending_reveal().is_none());
    }

    #[test]
    fn reset_before_reveal_cancels_it() {
        let start = Instant::now();
        let mut session = ready_session(start);
        session.enter_comparison(start);
        session.reset(start + Duration::from_millis(100));

        assert!(session.pending_reveal().is_none());
        assert!(!session.tick(start + Duration::from_secs(5)));
        assert_eq!(session.mode(), SessionMode::Setup);
        assert_eq!(session.slider().position, 0.0);
    }

    #[test]
    fn press_before_reveal_keeps_user_position() {
        let start = Instant::now();
        let mut session = ready_session(start);
        session.enter_comparison(start);
        session.press(25.0, HitTarget::Surface, Reference::viewport(100.0), host());
        session.release();
        session.tick(start + Duration::from_secs(1));
        assert_eq!(session.slider().position, 25.0);
    }

    #[test]
    fn input_is_ignored_in_setup() {
        let now = Instant::now();
        let mut session = ready_session(now);
        session.press(80.0, HitTarget::Surface, Reference::viewport(100.0), host());
        assert!(!session.slider().dragging);
        assert!(!session.drag(90.0, Reference::viewport(100.0)));
        assert_eq!(session.slider().position, 0.0);
    }

    #[test]
    fn reset_mid_drag_releases_capture() {
        let now = Instant::now();
        let mut session = ready_session(now);
        session.enter_comparison(now);
        session.press(40.0, HitTarget::Surface, Reference::viewport(100.0), host());
        assert!(session.slider().dragging);
        session.reset(now);
        assert!(!session.slider().dragging);
        assert_eq!(session.view().mode, SessionMode::Setup);
        assert!(session.view().can_compare);
    }

    #[test]
    fn transition_progress_saturates() {
        let now = Instant::now();
        let mut session = ready_session(now);
        session.enter_comparison(now);
        assert_eq!(session.transition_progress(now), 0.0);
        assert!((session.transition_progress(now + Duration::from_millis(250)) - 0.5).abs() < 1e-3);
        assert_eq!(session.transition_progress(now + Duration::from_secs(3)), 1.0);
    }
}
