use crate::capture::{CaptureHost, InputCapture};
use log::{debug, trace};
use std::rc::Rc;
use thiserror::Error;

pub const MIN_POSITION: f32 = 0.0;
pub const MAX_POSITION: f32 = 100.0;
pub const INITIAL_POSITION: f32 = MIN_POSITION;
pub const REST_POSITION: f32 = 50.0;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SliderError {
    #[error("reference width {width} cannot place the divider")]
    DegenerateGeometry { width: f32 },
}

/// Horizontal span the divider position is measured against: the whole
/// window (left = 0) or the comparison frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reference {
    pub left: f32,
    pub width: f32,
}

impl Reference {
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    pub fn viewport(width: f32) -> Self {
        Self { left: 0.0, width }
    }

    /// Screen x of a divider position.
    pub fn x_at(&self, position: f32) -> f32 {
        self.left + self.width * position / MAX_POSITION
    }
}

/// Percent of the reference width left of `x`, clamped to [0, 100].
pub fn position_at(x: f32, reference: Reference) -> Result<f32, SliderError> {
    let Reference { left, width } = reference;
    if !(width > 0.0) || !width.is_finite() || x.is_nan() {
        return Err(SliderError::DegenerateGeometry { width });
    }
    if x <= left {
        return Ok(MIN_POSITION);
    }
    if x >= left + width {
        return Ok(MAX_POSITION);
    }
    let relative = x - left;
    let percent = relative / width * MAX_POSITION;
    Ok(percent.clamp(MIN_POSITION, MAX_POSITION))
}

/// What a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle,
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderState {
    pub position: f32,
    pub dragging: bool,
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            position: INITIAL_POSITION,
            dragging: false,
        }
    }
}

/// The divider and its drag lifecycle. Dragging is exactly "holds an
/// `InputCapture`", so every way out of a drag releases the host.
pub struct ComparisonSlider {
    position: f32,
    capture: Option<InputCapture>,
}

impl Default for ComparisonSlider {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonSlider {
    pub fn new() -> Self {
        Self {
            position: INITIAL_POSITION,
            capture: None,
        }
    }

    pub fn state(&self) -> SliderState {
        SliderState {
            position: self.position,
            dragging: self.is_dragging(),
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.capture.is_some()
    }

    pub fn set_position(&mut self, position: f32) {
        if position.is_nan() {
            return;
        }
        self.position = position.clamp(MIN_POSITION, MAX_POSITION);
    }

    /// Pointer-down or touch-start. Pressing the handle itself only starts
    /// tracking; pressing anywhere else also jumps the divider there.
    pub fn press(
        &mut self,
        x: f32,
        target: HitTarget,
        reference: Reference,
        host: Rc<dyn CaptureHost>,
    ) {
        if self.capture.is_none() {
            debug!("Drag started at x = {} on {:?}", x, target);
            self.capture = Some(InputCapture::acquire(host));
        }
        if target != HitTarget::Handle {
            self.track(x, reference);
        }
    }

    /// Pointer or touch move. Ignored unless a drag is in progress.
    pub fn drag(&mut self, x: f32, reference: Reference) -> bool {
        if self.capture.is_none() {
            return false;
        }
        self.track(x, reference)
    }

    /// Pointer-up, touch-end or touch-cancel.
    pub fn release(&mut self) {
        if self.capture.take().is_some() {
            debug!("Drag ended at position {:.2}", self.position);
        }
    }

    pub fn teardown(&mut self) {
        self.release();
    }

    fn track(&mut self, x: f32, reference: Reference) -> bool {
        match position_at(x, reference) {
            Ok(position) => {
                trace!("Divider moved to {:.2}", position);
                let changed = position != self.position;
                self.position = position;
                changed
            }
            Err(SliderError::DegenerateGeometry { .. }) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::DetachedHost;
    use std::cell::Cell;

    #[derive(Default)]
    struct CursorProbe {
        captured: Cell<bool>,
        releases: Cell<u32>,
    }

    impl CaptureHost for CursorProbe {
        fn begin_capture(&self) {
            self.captured.set(true);
        }
        fn end_capture(&self) {
            self.captured.set(false);
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn detached() -> Rc<dyn CaptureHost> {
        Rc::new(DetachedHost)
    }

    #[test]
    fn position_follows_formula_inside_reference() {
        let reference = Reference::new(100.0, 400.0);
        assert_eq!(position_at(200.0, reference), Ok(25.0));
        assert_eq!(position_at(300.0, reference), Ok(50.0));
        assert_eq!(position_at(400.0, reference), Ok(75.0));
    }

    #[test]
    fn position_is_exact_at_and_beyond_edges() {
        let reference = Reference::new(13.7, 333.3);
        assert_eq!(position_at(13.7, reference), Ok(0.0));
        assert_eq!(position_at(-1.0e9, reference), Ok(0.0));
        assert_eq!(position_at(13.7 + 333.3, reference), Ok(100.0));
        assert_eq!(position_at(f32::INFINITY, reference), Ok(100.0));
        assert_eq!(position_at(f32::NEG_INFINITY, reference), Ok(0.0));
    }

    #[test]
    fn degenerate_reference_is_rejected() {
        assert!(position_at(10.0, Reference::viewport(0.0)).is_err());
        assert!(position_at(10.0, Reference::viewport(-5.0)).is_err());
        assert!(position_at(10.0, Reference::viewport(f32::NAN)).is_err());
        assert!(position_at(f32::NAN, Reference::viewport(100.0)).is_err());
    }

    #[test]
    fn press_on_surface_jumps_and_press_on_handle_does_not() {
        let reference = Reference::viewport(200.0);
        let mut slider = ComparisonSlider::new();
        slider.set_position(50.0);

        slider.press(150.0, HitTarget::Handle, reference, detached());
        assert!(slider.is_dragging());
        assert_eq!(slider.position(), 50.0);
        slider.release();

        slider.press(150.0, HitTarget::Surface, reference, detached());
        assert_eq!(slider.position(), 75.0);
    }

    #[test]
    fn drag_sequence_ends_idle_at_last_move() {
        let reference = Reference::new(0.0, 1000.0);
        let mut slider = ComparisonSlider::new();
        slider.press(100.0, HitTarget::Surface, reference, detached());
        for x in [200.0, 450.0, 750.0] {
            slider.drag(x, reference);
        }
        slider.release();
        assert_eq!(
            slider.state(),
            SliderState {
                position: 75.0,
                dragging: false
            }
        );
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut slider = ComparisonSlider::new();
        assert!(!slider.drag(80.0, Reference::viewport(100.0)));
        assert_eq!(slider.position(), INITIAL_POSITION);
    }

    #[test]
    fn zero_width_keeps_previous_position() {
        let mut slider = ComparisonSlider::new();
        slider.set_position(42.0);
        slider.press(10.0, HitTarget::Surface, Reference::viewport(0.0), detached());
        slider.drag(99.0, Reference::viewport(0.0));
        assert_eq!(slider.position(), 42.0);
        assert!(slider.is_dragging());
    }

    #[test]
    fn capture_is_released_on_every_exit() {
        let probe = Rc::new(CursorProbe::default());
        let reference = Reference::viewport(100.0);

        let mut slider = ComparisonSlider::new();
        slider.press(10.0, HitTarget::Surface, reference, probe.clone());
        assert!(probe.captured.get());
        slider.release();
        assert!(!probe.captured.get());

        slider.press(10.0, HitTarget::Surface, reference, probe.clone());
        slider.teardown();
        assert!(!probe.captured.get());

        slider.press(10.0, HitTarget::Surface, reference, probe.clone());
        drop(slider);
        assert!(!probe.captured.get());
        assert_eq!(probe.releases.get(), 3);
    }

    #[test]
    fn second_press_does_not_stack_captures() {
        let probe = Rc::new(CursorProbe::default());
        let reference = Reference::viewport(100.0);
        let mut slider = ComparisonSlider::new();
        slider.press(10.0, HitTarget::Surface, reference, probe.clone());
        slider.press(50.0, HitTarget::Surface, reference, probe.clone());
        assert_eq!(slider.position(), 50.0);
        slider.release();
        assert_eq!(probe.releases.get(), 1);
    }

    #[test]
    fn set_position_clamps() {
        let mut slider = ComparisonSlider::new();
        slider.set_position(140.0);
        assert_eq!(slider.position(), 100.0);
        slider.set_position(-3.0);
        assert_eq!(slider.position(), 0.0);
        slider.set_position(f32::NAN);
        assert_eq!(slider.position(), 0.0);
    }
}
