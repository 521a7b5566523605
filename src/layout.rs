//! Screen geometry for the comparison view, in logical pixels. Everything
//! here is a pure function of the session state and the window size.

use crate::comparison::{HitTarget, Reference};

pub const DIVIDER_WIDTH: f32 = 3.0;
pub const GRIP_WIDTH: f32 = 5.0;
pub const GRIP_HEIGHT: f32 = 120.0;

pub const FRAME_WIDTH_RATIO: f32 = 0.85;
pub const FRAME_MAX_WIDTH: f32 = 896.0;
pub const FRAME_MAX_HEIGHT_RATIO: f32 = 0.8;

pub const SETUP_BACKGROUND_OPACITY: f32 = 0.3;
pub const COMPARING_BACKGROUND_OPACITY: f32 = 1.0;
pub const DARK_OVERLAY_OPACITY: f32 = 0.5;
pub const ENTRANCE_SCALE: f32 = 0.9;

/// Which rectangle the divider position is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    /// The whole window; a press anywhere moves the divider.
    #[default]
    Viewport,
    /// Only the framed comparison area.
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f32,
    pub h: f32,
}

impl Size {
    pub fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }

    pub fn is_empty(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.w, size.h)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn min(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    pub fn max(&self) -> [f32; 2] {
        [self.right(), self.bottom()]
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn contains(&self, point: [f32; 2]) -> bool {
        point[0] >= self.x && point[0] <= self.right() && point[1] >= self.y && point[1] <= self.bottom()
    }

    pub fn reference(&self) -> Reference {
        Reference::new(self.x, self.w)
    }

    /// Same center, both sides multiplied by `factor`.
    pub fn scaled_about_center(&self, factor: f32) -> Rect {
        let w = self.w * factor;
        let h = self.h * factor;
        Rect::new(self.x + (self.w - w) / 2.0, self.y + (self.h - h) / 2.0, w, h)
    }
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Largest rectangle with the image's aspect ratio that fits in `frame`,
/// centered. One scale for both axes, nothing cropped.
pub fn fit_within(frame: Rect, image: Size) -> Rect {
    if image.is_empty() || frame.w <= 0.0 || frame.h <= 0.0 {
        return Rect::new(frame.x, frame.y, 0.0, 0.0);
    }
    let scale_x = frame.w / image.w;
    let scale_y = frame.h / image.h;
    let scale = scale_x.min(scale_y);

    let scaled_width = image.w * scale;
    let scaled_height = image.h * scale;
    let x_offset = (frame.w - scaled_width) / 2.0;
    let y_offset = (frame.h - scaled_height) / 2.0;
    Rect::new(frame.x + x_offset, frame.y + y_offset, scaled_width, scaled_height)
}

/// UV window that crops `image` to fill `target` without distortion.
pub fn cover_uv(target: Size, image: Size) -> ([f32; 2], [f32; 2]) {
    if image.is_empty() || target.is_empty() {
        return ([0.0, 0.0], [1.0, 1.0]);
    }
    let target_aspect = target.w / target.h;
    let image_aspect = image.w / image.h;
    if image_aspect > target_aspect {
        let visible = target_aspect / image_aspect;
        let u0 = (1.0 - visible) / 2.0;
        ([u0, 0.0], [u0 + visible, 1.0])
    } else {
        let visible = image_aspect / target_aspect;
        let v0 = (1.0 - visible) / 2.0;
        ([0.0, v0], [1.0, v0 + visible])
    }
}

/// Centered frame holding the two screenshots: 85% of the window width up to
/// 896 px, as tall as the dark image's aspect asks, at most 80% of the height.
pub fn comparison_frame(viewport: Size, image: Size) -> Rect {
    let w = (viewport.w * FRAME_WIDTH_RATIO).min(FRAME_MAX_WIDTH).max(0.0);
    let natural_h = if image.is_empty() {
        w * 9.0 / 16.0
    } else {
        w * image.h / image.w
    };
    let h = natural_h.min(viewport.h * FRAME_MAX_HEIGHT_RATIO).max(0.0);
    Rect::new((viewport.w - w) / 2.0, (viewport.h - h) / 2.0, w, h)
}

/// A drawable part of an image: where it goes and which UV window it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub rect: Rect,
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

/// Splits a fitted image at `seam_x` into the part left of the seam and the
/// part at or right of it.
pub fn split_layer(fit: Rect, seam_x: f32) -> (Option<Layer>, Option<Layer>) {
    if fit.w <= 0.0 || fit.h <= 0.0 {
        return (None, None);
    }
    let cut = seam_x.clamp(fit.x, fit.right());
    let t = (cut - fit.x) / fit.w;
    let left = (cut > fit.x).then(|| Layer {
        rect: Rect::new(fit.x, fit.y, cut - fit.x, fit.h),
        uv_min: [0.0, 0.0],
        uv_max: [t, 1.0],
    });
    let right = (cut < fit.right()).then(|| Layer {
        rect: Rect::new(cut, fit.y, fit.right() - cut, fit.h),
        uv_min: [t, 0.0],
        uv_max: [1.0, 1.0],
    });
    (left, right)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divider {
    pub seam_x: f32,
    pub line: Rect,
    pub grip: Rect,
}

impl Divider {
    pub fn new(span: Rect, position: f32) -> Self {
        let seam_x = span.reference().x_at(position);
        let line = Rect::new(seam_x - DIVIDER_WIDTH / 2.0, span.y, DIVIDER_WIDTH, span.h);
        let grip = Rect::new(
            seam_x - GRIP_WIDTH / 2.0,
            span.center_y() - GRIP_HEIGHT / 2.0,
            GRIP_WIDTH,
            GRIP_HEIGHT,
        );
        Self { seam_x, line, grip }
    }

    pub fn hit(&self, point: [f32; 2]) -> HitTarget {
        if self.line.contains(point) || self.grip.contains(point) {
            HitTarget::Handle
        } else {
            HitTarget::Surface
        }
    }
}

/// Everything the comparison screen draws for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonScene {
    pub mode: ReferenceMode,
    pub span: Rect,
    pub frame: Rect,
    pub dark: Option<Layer>,
    pub light: Option<Layer>,
    pub overlay: Option<Rect>,
    pub divider: Divider,
}

impl ComparisonScene {
    /// Both screenshots are fitted into the same frame the same way, and
    /// both are cut at one seam, so equal-sized images meet exactly.
    pub fn compute(
        viewport: Size,
        mode: ReferenceMode,
        dark: Size,
        light: Size,
        position: f32,
    ) -> Self {
        Self::compute_scaled(viewport, mode, dark, light, position, 1.0)
    }

    /// Like `compute`, with the screenshots drawn in a frame shrunk by
    /// `image_scale` about its center. The divider and the input reference
    /// keep the full-size geometry; the images are still cut at its seam.
    pub fn compute_scaled(
        viewport: Size,
        mode: ReferenceMode,
        dark: Size,
        light: Size,
        position: f32,
        image_scale: f32,
    ) -> Self {
        let frame = comparison_frame(viewport, dark);
        let span = reference_span(mode, viewport, frame);
        let divider = Divider::new(span, position);
        let seam_x = divider.seam_x;

        let image_frame = frame.scaled_about_center(image_scale.clamp(0.0, 1.0));
        let (dark, _) = split_layer(fit_within(image_frame, dark), seam_x);
        let (_, light) = split_layer(fit_within(image_frame, light), seam_x);

        let overlay_w = seam_x.clamp(0.0, viewport.w);
        let overlay = (overlay_w > 0.0).then(|| Rect::new(0.0, 0.0, overlay_w, viewport.h));

        Self {
            mode,
            span,
            frame,
            dark,
            light,
            overlay,
            divider,
        }
    }
}

impl ComparisonScene {
    /// Whether a press at `point` belongs to the slider. In container mode
    /// only presses inside the frame do.
    pub fn accepts_press(&self, point: [f32; 2]) -> bool {
        match self.mode {
            ReferenceMode::Viewport => true,
            ReferenceMode::Container => self.frame.contains(point),
        }
    }
}

/// Rectangle whose width the divider position is a percentage of.
pub fn reference_span(mode: ReferenceMode, viewport: Size, frame: Rect) -> Rect {
    match mode {
        ReferenceMode::Viewport => Rect::from_size(viewport),
        ReferenceMode::Container => frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_within_letterboxes_wide_image() {
        let fit = fit_within(Rect::new(0.0, 0.0, 800.0, 800.0), Size::new(400.0, 200.0));
        assert_eq!(fit, Rect::new(0.0, 200.0, 800.0, 400.0));
    }

    #[test]
    fn fit_within_pillarboxes_tall_image() {
        let fit = fit_within(Rect::new(100.0, 0.0, 400.0, 200.0), Size::new(100.0, 200.0));
        assert_eq!(fit, Rect::new(250.0, 0.0, 100.0, 200.0));
    }

    #[test]
    fn cover_crops_the_long_axis() {
        let (min, max) = cover_uv(Size::new(100.0, 100.0), Size::new(200.0, 100.0));
        assert_eq!(min, [0.25, 0.0]);
        assert_eq!(max, [0.75, 1.0]);
        let (min, max) = cover_uv(Size::new(200.0, 100.0), Size::new(100.0, 100.0));
        assert_eq!(min, [0.0, 0.25]);
        assert_eq!(max, [1.0, 0.75]);
    }

    #[test]
    fn frame_is_capped_in_both_directions() {
        let frame = comparison_frame(Size::new(2000.0, 1000.0), Size::new(1600.0, 900.0));
        assert_eq!(frame.w, FRAME_MAX_WIDTH);
        assert_eq!(frame.h, 504.0);
        assert_eq!(frame.x, (2000.0 - 896.0) / 2.0);

        let frame = comparison_frame(Size::new(1000.0, 500.0), Size::new(100.0, 400.0));
        assert_eq!(frame.w, 850.0);
        assert_eq!(frame.h, 400.0);
    }

    #[test]
    fn split_layer_partitions_at_seam() {
        let fit = Rect::new(100.0, 0.0, 200.0, 100.0);
        let (left, right) = split_layer(fit, 150.0);
        let left = left.unwrap();
        let right = right.unwrap();
        assert_eq!(left.rect, Rect::new(100.0, 0.0, 50.0, 100.0));
        assert_eq!(left.uv_max, [0.25, 1.0]);
        assert_eq!(right.rect, Rect::new(150.0, 0.0, 150.0, 100.0));
        assert_eq!(right.uv_min, [0.25, 0.0]);

        assert_eq!(split_layer(fit, 0.0).0, None);
        assert!(split_layer(fit, 0.0).1.is_some());
        assert!(split_layer(fit, 900.0).0.is_some());
        assert_eq!(split_layer(fit, 900.0).1, None);
    }

    #[test]
    fn scene_layers_meet_at_divider() {
        let viewport = Size::new(1000.0, 800.0);
        let image = Size::new(1600.0, 1000.0);
        let scene = ComparisonScene::compute(viewport, ReferenceMode::Viewport, image, image, 50.0);
        let dark = scene.dark.unwrap();
        let light = scene.light.unwrap();
        assert_eq!(scene.divider.seam_x, 500.0);
        assert_eq!(dark.rect.right(), 500.0);
        assert_eq!(light.rect.x, 500.0);
        assert_eq!(dark.uv_max[0], light.uv_min[0]);
        assert_eq!(dark.rect.y, light.rect.y);
        assert_eq!(dark.rect.h, light.rect.h);
        assert_eq!(scene.overlay, Some(Rect::new(0.0, 0.0, 500.0, 800.0)));
    }

    #[test]
    fn container_mode_measures_against_frame() {
        let viewport = Size::new(1000.0, 800.0);
        let image = Size::new(800.0, 400.0);
        let scene = ComparisonScene::compute(viewport, ReferenceMode::Container, image, image, 0.0);
        assert_eq!(scene.span, scene.frame);
        assert_eq!(scene.divider.seam_x, scene.frame.x);
        assert!(scene.dark.is_none());
        assert!(scene.light.is_some());
    }

    #[test]
    fn container_mode_only_accepts_presses_in_frame() {
        let viewport = Size::new(1000.0, 800.0);
        let image = Size::new(800.0, 400.0);
        let scene = ComparisonScene::compute(viewport, ReferenceMode::Container, image, image, 50.0);
        assert!(!scene.accepts_press([10.0, 400.0]));
        assert!(!scene.accepts_press([500.0, 10.0]));
        assert!(scene.accepts_press([500.0, 400.0]));

        let scene = ComparisonScene::compute(viewport, ReferenceMode::Viewport, image, image, 50.0);
        assert!(scene.accepts_press([10.0, 10.0]));
    }

    #[test]
    fn entrance_scale_shrinks_images_but_keeps_seam() {
        let viewport = Size::new(1000.0, 800.0);
        let image = Size::new(1600.0, 1000.0);
        let full = ComparisonScene::compute(viewport, ReferenceMode::Viewport, image, image, 50.0);
        let small = ComparisonScene::compute_scaled(
            viewport,
            ReferenceMode::Viewport,
            image,
            image,
            50.0,
            ENTRANCE_SCALE,
        );
        assert_eq!(small.frame, full.frame);
        assert_eq!(small.divider, full.divider);

        let dark = small.dark.unwrap();
        let light = small.light.unwrap();
        assert!((dark.rect.right() - 500.0).abs() < 1e-3);
        assert_eq!(light.rect.x, 500.0);
        assert!(dark.rect.x > full.dark.unwrap().rect.x);
        assert!(light.rect.h < full.light.unwrap().rect.h);
    }

    #[test]
    fn scaled_rect_keeps_center() {
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0).scaled_about_center(0.5);
        assert_eq!(rect, Rect::new(150.0, 125.0, 100.0, 50.0));
    }

    #[test]
    fn divider_hit_test() {
        let divider = Divider::new(Rect::new(0.0, 0.0, 1000.0, 600.0), 50.0);
        assert_eq!(divider.hit([500.0, 10.0]), HitTarget::Handle);
        assert_eq!(divider.hit([502.0, 300.0]), HitTarget::Handle);
        assert_eq!(divider.hit([502.0, 10.0]), HitTarget::Surface);
        assert_eq!(divider.hit([200.0, 300.0]), HitTarget::Surface);
    }

    #[test]
    fn lerp_clamps_progress() {
        assert_eq!(lerp(0.3, 1.0, 0.0), 0.3);
        assert_eq!(lerp(0.0, 1.0, 0.5), 0.5);
        assert_eq!(lerp(0.3, 1.0, 7.0), 1.0);
    }
}
