//! Viewport compositor
//!
//! Places the two eye frustums on screen. In picture-in-picture mode the
//! viewport's pixel rectangle must keep the frustum's aspect ratio, otherwise
//! the image is stretched. Immersive mode fills each half of the screen and
//! deliberately does not enforce it.
//!
//! Normalized rects use a top-left origin, like wgpu's `set_viewport`.

use log::warn;

use crate::eye::EyePair;

/// Smallest viewport edge handed to the renderer, in pixels
pub const MIN_VIEWPORT_PX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Small side-by-side inset anchored to a screen corner
    #[default]
    PictureInPicture,
    /// Each eye fills half the screen, for viewing inside the headset
    Immersive,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::PictureInPicture => DisplayMode::Immersive,
            DisplayMode::Immersive => DisplayMode::PictureInPicture,
        }
    }
}

/// Render-target resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width and height, never below one pixel
    pub fn dims(&self) -> (f64, f64) {
        (self.width.max(1) as f64, self.height.max(1) as f64)
    }

    pub fn aspect(&self) -> f64 {
        let (w, h) = self.dims();
        w / h
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Picture-in-picture tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorSettings {
    /// Width of one eye's inset as a fraction of canvas width
    pub pip_width_fraction: f64,
    pub max_width_fraction: f64,
    pub max_height_fraction: f64,
    pub anchor: Corner,
    /// Gap to the screen edge, as a fraction of the shorter canvas side
    pub margin_fraction: f64,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            pip_width_fraction: 0.2,
            max_width_fraction: 0.25,
            max_height_fraction: 0.4,
            anchor: Corner::BottomRight,
            margin_fraction: 0.02,
        }
    }
}

/// Normalized `(x, y, width, height)` in `[0, 1]` canvas units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Viewport in render-target pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

impl ViewportRect {
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn to_pixels(&self, canvas: CanvasSize) -> PixelRect {
        let (w, h) = canvas.dims();
        PixelRect {
            x: self.x * w,
            y: self.y * h,
            width: self.width * w,
            height: self.height * h,
        }
    }

    pub fn pixel_aspect(&self, canvas: CanvasSize) -> f64 {
        self.to_pixels(canvas).aspect()
    }
}

/// Compute both eye viewports for the current canvas and frustum aspect
pub fn layout(
    mode: DisplayMode,
    canvas: CanvasSize,
    aspect_ratio_eye: f64,
    settings: &CompositorSettings,
) -> EyePair<ViewportRect> {
    match mode {
        DisplayMode::Immersive => EyePair::new(
            ViewportRect {
                x: 0.0,
                y: 0.0,
                width: 0.5,
                height: 1.0,
            },
            ViewportRect {
                x: 0.5,
                y: 0.0,
                width: 0.5,
                height: 1.0,
            },
        ),
        DisplayMode::PictureInPicture => pip_layout(canvas, aspect_ratio_eye, settings),
    }
}

fn pip_layout(
    canvas: CanvasSize,
    aspect_ratio_eye: f64,
    settings: &CompositorSettings,
) -> EyePair<ViewportRect> {
    let (canvas_w, canvas_h) = canvas.dims();

    let aspect = if aspect_ratio_eye.is_finite() && aspect_ratio_eye > 0.0 {
        aspect_ratio_eye
    } else {
        warn!("Invalid eye aspect ratio {}, using 1.0", aspect_ratio_eye);
        1.0
    };

    let mut margin = settings.margin_fraction.max(0.0) * canvas_w.min(canvas_h);

    // Width first, then height from the frustum aspect (in pixels, so the
    // canvas shape never enters the ratio)
    let mut width = settings.pip_width_fraction * canvas_w;
    width = width.min(settings.max_width_fraction * canvas_w);
    // Both insets plus margins must fit across the canvas
    width = width.min((canvas_w - 2.0 * margin) / 2.0);
    let mut height = width / aspect;

    let max_height = (settings.max_height_fraction * canvas_h).min(canvas_h - 2.0 * margin);
    if height > max_height {
        height = max_height;
        width = height * aspect;
    }

    if !(width >= MIN_VIEWPORT_PX && height >= MIN_VIEWPORT_PX) {
        warn!(
            "Viewport degenerate ({:.2}x{:.2} px on {}x{}), clamping",
            width, height, canvas.width, canvas.height
        );
        // Margins go first, then both edges grow together until they reach
        // the minimum or the pair fills the canvas
        margin = 0.0;
        if !(width > 0.0 && height > 0.0) {
            width = aspect;
            height = 1.0;
        }
        let grow = (MIN_VIEWPORT_PX / width).max(MIN_VIEWPORT_PX / height);
        let fit = (canvas_w / (2.0 * width)).min(canvas_h / height);
        let scale = grow.min(fit);
        width *= scale;
        height *= scale;
    }

    let group_width = 2.0 * width;
    let x0 = match settings.anchor {
        Corner::TopLeft | Corner::BottomLeft => margin,
        Corner::TopRight | Corner::BottomRight => canvas_w - margin - group_width,
    };
    let y0 = match settings.anchor {
        Corner::TopLeft | Corner::TopRight => margin,
        Corner::BottomLeft | Corner::BottomRight => canvas_h - margin - height,
    };
    let x0 = x0.clamp(0.0, (canvas_w - group_width).max(0.0));
    let y0 = y0.clamp(0.0, (canvas_h - height).max(0.0));

    let left = ViewportRect {
        x: x0 / canvas_w,
        y: y0 / canvas_h,
        width: width / canvas_w,
        height: height / canvas_h,
    };
    let right = ViewportRect {
        x: left.right(),
        ..left
    };
    EyePair::new(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ASPECT: f64 = 0.889;

    #[test]
    fn test_pip_keeps_frustum_aspect() {
        let settings = CompositorSettings::default();
        for canvas in [
            CanvasSize::new(1920, 1080),
            CanvasSize::new(800, 600),
            CanvasSize::new(600, 1200),
            CanvasSize::new(3840, 400),
        ] {
            for aspect in [0.5, ASPECT, 1.25, 3.0] {
                let rects = layout(DisplayMode::PictureInPicture, canvas, aspect, &settings);
                assert_relative_eq!(
                    rects.left.pixel_aspect(canvas),
                    aspect,
                    max_relative = 1e-9
                );
                assert_relative_eq!(
                    rects.right.pixel_aspect(canvas),
                    aspect,
                    max_relative = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_pip_is_side_by_side() {
        let canvas = CanvasSize::new(1920, 1080);
        let rects = layout(
            DisplayMode::PictureInPicture,
            canvas,
            ASPECT,
            &CompositorSettings::default(),
        );
        assert_eq!(rects.left.right(), rects.right.x);
        assert_eq!(rects.left.y, rects.right.y);
        assert_eq!(rects.left.height, rects.right.height);
        assert!(rects.right.right() <= 1.0);
        assert!(rects.left.bottom() <= 1.0);
    }

    #[test]
    fn test_pip_respects_clamps() {
        let settings = CompositorSettings {
            pip_width_fraction: 0.45,
            max_width_fraction: 0.3,
            max_height_fraction: 0.2,
            ..Default::default()
        };
        let canvas = CanvasSize::new(1000, 1000);
        let rects = layout(DisplayMode::PictureInPicture, canvas, 0.5, &settings);
        // Height clamp wins and width is re-derived
        assert_relative_eq!(rects.left.height, 0.2, max_relative = 1e-12);
        assert_relative_eq!(rects.left.width, 0.1, max_relative = 1e-12);
    }

    #[test]
    fn test_anchor_corners() {
        let canvas = CanvasSize::new(1920, 1080);
        let top_left = CompositorSettings {
            anchor: Corner::TopLeft,
            ..Default::default()
        };
        let rects = layout(DisplayMode::PictureInPicture, canvas, ASPECT, &top_left);
        let margin = 0.02 * 1080.0;
        assert_relative_eq!(rects.left.x * 1920.0, margin, max_relative = 1e-9);
        assert_relative_eq!(rects.left.y * 1080.0, margin, max_relative = 1e-9);

        let bottom_right = CompositorSettings::default();
        let rects = layout(DisplayMode::PictureInPicture, canvas, ASPECT, &bottom_right);
        assert_relative_eq!(
            (1.0 - rects.right.right()) * 1920.0,
            margin,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            (1.0 - rects.left.bottom()) * 1080.0,
            margin,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_immersive_fills_halves() {
        let rects = layout(
            DisplayMode::Immersive,
            CanvasSize::new(2560, 1440),
            ASPECT,
            &CompositorSettings::default(),
        );
        assert_eq!(rects.left.x, 0.0);
        assert_eq!(rects.left.width, 0.5);
        assert_eq!(rects.right.x, 0.5);
        assert_eq!(rects.left.right(), rects.right.x);
        assert_eq!(rects.left.height, 1.0);
        assert_eq!(rects.right.right(), 1.0);
    }

    #[test]
    fn test_resize_scales_width_and_height_together() {
        let settings = CompositorSettings::default();
        let big = CanvasSize::new(1920, 1080);
        let small = CanvasSize::new(800, 600);

        let before = layout(DisplayMode::PictureInPicture, big, ASPECT, &settings).left;
        let after = layout(DisplayMode::PictureInPicture, small, ASPECT, &settings).left;

        let px_before = before.to_pixels(big);
        let px_after = after.to_pixels(small);
        assert_relative_eq!(px_before.aspect(), ASPECT, max_relative = 1e-9);
        assert_relative_eq!(px_after.aspect(), ASPECT, max_relative = 1e-9);
        assert_relative_eq!(
            px_after.width / px_before.width,
            px_after.height / px_before.height,
            max_relative = 1e-9
        );
    }

    fn assert_inside_canvas(rect: &ViewportRect) {
        const EPS: f64 = 1e-12;
        assert!(rect.x >= 0.0 && rect.y >= 0.0, "{rect:?}");
        assert!(rect.right() <= 1.0 + EPS, "{rect:?}");
        assert!(rect.bottom() <= 1.0 + EPS, "{rect:?}");
    }

    #[test]
    fn test_degenerate_canvas_stays_inside() {
        for anchor in [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomLeft,
            Corner::BottomRight,
        ] {
            let settings = CompositorSettings {
                anchor,
                ..Default::default()
            };
            for canvas in [
                CanvasSize::new(0, 0),
                CanvasSize::new(1, 1),
                CanvasSize::new(3, 1),
                CanvasSize::new(1, 40),
            ] {
                let rects = layout(DisplayMode::PictureInPicture, canvas, ASPECT, &settings);
                assert_inside_canvas(&rects.left);
                assert_inside_canvas(&rects.right);
                assert_relative_eq!(rects.left.right(), rects.right.x, max_relative = 1e-12);

                let px = rects.left.to_pixels(canvas);
                assert!(px.width > 0.0 && px.height > 0.0);
                assert_relative_eq!(px.aspect(), ASPECT, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_small_canvas_reaches_minimum_size() {
        let canvas = CanvasSize::new(4, 4);
        let rects = layout(
            DisplayMode::PictureInPicture,
            canvas,
            ASPECT,
            &CompositorSettings::default(),
        );
        let px = rects.left.to_pixels(canvas);
        assert!(px.width >= MIN_VIEWPORT_PX - 1e-9);
        assert!(px.height >= MIN_VIEWPORT_PX - 1e-9);
        assert_relative_eq!(px.aspect(), ASPECT, max_relative = 1e-9);
        assert_inside_canvas(&rects.left);
        assert_inside_canvas(&rects.right);
    }
}
