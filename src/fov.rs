// fov.rs: perspective distance <-> field of view

use crate::angle::Angle;
use serde::{Deserialize, Serialize};

/// Pixel size of the area the panorama is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero (or negative) area; FOV math on it is undefined.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (0.5 * self.width, 0.5 * self.height)
    }
}

/// Which quantity the FOV is derived from. Exactly one is independent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FovInput {
    Horizontal(Angle),
    Vertical(Angle),
    /// Distance read back from the rendering surface after a zoom.
    Perspective(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldOfView {
    pub horizontal: Angle,
    pub vertical: Angle,
    pub perspective: f64,
}

impl FieldOfView {
    pub fn calculate(input: FovInput, viewport: Viewport) -> Self {
        match input {
            FovInput::Horizontal(fov_h) => Self::from_horizontal(fov_h, viewport),
            FovInput::Vertical(fov_v) => Self::from_vertical(fov_v, viewport),
            FovInput::Perspective(perspective) => Self::from_perspective(perspective, viewport),
        }
    }

    /// Forward mode: the horizontal FOV is kept as given, perspective and
    /// vertical FOV follow from the viewport.
    pub fn from_horizontal(fov_h: Angle, viewport: Viewport) -> Self {
        let perspective = 0.5 * viewport.width / (fov_h.to_radians() / 2.0).tan();
        if viewport.is_degenerate() || !is_usable(perspective) {
            return Self::degenerate(perspective);
        }
        Self {
            horizontal: fov_h,
            vertical: span(viewport.height, perspective),
            perspective,
        }
    }

    pub fn from_vertical(fov_v: Angle, viewport: Viewport) -> Self {
        let perspective = 0.5 * viewport.height / (fov_v.to_radians() / 2.0).tan();
        if viewport.is_degenerate() || !is_usable(perspective) {
            return Self::degenerate(perspective);
        }
        Self {
            horizontal: span(viewport.width, perspective),
            vertical: fov_v,
            perspective,
        }
    }

    /// Reverse mode: both FOVs follow from an externally set perspective.
    pub fn from_perspective(perspective: f64, viewport: Viewport) -> Self {
        if viewport.is_degenerate() || !is_usable(perspective) {
            return Self::degenerate(perspective);
        }
        Self {
            horizontal: span(viewport.width, perspective),
            vertical: span(viewport.height, perspective),
            perspective,
        }
    }

    /// Zero-width frustum; nothing passes visibility until the next recompute.
    pub fn degenerate(perspective: f64) -> Self {
        Self {
            horizontal: Angle::ZERO,
            vertical: Angle::ZERO,
            perspective,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.horizontal.to_degrees() == 0.0 && self.vertical.to_degrees() == 0.0
    }
}

fn is_usable(perspective: f64) -> bool {
    perspective.is_finite() && perspective > 0.0
}

/// `2 * atan(0.5 * extent / perspective)`
fn span(extent: f64, perspective: f64) -> Angle {
    Angle::from_radians(2.0 * (0.5 * extent / perspective).atan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn hd() -> Viewport {
        Viewport::new(1280.0, 720.0)
    }

    #[test]
    fn forward_then_reverse_round_trips() {
        for fov in [30.0, 60.0, 90.0, 115.0, 150.0] {
            let forward = FieldOfView::from_horizontal(Angle::from_degrees(fov), hd());
            let reverse = FieldOfView::from_perspective(forward.perspective, hd());
            assert_abs_diff_eq!(
                reverse.horizontal.to_radians(),
                Angle::from_degrees(fov).to_radians(),
                epsilon = 1e-6
            );
            assert_abs_diff_eq!(
                reverse.vertical.to_radians(),
                forward.vertical.to_radians(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn ninety_degrees_puts_the_plane_at_half_width() {
        let fov = FieldOfView::from_horizontal(Angle::from_degrees(90.0), hd());
        assert_abs_diff_eq!(fov.perspective, 640.0, epsilon = 1e-9);
        assert_eq!(fov.horizontal.to_degrees(), 90.0);
        assert!(fov.vertical.to_degrees() < 90.0);
    }

    #[test]
    fn vertical_input_derives_horizontal() {
        let square = Viewport::new(500.0, 500.0);
        let fov = FieldOfView::from_vertical(Angle::from_degrees(60.0), square);
        assert_abs_diff_eq!(fov.horizontal.to_degrees(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_viewport_is_degenerate_not_a_fault() {
        let fov = FieldOfView::from_horizontal(Angle::from_degrees(115.0), Viewport::new(0.0, 720.0));
        assert!(fov.is_degenerate());
        let fov = FieldOfView::from_perspective(400.0, Viewport::default());
        assert!(fov.is_degenerate());
        assert_eq!(fov.perspective, 400.0);
    }

    #[test]
    fn unusable_perspective_is_degenerate() {
        for p in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(FieldOfView::from_perspective(p, hd()).is_degenerate());
        }
        // Half-angle past 90° has a negative tangent, so the perspective is negative.
        assert!(FieldOfView::from_horizontal(Angle::from_degrees(200.0), hd()).is_degenerate());
    }
}
