// surface.rs: contracts with the rendering surface and animation registry

use crate::angle::Angle;
use glam::{DMat4, DVec2};
use std::fmt;
use std::time::Duration;

/// The two transformed layers of the panorama. The stage carries perspective
/// and pitch, the cube nested inside it carries yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Stage,
    Cube,
}

/// A transform description in the order it is applied:
/// `perspective(p) translateZ(z) rotateX(x) rotateY(y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransform {
    pub perspective: Option<f64>,
    pub translate_z: f64,
    /// Degrees.
    pub rotate_x: f64,
    /// Degrees.
    pub rotate_y: f64,
}

impl ElementTransform {
    pub fn stage(perspective: f64, pitch: Angle) -> Self {
        Self {
            perspective: Some(perspective),
            translate_z: perspective,
            rotate_x: pitch.to_degrees(),
            rotate_y: 0.0,
        }
    }

    pub fn cube(yaw: Angle) -> Self {
        Self {
            perspective: None,
            translate_z: 0.0,
            rotate_x: 0.0,
            rotate_y: yaw.to_degrees(),
        }
    }

    pub fn pitch(&self) -> Angle {
        Angle::from_degrees(self.rotate_x)
    }

    pub fn yaw(&self) -> Angle {
        Angle::from_degrees(self.rotate_y)
    }

    /// Componentwise linear interpolation, `t` in `[0, 1]`.
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self {
            perspective: match (self.perspective, to.perspective) {
                (Some(a), Some(b)) => Some(mix(a, b)),
                (_, b) => b,
            },
            translate_z: mix(self.translate_z, to.translate_z),
            rotate_x: mix(self.rotate_x, to.rotate_x),
            rotate_y: mix(self.rotate_y, to.rotate_y),
        }
    }

    /// Rotation part only; perspective and translation are handled by the
    /// camera model when projecting.
    pub fn rotation(&self) -> DMat4 {
        DMat4::from_rotation_x(self.rotate_x.to_radians())
            * DMat4::from_rotation_y(self.rotate_y.to_radians())
    }
}

impl fmt::Display for ElementTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = self.perspective {
            write!(f, "perspective({p}px) translateZ({}px) ", self.translate_z)?;
        }
        write!(f, "rotateX({}deg) rotateY({}deg)", self.rotate_x, self.rotate_y)
    }
}

/// Unique name of a registered keyframe rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleName(pub String);

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-waypoint keyframe rule. `prefix` seeds the generated name.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeRule {
    pub prefix: String,
    pub from: ElementTransform,
    pub to: ElementTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Runs once and holds the last waypoint.
    Once,
    Infinite,
}

/// Transforms, linear transitions and live read-back.
pub trait RenderSurface {
    fn resize(&mut self, width: f64, height: f64);

    /// Sets the resting transform of `element`, interpolating linearly from
    /// the current live value over `transition` (instant when zero).
    fn apply(&mut self, element: ElementId, transform: ElementTransform, transition: Duration);

    /// What is on screen right now, including any running animation.
    fn live_transform(&self, element: ElementId) -> ElementTransform;

    /// Screen position of a marker attached to the cube at `local`, under the
    /// live transforms. `None` when the marker is behind the camera.
    fn locate(&self, local: DMat4) -> Option<DVec2>;

    /// Moves the clock. Returns the elements whose transitions ended.
    fn advance(&mut self, dt: Duration) -> Vec<ElementId>;
}

/// Named keyframe rules and their playback on elements.
pub trait AnimationRegistry {
    fn register(&mut self, rule: KeyframeRule) -> RuleName;

    /// `false` if no such rule was registered.
    fn remove(&mut self, name: &RuleName) -> bool;

    fn play(&mut self, element: ElementId, rule: &RuleName, period: Duration, repeat: Repeat);

    /// Freezes the running animation on its current frame.
    fn pause(&mut self, element: ElementId);

    /// Drops the animation; the element falls back to its resting transform.
    fn stop(&mut self, element: ElementId);
}

pub trait Surface: RenderSurface + AnimationRegistry {}

impl<T: RenderSurface + AnimationRegistry> Surface for T {}
