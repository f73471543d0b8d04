// orientation.rs: pitch/yaw state, instant rotation and continuous spins

use crate::angle::Angle;
use crate::panorama::{Panorama, PanoramaEvent};
use crate::surface::{ElementId, ElementTransform, KeyframeRule, Repeat, RuleName, Surface};
use crate::zoom::ZoomAnimation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Pitch,
    Yaw,
}

impl Axis {
    /// The layer whose transform carries this axis.
    pub fn element(self) -> ElementId {
        match self {
            Axis::Pitch => ElementId::Stage,
            Axis::Yaw => ElementId::Cube,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Pitch => "pitch",
            Axis::Yaw => "yaw",
        })
    }
}

/// Camera attitude. Angles are stored as assigned (not normalized).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: Angle,
    pub yaw: Angle,
}

impl Orientation {
    pub fn new(pitch: Angle, yaw: Angle) -> Self {
        Self { pitch, yaw }
    }

    pub fn get(&self, axis: Axis) -> Angle {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Yaw => self.yaw,
        }
    }

    pub fn with(self, axis: Axis, angle: Angle) -> Self {
        match axis {
            Axis::Pitch => Self { pitch: angle, ..self },
            Axis::Yaw => Self { yaw: angle, ..self },
        }
    }
}

/// A keyframe rule currently playing on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationHandle {
    pub rule: RuleName,
    pub element: ElementId,
}

/// At most one live rule per axis; pitch spin and zoom share the stage and
/// are never live together.
#[derive(Debug, Default)]
pub(crate) struct Animations {
    pub pitch: Option<AnimationHandle>,
    pub yaw: Option<AnimationHandle>,
    pub zoom: Option<ZoomAnimation>,
}

impl Animations {
    pub fn slot(&self, axis: Axis) -> Option<&AnimationHandle> {
        match axis {
            Axis::Pitch => self.pitch.as_ref(),
            Axis::Yaw => self.yaw.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, axis: Axis) -> &mut Option<AnimationHandle> {
        match axis {
            Axis::Pitch => &mut self.pitch,
            Axis::Yaw => &mut self.yaw,
        }
    }
}

impl<S: Surface> Panorama<S> {
    /// Commits a new orientation and hands the visual transition to the
    /// surface. Hotspots are reprojected now for an instant rotate, or when
    /// the transition ends otherwise.
    pub fn rotate(&mut self, pitch: Angle, yaw: Angle, transition: Duration) {
        self.orientation = Orientation::new(pitch, yaw);
        let stage = ElementTransform::stage(self.fov.perspective, pitch);
        self.surface.apply(ElementId::Stage, stage, transition);
        self.surface
            .apply(ElementId::Cube, ElementTransform::cube(yaw), transition);
        if transition.is_zero() {
            self.project_hotspots();
        }
        self.emit(PanoramaEvent::Rotate {
            pitch,
            yaw,
            transition,
        });
    }

    /// Instant relative rotation, as produced by drag gestures.
    pub fn rotate_by(&mut self, delta_pitch: f64, delta_yaw: f64) {
        let Orientation { pitch, yaw } = self.orientation;
        self.rotate(
            pitch.add_degrees(delta_pitch),
            yaw.add_degrees(delta_yaw),
            Duration::ZERO,
        );
    }

    pub fn is_rotating(&self, axis: Axis) -> bool {
        self.animations.slot(axis).is_some()
    }

    /// Spins `axis` a full turn every `period`, forever, starting from the
    /// current normalized angle. A spin already running on the axis is
    /// stopped first.
    pub fn start_rotate(&mut self, axis: Axis, period: Duration, reverse: bool) {
        if self.is_rotating(axis) {
            self.stop_rotate(axis);
        }
        if axis == Axis::Pitch {
            self.finish_zoom();
        }

        let start = self.orientation.get(axis).normalized();
        let end = start.add_degrees(if reverse { -360.0 } else { 360.0 });
        let perspective = self.fov.perspective;
        let (from, to) = match axis {
            Axis::Pitch => (
                ElementTransform::stage(perspective, start),
                ElementTransform::stage(perspective, end),
            ),
            Axis::Yaw => (ElementTransform::cube(start), ElementTransform::cube(end)),
        };
        let rule = self.surface.register(KeyframeRule {
            prefix: format!("panorama-rotate-{axis}"),
            from,
            to,
        });
        let element = axis.element();
        self.surface.play(element, &rule, period, Repeat::Infinite);
        log::debug!("spinning {axis} with {rule} every {period:?}");
        *self.animations.slot_mut(axis) = Some(AnimationHandle { rule, element });

        self.emit(PanoramaEvent::StartRotate {
            axis,
            duration: period,
            reverse,
        });
    }

    /// Ends the spin on `axis`, keeping whatever angle is on screen at this
    /// instant. Safe to call when nothing spins.
    pub fn stop_rotate(&mut self, axis: Axis) {
        let Some(handle) = self.animations.slot_mut(axis).take() else {
            return;
        };
        let live = self.surface.live_transform(handle.element);
        let reached = match axis {
            Axis::Pitch => live.pitch(),
            Axis::Yaw => live.yaw(),
        };
        self.surface.stop(handle.element);

        let Orientation { pitch, yaw } = self.orientation.with(axis, reached);
        self.rotate(pitch, yaw, Duration::ZERO);
        self.emit(PanoramaEvent::StopRotate { axis });

        if !self.surface.remove(&handle.rule) {
            log::warn!("keyframes {} were already gone", handle.rule);
        }
        log::debug!("stopped {axis} at {reached}");
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.is_rotating(Axis::Yaw)
    }

    /// Starts or stops the yaw spin with the configured auto-rotate period.
    pub fn toggle_auto_rotate(&mut self) {
        if self.is_auto_rotating() {
            self.stop_rotate(Axis::Yaw);
        } else {
            let period = self.options.auto_rotate_period();
            self.start_rotate(Axis::Yaw, period, false);
        }
    }
}
