// zoom.rs: FOV changes, continuous zoom and its delayed read-back

use crate::angle::Angle;
use crate::fov::FovInput;
use crate::orientation::{AnimationHandle, Axis, Orientation};
use crate::panorama::{seconds, Panorama, PanoramaEvent, Task};
use crate::surface::{ElementId, ElementTransform, KeyframeRule, Repeat, Surface};
use std::time::Duration;

/// Perspective a zoom-in heads for.
pub const ZOOM_IN_PERSPECTIVE: f64 = 10_000.0;
/// Perspective a zoom-out heads for.
pub const ZOOM_OUT_PERSPECTIVE: f64 = 1.0;
/// Pixels of perspective per second of continuous zoom.
pub const ZOOM_SPEED: f64 = 200.0;

#[derive(Debug)]
pub(crate) struct ZoomAnimation {
    pub handle: AnimationHandle,
    /// Paused, waiting for the settle grace to pass.
    pub settling: bool,
}

impl<S: Surface> Panorama<S> {
    /// Sets a new horizontal FOV (clamped to the configured bounds) and
    /// transitions to the perspective it implies.
    pub fn zoom_to(&mut self, fov_h: Angle, transition: Duration) {
        let clamped = fov_h
            .to_degrees()
            .clamp(self.options.min_fov, self.options.max_fov);
        let fov_h = if clamped == fov_h.to_degrees() {
            fov_h
        } else {
            Angle::from_degrees(clamped)
        };
        self.fov_input = FovInput::Horizontal(fov_h);
        self.calculate_fov();
        let Orientation { pitch, yaw } = self.orientation;
        self.rotate(pitch, yaw, transition);
    }

    pub fn is_zooming(&self) -> bool {
        self.animations.zoom.is_some()
    }

    /// Starts moving the perspective toward [`ZOOM_IN_PERSPECTIVE`], or
    /// [`ZOOM_OUT_PERSPECTIVE`] when `reverse`, at [`ZOOM_SPEED`].
    pub fn start_zoom(&mut self, reverse: bool) {
        self.finish_zoom();
        self.stop_rotate(Axis::Pitch);

        let from = self.fov.perspective;
        let to = if reverse {
            ZOOM_OUT_PERSPECTIVE
        } else {
            ZOOM_IN_PERSPECTIVE
        };
        let period = seconds((from - to).abs() / ZOOM_SPEED);
        let pitch = self.orientation.pitch;
        let rule = self.surface.register(KeyframeRule {
            prefix: "panorama-zoom".into(),
            from: ElementTransform::stage(from, pitch),
            to: ElementTransform::stage(to, pitch),
        });
        self.surface
            .play(ElementId::Stage, &rule, period, Repeat::Once);
        log::debug!("zooming with {rule} over {period:?}");
        self.animations.zoom = Some(ZoomAnimation {
            handle: AnimationHandle {
                rule,
                element: ElementId::Stage,
            },
            settling: false,
        });

        self.emit(PanoramaEvent::StartZoom { reverse });
    }

    /// Freezes the zoom now and reads the perspective back once the grace
    /// interval has passed. No-op without a running zoom.
    pub fn stop_zoom(&mut self) {
        let grace = self.options.zoom_settle();
        let Some(zoom) = self.animations.zoom.as_mut() else {
            return;
        };
        if zoom.settling {
            return;
        }
        zoom.settling = true;
        self.surface.pause(ElementId::Stage);
        self.defer(grace, Task::SettleZoom);
    }

    /// Ends a zoom at once, skipping any remaining grace: samples the live
    /// perspective, makes it the independent FOV input and discards the rule.
    pub fn finish_zoom(&mut self) {
        self.cancel(|t| *t == Task::SettleZoom);
        let Some(zoom) = self.animations.zoom.take() else {
            return;
        };
        let live = self.surface.live_transform(ElementId::Stage);
        let sampled = live.perspective.unwrap_or(live.translate_z);
        self.surface.stop(ElementId::Stage);

        if sampled.is_finite() && sampled > 0.0 {
            self.fov_input = FovInput::Perspective(sampled);
        } else {
            log::warn!("ignoring unusable perspective {sampled} read back after zoom");
        }
        self.calculate_fov();
        let Orientation { pitch, yaw } = self.orientation;
        self.rotate(pitch, yaw, Duration::ZERO);
        self.emit(PanoramaEvent::StopZoom {
            perspective: self.fov.perspective,
        });
        self.surface.remove(&zoom.handle.rule);
    }
}
