// panorama.rs: the panorama instance, its options, clock and notifications

use crate::angle::Angle;
use crate::compositor::Compositor;
use crate::fov::{FieldOfView, FovInput, Viewport};
use crate::hotspot::{Hotspot, ProjectorConfig};
use crate::orientation::{Animations, Axis, Orientation};
use crate::surface::Surface;
use crate::tour::Scene;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Horizontal FOV used when the options name no FOV input at all.
pub const DEFAULT_FOV_H: f64 = 115.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Initial orientation, degrees.
    pub pitch: f64,
    pub yaw: f64,
    pub fov_h: Option<f64>,
    pub fov_v: Option<f64>,
    pub perspective: Option<f64>,
    /// Bounds for `zoom_to`, degrees of horizontal FOV.
    pub min_fov: f64,
    pub max_fov: f64,
    pub auto_rotate: bool,
    /// Seconds per full turn.
    pub auto_rotate_duration: f64,
    pub key_rotate_duration: f64,
    pub mouse_sensitivity: f64,
    pub touch_sensitivity: f64,
    /// Degrees of FOV per wheel notch.
    pub wheel_sensitivity: f64,
    pub wheel_transition_ms: u64,
    pub navigation_transition_ms: u64,
    /// Wait after pausing a zoom before its perspective is read back.
    pub zoom_settle_ms: u64,
    pub bind_keyboard: bool,
    pub bind_mouse: bool,
    pub bind_touch: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            fov_h: None,
            fov_v: None,
            perspective: None,
            min_fov: 5.0,
            max_fov: 170.0,
            auto_rotate: false,
            auto_rotate_duration: 30.0,
            key_rotate_duration: 10.0,
            mouse_sensitivity: 1.0,
            touch_sensitivity: 2.0,
            wheel_sensitivity: 5.0,
            wheel_transition_ms: 50,
            navigation_transition_ms: 1000,
            zoom_settle_ms: 1000,
            bind_keyboard: true,
            bind_mouse: true,
            bind_touch: true,
        }
    }
}

impl Options {
    /// Perspective wins over a horizontal FOV, which wins over a vertical one.
    pub fn fov_input(&self) -> FovInput {
        match (self.perspective, self.fov_h, self.fov_v) {
            (Some(p), _, _) => FovInput::Perspective(p),
            (None, Some(h), _) => FovInput::Horizontal(Angle::from_degrees(h)),
            (None, None, Some(v)) => FovInput::Vertical(Angle::from_degrees(v)),
            (None, None, None) => FovInput::Horizontal(Angle::from_degrees(DEFAULT_FOV_H)),
        }
    }

    pub fn initial_orientation(&self) -> Orientation {
        Orientation::new(Angle::from_degrees(self.pitch), Angle::from_degrees(self.yaw))
    }

    pub fn auto_rotate_period(&self) -> Duration {
        seconds(self.auto_rotate_duration)
    }

    pub fn key_rotate_period(&self) -> Duration {
        seconds(self.key_rotate_duration)
    }

    pub fn wheel_transition(&self) -> Duration {
        Duration::from_millis(self.wheel_transition_ms)
    }

    pub fn navigation_transition(&self) -> Duration {
        Duration::from_millis(self.navigation_transition_ms)
    }

    pub fn zoom_settle(&self) -> Duration {
        Duration::from_millis(self.zoom_settle_ms)
    }
}

/// Negative and non-finite spans collapse to zero.
pub(crate) fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanoramaEvent {
    Rotate {
        pitch: Angle,
        yaw: Angle,
        transition: Duration,
    },
    StartRotate {
        axis: Axis,
        duration: Duration,
        reverse: bool,
    },
    StopRotate {
        axis: Axis,
    },
    StartZoom {
        reverse: bool,
    },
    StopZoom {
        perspective: f64,
    },
    SceneEntered {
        scene: String,
    },
    /// A hotspot was followed; the host should load `target` and call
    /// [`Panorama::enter_scene`].
    Navigate {
        target: String,
    },
}

pub type Listener = Box<dyn FnMut(&PanoramaEvent)>;
pub type Extension<S> = Box<dyn FnOnce(&mut Panorama<S>)>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Task {
    SettleZoom,
    Navigate(String),
}

#[derive(Debug)]
struct Deferred {
    due: Duration,
    task: Task,
}

pub struct PanoramaBuilder<S: Surface> {
    options: Options,
    viewport: Viewport,
    projector: ProjectorConfig,
    extensions: Vec<Extension<S>>,
}

impl<S: Surface> PanoramaBuilder<S> {
    pub fn new(options: Options, viewport: Viewport) -> Self {
        Self {
            options,
            viewport,
            projector: ProjectorConfig::default(),
            extensions: Vec::new(),
        }
    }

    pub fn projector(mut self, projector: ProjectorConfig) -> Self {
        self.projector = projector;
        self
    }

    /// Runs once during [`build`](Self::build), after the first FOV
    /// calculation and before the initial rotate.
    pub fn extension(mut self, extension: impl FnOnce(&mut Panorama<S>) + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn build(self, surface: S) -> Panorama<S> {
        let mut panorama = Panorama {
            fov_input: self.options.fov_input(),
            fov: FieldOfView::degenerate(0.0),
            orientation: self.options.initial_orientation(),
            options: self.options,
            surface,
            viewport: self.viewport,
            animations: Animations::default(),
            hotspots: Vec::new(),
            projector: self.projector,
            scene: None,
            listeners: Vec::new(),
            deferred: Vec::new(),
            now: Duration::ZERO,
        };
        panorama
            .surface
            .resize(self.viewport.width, self.viewport.height);
        panorama.calculate_fov();
        for extension in self.extensions {
            extension(&mut panorama);
        }
        let Orientation { pitch, yaw } = panorama.orientation;
        panorama.rotate(pitch, yaw, Duration::ZERO);
        if panorama.options.auto_rotate {
            panorama.toggle_auto_rotate();
        }
        panorama
    }
}

/// One panorama shown in one viewport.
pub struct Panorama<S: Surface = Compositor> {
    pub(crate) options: Options,
    pub(crate) surface: S,
    viewport: Viewport,
    pub(crate) orientation: Orientation,
    pub(crate) fov_input: FovInput,
    pub(crate) fov: FieldOfView,
    pub(crate) animations: Animations,
    pub(crate) hotspots: Vec<Hotspot>,
    projector: ProjectorConfig,
    scene: Option<String>,
    listeners: Vec<Listener>,
    deferred: Vec<Deferred>,
    now: Duration,
}

impl Panorama<Compositor> {
    pub fn new(options: Options, viewport: Viewport) -> Self {
        PanoramaBuilder::new(options, viewport).build(Compositor::new(viewport))
    }
}

impl<S: Surface> Panorama<S> {
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn fov(&self) -> FieldOfView {
        self.fov
    }

    pub fn fov_input(&self) -> FovInput {
        self.fov_input
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn scene(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&PanoramaEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn emit(&mut self, event: PanoramaEvent) {
        log::trace!("{event:?}");
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Derives perspective and both FOVs from the current independent input.
    pub fn calculate_fov(&mut self) {
        self.fov = FieldOfView::calculate(self.fov_input, self.viewport);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
        self.surface.resize(width, height);
        self.calculate_fov();
        let Orientation { pitch, yaw } = self.orientation;
        self.rotate(pitch, yaw, Duration::ZERO);
    }

    /// Moves the clock: ended transitions trigger a projection pass, then
    /// deferred tasks that came due run in schedule order.
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
        let settled = self.surface.advance(dt);
        if !settled.is_empty() {
            self.project_hotspots();
        }
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|d| d.due <= now);
        self.deferred = pending;
        due.sort_by_key(|d| d.due);
        for deferred in due {
            self.run(deferred.task);
        }
    }

    pub(crate) fn defer(&mut self, delay: Duration, task: Task) {
        self.deferred.push(Deferred {
            due: self.now + delay,
            task,
        });
    }

    pub(crate) fn cancel(&mut self, matches: impl Fn(&Task) -> bool) {
        self.deferred.retain(|d| !matches(&d.task));
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.deferred.is_empty()
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::SettleZoom => self.finish_zoom(),
            Task::Navigate(target) => self.emit(PanoramaEvent::Navigate { target }),
        }
    }

    /// Replaces every hotspot with the ones of `scene` and returns to the
    /// configured initial orientation.
    pub fn enter_scene(&mut self, id: &str, scene: &Scene) {
        self.stop_rotate(Axis::Pitch);
        self.stop_rotate(Axis::Yaw);
        self.finish_zoom();
        self.cancel(|t| matches!(t, Task::Navigate(_)));

        self.hotspots = scene
            .hotspots
            .iter()
            .map(|meta| Hotspot::new(meta, &self.projector))
            .collect();
        self.scene = Some(id.to_owned());
        log::debug!("entered scene {id} with {} hotspots", self.hotspots.len());

        let Orientation { pitch, yaw } = self.options.initial_orientation();
        self.rotate(pitch, yaw, Duration::ZERO);
        self.emit(PanoramaEvent::SceneEntered {
            scene: id.to_owned(),
        });
        if self.options.auto_rotate {
            self.toggle_auto_rotate();
        }
    }
}
