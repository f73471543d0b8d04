// hotspot.rs: frustum culling and screen polygons for navigation hotspots

use crate::angle::Angle;
use crate::fov::FieldOfView;
use crate::orientation::Orientation;
use crate::panorama::{Panorama, Task};
use crate::surface::{ElementId, Surface};
use crate::tour::{HotspotKind, HotspotMeta};
use glam::{DMat4, DVec2, DVec3};

/// Placement constants for hotspot markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectorConfig {
    /// Distance of the hotspot anchor from the cube center.
    pub radius: f64,
    /// Half the side of the square spanned by a nav hotspot's corners.
    pub corner_extent: f64,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            radius: 512.0,
            corner_extent: 18.0,
        }
    }
}

/// Corner signs in polygon order: top-left, top-right, bottom-right,
/// bottom-left. y points down.
const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

#[derive(Debug, Clone)]
pub struct Hotspot {
    target: String,
    pitch: Angle,
    yaw: Angle,
    kind: HotspotKind,
    text: Option<String>,
    /// Corner markers, relative to the cube, in polygon order.
    corners: [DMat4; 4],
    polygon: Vec<DVec2>,
}

impl Hotspot {
    pub fn new(meta: &HotspotMeta, config: &ProjectorConfig) -> Self {
        let anchor = anchor(meta.pitch, meta.yaw, config.radius);
        let e = match meta.kind {
            HotspotKind::Nav => config.corner_extent,
        };
        let corners =
            CORNERS.map(|(x, y)| anchor * DMat4::from_translation(DVec3::new(x * e, y * e, 0.0)));
        Self {
            target: meta.target.clone(),
            pitch: meta.pitch,
            yaw: meta.yaw,
            kind: meta.kind,
            text: meta.text.clone(),
            corners,
            polygon: Vec::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn pitch(&self) -> Angle {
        self.pitch
    }

    pub fn yaw(&self) -> Angle {
        self.yaw
    }

    pub fn kind(&self) -> HotspotKind {
        self.kind
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn corners(&self) -> &[DMat4; 4] {
        &self.corners
    }

    /// Screen polygon from the last projection pass; empty while culled.
    pub fn polygon(&self) -> &[DVec2] {
        &self.polygon
    }

    pub fn is_visible(&self) -> bool {
        !self.polygon.is_empty()
    }

    /// Even-odd containment test against the current polygon.
    pub fn contains(&self, point: DVec2) -> bool {
        polygon_contains(&self.polygon, point)
    }

    /// Corners as `surface` places them, or empty when outside `frustum`
    /// or any corner falls behind the camera.
    fn project<S: Surface>(&self, frustum: &Frustum, surface: &S) -> Vec<DVec2> {
        if !frustum.contains(self.pitch, self.yaw) {
            return Vec::new();
        }
        self.corners
            .iter()
            .map(|corner| surface.locate(*corner))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}

fn polygon_contains(poly: &[DVec2], point: DVec2) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Faces the camera from `radius` away, at the given spherical placement.
fn anchor(pitch: Angle, yaw: Angle, radius: f64) -> DMat4 {
    let tilt = pitch.negated();
    DMat4::from_rotation_y(yaw.negated().to_radians())
        * DMat4::from_translation(DVec3::new(0.0, radius * tilt.sin(), -radius * tilt.cos()))
        * DMat4::from_rotation_x(tilt.to_radians())
}

/// Visible angular window, in degrees shifted by +360.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub pitch: (f64, f64),
    pub yaw: (f64, f64),
}

impl Frustum {
    /// The yaw window is widened by `1 / cos(|pitch|)`; it grows without
    /// bound as the pitch nears ±90°. Past ±90° the cosine is negative, the
    /// yaw window comes out inverted and nothing is visible.
    pub fn new(orientation: &Orientation, fov: &FieldOfView) -> Self {
        let half = fov.horizontal.to_degrees() / 2.0;
        let pitch = orientation.pitch.normalized().to_degrees() + 360.0;
        let yaw = orientation.yaw.normalized().to_degrees() + 360.0;
        let widened = half / orientation.pitch.absolute().cos();
        Self {
            pitch: (pitch - half, pitch + half),
            yaw: (yaw - widened, yaw + widened),
        }
    }

    /// Inclusive on both ends. The yaw is also tried one turn either way so
    /// that windows straddling ±180° still match.
    pub fn contains(&self, pitch: Angle, yaw: Angle) -> bool {
        let p = pitch.normalized().to_degrees() + 360.0;
        let y = yaw.normalized().to_degrees() + 360.0;
        within(p, self.pitch) && [y, y - 360.0, y + 360.0].into_iter().any(|c| within(c, self.yaw))
    }
}

fn within(value: f64, (min, max): (f64, f64)) -> bool {
    value >= min && value <= max
}

impl<S: Surface> Panorama<S> {
    /// Recomputes every hotspot polygon against the current orientation.
    pub fn project_hotspots(&mut self) {
        let frustum = Frustum::new(&self.orientation, &self.fov);
        for i in 0..self.hotspots.len() {
            let polygon = self.hotspots[i].project(&frustum, &self.surface);
            self.hotspots[i].polygon = polygon;
        }
    }

    /// Topmost visible hotspot under `point`.
    pub fn hotspot_at(&self, point: DVec2) -> Option<usize> {
        self.hotspots.iter().rposition(|h| h.contains(point))
    }

    /// Window of what the surface shows at this instant, spins, zooms and
    /// transitions in flight included.
    pub fn live_frustum(&self) -> Frustum {
        let stage = self.surface.live_transform(ElementId::Stage);
        let cube = self.surface.live_transform(ElementId::Cube);
        let perspective = stage.perspective.unwrap_or(stage.translate_z);
        let fov = FieldOfView::from_perspective(perspective, self.viewport());
        Frustum::new(&Orientation::new(stage.pitch(), cube.yaw()), &fov)
    }

    /// Polygon of every hotspot as drawn this frame. Unlike
    /// [`Hotspot::polygon`], which holds until the orientation settles, this
    /// follows the view while it moves.
    pub fn live_polygons(&self) -> Vec<Vec<DVec2>> {
        let frustum = self.live_frustum();
        self.hotspots
            .iter()
            .map(|h| h.project(&frustum, &self.surface))
            .collect()
    }

    /// Topmost hotspot under `point` as drawn this frame.
    pub fn live_hotspot_at(&self, point: DVec2) -> Option<usize> {
        self.live_polygons()
            .iter()
            .rposition(|poly| polygon_contains(poly, point))
    }

    /// Turns toward hotspot `index` and, once the turn is done, emits
    /// `Navigate` for its target. Returns `false` for an unknown index.
    pub fn navigate(&mut self, index: usize) -> bool {
        let Some(hotspot) = self.hotspots.get(index) else {
            return false;
        };
        let target = hotspot.target.clone();
        let (pitch, yaw) = (hotspot.pitch, hotspot.yaw);
        // Take the short way round.
        let current = self.orientation.yaw;
        let delta = yaw.add_degrees(-current.to_degrees()).normalized();
        let yaw = current.add_degrees(delta.to_degrees());

        let transition = self.options.navigation_transition();
        self.cancel(|t| matches!(t, Task::Navigate(_)));
        self.rotate(pitch, yaw, transition);
        log::debug!("navigating to {target}");
        self.defer(transition, Task::Navigate(target));
        true
    }
}
