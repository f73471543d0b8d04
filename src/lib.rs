// lib.rs: cube panorama orientation and projection engine

pub mod angle;
pub mod compositor;
pub mod error;
pub mod fov;
pub mod hotspot;
pub mod input;
pub mod orientation;
pub mod panorama;
pub mod surface;
pub mod tour;
pub mod zoom;

pub use angle::{Angle, Unit};
pub use compositor::Compositor;
pub use error::TourError;
pub use fov::{FieldOfView, FovInput, Viewport};
pub use hotspot::{Frustum, Hotspot, ProjectorConfig};
pub use input::{Controls, Key, KeyAction, Pointer};
pub use orientation::{AnimationHandle, Axis, Orientation};
pub use panorama::{Options, Panorama, PanoramaBuilder, PanoramaEvent};
pub use surface::{ElementId, ElementTransform, RenderSurface, Surface};
pub use tour::{CubeFace, HotspotKind, HotspotMeta, Scene, Sides, Tour};
