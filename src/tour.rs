// tour.rs: tour files, scenes and their cube faces

use crate::angle::Angle;
use crate::error::TourError;
use crate::panorama::Options;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A set of scenes linked by hotspots, sharing one option set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tour {
    #[serde(default)]
    pub options: Options,
    pub scenes: BTreeMap<String, Scene>,
    /// Directory face paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub default: bool,
    pub sides: Sides,
    #[serde(default)]
    pub hotspots: Vec<HotspotMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sides {
    pub front: PathBuf,
    pub right: PathBuf,
    pub back: PathBuf,
    pub left: PathBuf,
    pub up: PathBuf,
    pub down: PathBuf,
}

impl Sides {
    pub fn get(&self, face: CubeFace) -> &Path {
        match face {
            CubeFace::Front => &self.front,
            CubeFace::Right => &self.right,
            CubeFace::Back => &self.back,
            CubeFace::Left => &self.left,
            CubeFace::Up => &self.up,
            CubeFace::Down => &self.down,
        }
    }

    /// Every face with its image path, in [`CubeFace::ALL`] order.
    pub fn faces(&self) -> impl Iterator<Item = (CubeFace, &Path)> + '_ {
        CubeFace::ALL.into_iter().map(move |face| (face, self.get(face)))
    }
}

/// Cube faces; the order is also the texture layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    Front,
    Right,
    Back,
    Left,
    Up,
    Down,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Right,
        CubeFace::Back,
        CubeFace::Left,
        CubeFace::Up,
        CubeFace::Down,
    ];
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CubeFace::Front => "front",
            CubeFace::Right => "right",
            CubeFace::Back => "back",
            CubeFace::Left => "left",
            CubeFace::Up => "up",
            CubeFace::Down => "down",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotKind {
    #[default]
    Nav,
}

/// Hotspot as written in the tour file. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotMeta {
    pub target: String,
    pub pitch: Angle,
    pub yaw: Angle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: HotspotKind,
}

impl Tour {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TourError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TourError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut tour = Self::from_json(&text)?;
        tour.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        log::info!("loaded tour {} with {} scenes", path.display(), tour.scenes.len());
        Ok(tour)
    }

    pub fn from_json(text: &str) -> Result<Self, TourError> {
        let tour: Self = serde_json::from_str(text)?;
        tour.validate()?;
        Ok(tour)
    }

    /// Rejects empty tours and hotspots leading nowhere.
    pub fn validate(&self) -> Result<(), TourError> {
        if self.scenes.is_empty() {
            return Err(TourError::Empty);
        }
        for (id, scene) in &self.scenes {
            if let Some(hotspot) = scene
                .hotspots
                .iter()
                .find(|h| !self.scenes.contains_key(&h.target))
            {
                return Err(TourError::UnknownTarget {
                    scene: id.clone(),
                    target: hotspot.target.clone(),
                });
            }
        }
        Ok(())
    }

    /// The scene flagged `default`, else the first by id.
    pub fn default_scene(&self) -> Option<(&str, &Scene)> {
        self.scenes
            .iter()
            .find(|(_, s)| s.default)
            .or_else(|| self.scenes.iter().next())
            .map(|(id, s)| (id.as_str(), s))
    }

    pub fn scene(&self, id: &str) -> Result<&Scene, TourError> {
        self.scenes
            .get(id)
            .ok_or_else(|| TourError::UnknownScene(id.to_owned()))
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Decodes the six faces of `scene`. All must share the front face's size.
    pub fn load_faces(&self, scene: &Scene) -> Result<Vec<RgbaImage>, TourError> {
        let mut faces: Vec<RgbaImage> = Vec::with_capacity(CubeFace::ALL.len());
        for (face, path) in scene.sides.faces() {
            let path = self.resolve(path);
            let img = image::open(&path)
                .map_err(|source| TourError::Image {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();
            if let Some(front) = faces.first() {
                if front.dimensions() != img.dimensions() {
                    return Err(TourError::FaceSize {
                        face,
                        expected: front.dimensions(),
                        found: img.dimensions(),
                    });
                }
            }
            log::debug!("decoded {face} face {}", path.display());
            faces.push(img);
        }
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const TOUR: &str = r#"{
        "options": { "fov_h": 90, "auto_rotate": true },
        "scenes": {
            "hall": {
                "sides": { "front": "hall/f.png", "right": "hall/r.png", "back": "hall/b.png",
                           "left": "hall/l.png", "up": "hall/u.png", "down": "hall/d.png" },
                "hotspots": [ { "target": "kitchen", "pitch": -5, "yaw": 40, "text": "Kitchen" } ]
            },
            "kitchen": {
                "default": true,
                "sides": { "front": "k/f.png", "right": "k/r.png", "back": "k/b.png",
                           "left": "k/l.png", "up": "k/u.png", "down": "k/d.png" }
            }
        }
    }"#;

    #[test]
    fn parses_options_scenes_and_hotspots() {
        let tour = Tour::from_json(TOUR).unwrap();
        assert_eq!(tour.options.fov_h, Some(90.0));
        assert!(tour.options.auto_rotate);
        assert_eq!(tour.options.max_fov, 170.0);

        let hall = tour.scene("hall").unwrap();
        let hotspot = &hall.hotspots[0];
        assert_eq!(hotspot.target, "kitchen");
        assert_eq!(hotspot.yaw, Angle::from_degrees(40.0));
        assert_eq!(hotspot.kind, HotspotKind::Nav);
        assert_eq!(hotspot.text.as_deref(), Some("Kitchen"));
        assert_eq!(hall.sides.get(CubeFace::Up), Path::new("hall/u.png"));
    }

    #[test]
    fn flagged_scene_is_the_default() {
        let tour = Tour::from_json(TOUR).unwrap();
        assert_eq!(tour.default_scene().map(|(id, _)| id), Some("kitchen"));
    }

    #[test]
    fn first_scene_is_the_fallback_default() {
        let tour = Tour::from_json(&TOUR.replace("\"default\": true,", "")).unwrap();
        assert_eq!(tour.default_scene().map(|(id, _)| id), Some("hall"));
    }

    #[test]
    fn rejects_dangling_targets() {
        let err = Tour::from_json(&TOUR.replace("\"target\": \"kitchen\"", "\"target\": \"attic\""))
            .unwrap_err();
        assert!(matches!(err, TourError::UnknownTarget { ref target, .. } if target == "attic"));
    }

    #[test]
    fn rejects_empty_and_malformed_tours() {
        assert!(matches!(Tour::from_json(r#"{ "scenes": {} }"#), Err(TourError::Empty)));
        assert!(matches!(Tour::from_json("{"), Err(TourError::Parse(_))));
        assert!(matches!(
            Tour::from_json(TOUR).unwrap().scene("attic"),
            Err(TourError::UnknownScene(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Tour::load("/definitely/not/here/tour.json").unwrap_err();
        assert!(matches!(err, TourError::Io { .. }));
        assert!(err.to_string().contains("tour.json"));
    }

    #[test]
    fn relative_sides_resolve_against_the_tour() {
        let mut tour = Tour::from_json(TOUR).unwrap();
        tour.base_dir = PathBuf::from("/srv/tours");
        assert_eq!(tour.resolve(Path::new("a.png")), PathBuf::from("/srv/tours/a.png"));
        assert_eq!(tour.resolve(Path::new("/abs.png")), PathBuf::from("/abs.png"));
    }

    fn write_faces(dir: &Path, odd: Option<CubeFace>) -> Scene {
        std::fs::create_dir_all(dir).unwrap();
        let mut sides = Sides::default();
        for face in CubeFace::ALL {
            let size = if Some(face) == odd { 3 } else { 4 };
            let img = RgbaImage::from_pixel(size, size, Rgba([10, 20, 30, 255]));
            let name = format!("{face}.png");
            img.save(dir.join(&name)).unwrap();
            let slot = match face {
                CubeFace::Front => &mut sides.front,
                CubeFace::Right => &mut sides.right,
                CubeFace::Back => &mut sides.back,
                CubeFace::Left => &mut sides.left,
                CubeFace::Up => &mut sides.up,
                CubeFace::Down => &mut sides.down,
            };
            *slot = PathBuf::from(name);
        }
        Scene {
            default: true,
            sides,
            hotspots: Vec::new(),
        }
    }

    #[test]
    fn loads_six_faces_in_layer_order() {
        let dir = std::env::temp_dir().join(format!("cube_panorama_faces_{}", std::process::id()));
        let scene = write_faces(&dir, None);
        let tour = Tour {
            base_dir: dir.clone(),
            ..Tour::default()
        };
        let faces = tour.load_faces(&scene).unwrap();
        assert_eq!(faces.len(), 6);
        assert!(faces.iter().all(|f| f.dimensions() == (4, 4)));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn mismatched_face_is_reported() {
        let dir = std::env::temp_dir().join(format!("cube_panorama_odd_{}", std::process::id()));
        let scene = write_faces(&dir, Some(CubeFace::Left));
        let tour = Tour {
            base_dir: dir.clone(),
            ..Tour::default()
        };
        let err = tour.load_faces(&scene).unwrap_err();
        assert!(matches!(err, TourError::FaceSize { face: CubeFace::Left, found: (3, 3), .. }));
        std::fs::remove_dir_all(dir).ok();
    }
}
