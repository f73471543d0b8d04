// error.rs: tour loading failures

use crate::tour::CubeFace;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TourError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed tour: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tour has no scenes")]
    Empty,
    #[error("no scene named `{0}`")]
    UnknownScene(String),
    #[error("hotspot in scene `{scene}` points to missing scene `{target}`")]
    UnknownTarget { scene: String, target: String },
    #[error("cannot decode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{face} face is {found:?}, expected {expected:?}")]
    FaceSize {
        face: CubeFace,
        expected: (u32, u32),
        found: (u32, u32),
    },
}
