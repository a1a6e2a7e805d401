use serde::{Deserialize, Serialize};

/// Pixel bounding box of a detected face.
///
/// Inference backends that cannot localize a face report an all-zero box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// True when the backend did not provide a location.
    pub fn is_unavailable(&self) -> bool {
        *self == Self::default()
    }
}
