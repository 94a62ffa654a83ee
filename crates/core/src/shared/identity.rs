use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable per-object token assigned by the detection provider.
///
/// The tracker never mints identities; it only groups state by them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub u32);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Identity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Integer pixel position of an object's bounding-box center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Center of an `[x1, y1, x2, y2]` box, truncated toward zero.
    pub fn from_bbox(bbox: [f64; 4]) -> Self {
        Self {
            x: ((bbox[0] + bbox[2]) / 2.0) as i32,
            y: ((bbox[1] + bbox[3]) / 2.0) as i32,
        }
    }
}

impl From<(i32, i32)> for Centroid {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}
