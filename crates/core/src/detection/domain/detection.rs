use crate::shared::identity::{Centroid, Identity};

/// One identified object in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub identity: Identity,
    pub centroid: Centroid,
}

impl Detection {
    pub fn new(identity: impl Into<Identity>, centroid: impl Into<Centroid>) -> Self {
        Self {
            identity: identity.into(),
            centroid: centroid.into(),
        }
    }

    /// Detection positioned at the center of an `[x1, y1, x2, y2]` box.
    pub fn from_bbox(identity: impl Into<Identity>, bbox: [f64; 4]) -> Self {
        Self {
            identity: identity.into(),
            centroid: Centroid::from_bbox(bbox),
        }
    }
}
