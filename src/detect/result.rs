use crate::geometry::BoundingBox;

/// One normalized detection from a single frame.
///
/// Ephemeral: produced per frame, folded into tracking state, discarded.
/// Confidence filtering is the backend's responsibility; by the time a
/// `Detection` exists it is considered worth tracking.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        self.bbox.center()
    }

    pub fn area(&self) -> i64 {
        self.bbox.area()
    }
}
