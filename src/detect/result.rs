use serde::Serialize;

/// Pixel rectangle of a detection. Display-only; scoring never looks at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }
}

/// One classification result for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub region: Region,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, region: Region) -> Self {
        Self {
            label: label.into(),
            confidence,
            region,
        }
    }

    pub fn qualifies(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

/// First detection whose confidence is strictly above `threshold`.
///
/// Stops at the first hit; later detections in the frame are not inspected.
pub fn first_qualifying(detections: &[Detection], threshold: f32) -> Option<&Detection> {
    detections.iter().find(|d| d.qualifies(threshold))
}

/// Per-frame evidence: does any detection qualify?
pub fn has_qualifying_detection(detections: &[Detection], threshold: f32) -> bool {
    first_qualifying(detections, threshold).is_some()
}
