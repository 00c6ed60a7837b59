use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One tracked detection reported for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedObject {
    pub class_id: u32,
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// Stable for the same subject across calls within one video session.
    pub track_id: u32,
}

/// Domain interface for detect-and-track.
///
/// Implementations carry tracker state between calls (one instance per
/// video), hence `&mut self`.
pub trait PersonTracker: Send {
    fn track(&mut self, frame: &Frame) -> Result<Vec<TrackedObject>, Box<dyn std::error::Error>>;
}
