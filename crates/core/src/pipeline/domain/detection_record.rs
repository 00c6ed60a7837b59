use serde::{Deserialize, Serialize};

use crate::detection::domain::garment_classifier::GarmentLabel;
use crate::shared::bounding_box::PixelRect;

/// First qualifying sighting of one tracked person in one video.
///
/// Built once when the person is accepted and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Video name (file stem), not the full path.
    pub video_file: String,
    pub global_person_number: u64,
    pub track_id: u32,
    pub local_person_number: u32,
    /// 1-based frame number.
    pub first_detected_frame: usize,
    pub timestamp: String,
    pub person_confidence: f64,
    pub bounding_box: PixelRect,
    #[serde(rename = "tshirt_detections")]
    pub garment_detections: Vec<GarmentLabel>,
    /// File name of the person crop, relative to the video's output directory.
    pub person_image: String,
    pub annotated_image: Option<String>,
}
