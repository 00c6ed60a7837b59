/// COCO YOLO detector with ByteTrack association, via ONNX Runtime (`ort`).
///
/// Reports every tracked class the model emits; picking out people and
/// applying the person confidence threshold is the caller's decision.
use std::path::Path;

use crate::detection::domain::person_tracker::{PersonTracker, TrackedObject};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::bytetrack_tracker::{ByteTracker, Detection};
use super::execution_provider::build_session;
use super::yolo_decoder::{self, RawDetection};

/// Candidates below this never reach the tracker.
pub const DEFAULT_DETECTION_FLOOR: f64 = 0.25;

pub struct OnnxPersonTracker {
    session: ort::session::Session,
    tracker: ByteTracker,
    detection_floor: f64,
    input_size: u32,
}

impl OnnxPersonTracker {
    pub fn new(
        model_path: &Path,
        tracker: ByteTracker,
        intra_threads: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path, intra_threads)?;
        let input_size = yolo_decoder::model_input_size(&session);
        Ok(Self {
            session,
            tracker,
            detection_floor: DEFAULT_DETECTION_FLOOR,
            input_size,
        })
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = yolo_decoder::letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Person model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        yolo_decoder::decode(
            data,
            &shape,
            letterbox,
            frame.width(),
            frame.height(),
            self.detection_floor,
        )
    }
}

impl PersonTracker for OnnxPersonTracker {
    fn track(&mut self, frame: &Frame) -> Result<Vec<TrackedObject>, Box<dyn std::error::Error>> {
        let detections = self.detect(frame)?;
        let tracker_input: Vec<Detection> = detections
            .iter()
            .map(|d| Detection {
                bbox: d.bbox,
                score: d.confidence,
                class_id: d.class_id,
            })
            .collect();

        let tracked = self
            .tracker
            .update(&tracker_input)
            .into_iter()
            .map(|t| TrackedObject {
                class_id: t.class_id,
                confidence: detections[t.det_index].confidence,
                bbox: BoundingBox::from_array(t.bbox),
                track_id: t.id,
            })
            .collect();
        Ok(tracked)
    }
}
