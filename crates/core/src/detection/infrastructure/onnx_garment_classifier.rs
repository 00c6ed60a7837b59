use std::path::Path;

use crate::detection::domain::garment_classifier::{
    GarmentClassification, GarmentClassifier, GarmentLabel,
};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::yolo_decoder::{self, RawDetection};

/// Same floor the model's own plotting uses; callers apply stricter cuts.
pub const DEFAULT_GARMENT_FLOOR: f64 = 0.25;

const OUTLINE_THICKNESS: i32 = 2;

const PALETTE: [[u8; 3]; 6] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [72, 249, 10],
    [0, 194, 255],
    [132, 56, 255],
];

/// Garment detector run on a person crop, via ONNX Runtime.
///
/// The model is a YOLO detection head trained on garment classes; each
/// detection becomes one label. The annotated crop has every detection
/// outlined in its class colour.
pub struct OnnxGarmentClassifier {
    session: ort::session::Session,
    class_names: Vec<String>,
    input_size: u32,
    floor: f64,
}

impl OnnxGarmentClassifier {
    pub fn new(
        model_path: &Path,
        class_names: Vec<String>,
        intra_threads: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path, intra_threads)?;
        let input_size = yolo_decoder::model_input_size(&session);
        Ok(Self {
            session,
            class_names,
            input_size,
            floor: DEFAULT_GARMENT_FLOOR,
        })
    }

    fn class_name(&self, class_id: u32) -> String {
        self.class_names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }
}

impl GarmentClassifier for OnnxGarmentClassifier {
    fn classify(
        &mut self,
        crop: &Frame,
    ) -> Result<GarmentClassification, Box<dyn std::error::Error>> {
        let detections = {
            let (input_tensor, letterbox) = yolo_decoder::letterbox(crop, self.input_size);
            let input_value = ort::value::Tensor::from_array(input_tensor)?;
            let outputs = self.session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("Garment model produced no outputs".into());
            }
            let tensor = outputs[0].try_extract_array::<f32>()?;
            let shape = tensor.shape().to_vec();
            let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

            yolo_decoder::decode(
                data,
                &shape,
                letterbox,
                crop.width(),
                crop.height(),
                self.floor,
            )?
        };

        let labels = detections
            .iter()
            .map(|d| GarmentLabel::new(self.class_name(d.class_id), d.confidence))
            .collect();

        Ok(GarmentClassification {
            labels,
            annotated: Some(annotate(crop, &detections)),
        })
    }
}

/// Reads class names, one per line; blank lines are skipped.
pub fn load_class_names(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Copies the crop and outlines each detection on the copy.
fn annotate(crop: &Frame, detections: &[RawDetection]) -> Frame {
    let mut annotated = crop.clone();
    for det in detections {
        let color = PALETTE[det.class_id as usize % PALETTE.len()];
        draw_outline(&mut annotated, BoundingBox::from_array(det.bbox), color);
    }
    annotated
}

fn draw_outline(frame: &mut Frame, bbox: BoundingBox, color: [u8; 3]) {
    let rect = bbox.to_pixels().clamp_to(frame.width(), frame.height());
    if rect.width() == 0 || rect.height() == 0 {
        return;
    }
    let channels = (frame.channels() as usize).min(3);
    let mut pixels = frame.as_ndarray_mut();

    for y in rect.y1..rect.y2 {
        for x in rect.x1..rect.x2 {
            let on_edge = x - rect.x1 < OUTLINE_THICKNESS
                || rect.x2 - 1 - x < OUTLINE_THICKNESS
                || y - rect.y1 < OUTLINE_THICKNESS
                || rect.y2 - 1 - y < OUTLINE_THICKNESS;
            if on_edge {
                for (c, value) in color.iter().enumerate().take(channels) {
                    pixels[[y as usize, x as usize, c]] = *value;
                }
            }
        }
    }
}
