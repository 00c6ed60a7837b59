use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;

/// A garment class found on a person crop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GarmentLabel {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
}

impl GarmentLabel {
    pub fn new(class_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
        }
    }
}

/// Classifier output for one crop.
#[derive(Clone, Debug, Default)]
pub struct GarmentClassification {
    pub labels: Vec<GarmentLabel>,
    /// Renderable copy of the crop with the findings drawn on it, when the
    /// classifier can produce one.
    pub annotated: Option<Frame>,
}

/// Domain interface for garment classification of a person crop.
pub trait GarmentClassifier: Send {
    fn classify(&mut self, crop: &Frame)
        -> Result<GarmentClassification, Box<dyn std::error::Error>>;
}
