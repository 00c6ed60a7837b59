use std::path::{Path, PathBuf};

use crate::detection::domain::garment_classifier::GarmentClassifier;
use crate::detection::domain::model_provider::ModelProvider;
use crate::detection::domain::person_tracker::PersonTracker;
use crate::shared::constants::TRACKER_MAX_LOST;

use super::bytetrack_tracker::ByteTracker;
use super::onnx_garment_classifier::{load_class_names, OnnxGarmentClassifier};
use super::onnx_person_tracker::OnnxPersonTracker;

#[derive(Debug, thiserror::Error)]
pub enum ModelProviderError {
    #[error("model file not found: {}", .0.display())]
    MissingModel(PathBuf),
    #[error("failed to read garment labels {}: {source}", path.display())]
    Labels {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Hands every worker its own ONNX sessions built from the same model files.
pub struct OnnxModelProvider {
    person_model: PathBuf,
    garment_model: PathBuf,
    class_names: Vec<String>,
    intra_threads: usize,
}

impl OnnxModelProvider {
    /// Checks the model files up front so a bad path fails the run before
    /// any worker starts.
    pub fn new(
        person_model: &Path,
        garment_model: &Path,
        garment_labels: Option<&Path>,
        intra_threads: usize,
    ) -> Result<Self, ModelProviderError> {
        for model in [person_model, garment_model] {
            if !model.is_file() {
                return Err(ModelProviderError::MissingModel(model.to_path_buf()));
            }
        }
        let class_names = match garment_labels {
            Some(path) => load_class_names(path).map_err(|source| ModelProviderError::Labels {
                path: path.to_path_buf(),
                source,
            })?,
            None => Vec::new(),
        };
        log::debug!(
            "Model provider: person={}, garment={}, {} garment classes, {} intra threads",
            person_model.display(),
            garment_model.display(),
            class_names.len(),
            intra_threads
        );
        Ok(Self {
            person_model: person_model.to_path_buf(),
            garment_model: garment_model.to_path_buf(),
            class_names,
            intra_threads,
        })
    }
}

impl ModelProvider for OnnxModelProvider {
    fn create_tracker(&self) -> Result<Box<dyn PersonTracker>, Box<dyn std::error::Error>> {
        let tracker = OnnxPersonTracker::new(
            &self.person_model,
            ByteTracker::new(TRACKER_MAX_LOST),
            self.intra_threads,
        )?;
        Ok(Box::new(tracker))
    }

    fn create_classifier(&self) -> Result<Box<dyn GarmentClassifier>, Box<dyn std::error::Error>> {
        let classifier = OnnxGarmentClassifier::new(
            &self.garment_model,
            self.class_names.clone(),
            self.intra_threads,
        )?;
        Ok(Box::new(classifier))
    }
}
