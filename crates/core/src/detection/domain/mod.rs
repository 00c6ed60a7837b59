pub mod garment_classifier;
pub mod model_provider;
pub mod person_tracker;
