use super::garment_classifier::GarmentClassifier;
use super::person_tracker::PersonTracker;

/// Builds fresh model instances for a video worker.
///
/// Every worker owns its own tracker and classifier: tracker state is
/// per-video, and inference sessions are not shared across threads. The
/// provider itself is shared read-only by all workers.
pub trait ModelProvider: Send + Sync {
    fn create_tracker(&self) -> Result<Box<dyn PersonTracker>, Box<dyn std::error::Error>>;

    fn create_classifier(&self) -> Result<Box<dyn GarmentClassifier>, Box<dyn std::error::Error>>;
}
