use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a frame (typically a person crop) as an image file.
///
/// Shared by all workers, so implementations must be stateless or
/// internally synchronized.
pub trait ImageWriter: Send + Sync {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
