use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported frame count; 0 when the container does not say.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Fraction of the video decoded once `frame_number` frames have been read,
    /// or `None` when the total is unknown.
    pub fn progress_ratio(&self, frame_number: usize) -> Option<f64> {
        if self.total_frames == 0 {
            return None;
        }
        Some((frame_number as f64 / self.total_frames as f64).min(1.0))
    }
}
