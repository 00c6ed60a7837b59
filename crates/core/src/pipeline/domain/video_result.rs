use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::detection_record::DetectionRecord;

/// One video to process and where its artifacts go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoTask {
    pub path: PathBuf,
    pub output_root: PathBuf,
}

impl VideoTask {
    pub fn new(path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            output_root: output_root.into(),
        }
    }

    /// File stem of the video; prefixes log lines and names the output
    /// directory.
    pub fn name(&self) -> String {
        video_name(&self.path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(self.name())
    }
}

pub fn video_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Timing breakdown of one worker run, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    /// Output directory creation plus model loading.
    pub model_load_time_seconds: f64,
    pub video_processing_time_seconds: f64,
    pub total_time_seconds: f64,
    /// Unix time at which frame processing started.
    pub processing_start: f64,
    /// RFC 3339 local time at which frame processing ended.
    pub processing_end: String,
}

impl ProcessingInfo {
    pub fn new(setup_secs: f64, processing_secs: f64, start_unix: f64, end: String) -> Self {
        Self {
            model_load_time_seconds: round2(setup_secs),
            video_processing_time_seconds: round2(processing_secs),
            total_time_seconds: round2(setup_secs + processing_secs),
            processing_start: start_unix,
            processing_end: end,
        }
    }
}

/// Everything one worker found in one video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub video_file: PathBuf,
    pub video_name: String,
    pub processing_info: ProcessingInfo,
    pub total_unique_people_detected: u32,
    /// Decoded frames, sampled or not.
    pub total_frames_processed: usize,
    pub tracking_ids_detected: Vec<u32>,
    pub detection_results: Vec<DetectionRecord>,
    pub output_directory: PathBuf,
}

/// Rounds to two decimals, the precision every reported duration uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
