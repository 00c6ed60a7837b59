use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::video_result::VideoResult;

/// A video that produced no result, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedVideo {
    pub video_file: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub total_videos_processed: usize,
    pub total_videos_requested: usize,
    pub max_workers_used: usize,
    pub overall_processing_time_seconds: f64,
    /// RFC 3339 local time at which the summary was built.
    pub processing_timestamp: String,
    pub total_people_detected_across_all_videos: u64,
    pub failed_videos: Vec<FailedVideo>,
}

/// Run-wide report over every video that completed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub processing_summary: ProcessingSummary,
    /// Completion order.
    pub individual_video_results: Vec<VideoResult>,
}
