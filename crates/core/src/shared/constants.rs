pub const PERSON_MODEL_NAME: &str = "yolov8s.onnx";
pub const PERSON_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.2.0/yolov8s.onnx";

pub const GARMENT_MODEL_NAME: &str = "tshirt_detection_model.onnx";

/// COCO class id the person detector reports for people.
pub const PERSON_CLASS_ID: u32 = 0;

/// Only every Nth decoded frame is offered to detection.
pub const SAMPLING_STRIDE: usize = 10;

/// Person detections must score strictly above this to qualify.
pub const PERSON_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Garment labels must score strictly above this to be kept.
pub const GARMENT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Crops with either side below this many pixels are rejected.
pub const MIN_CROP_SIDE: u32 = 50;

/// Minimum wall-clock gap between two progress observations of one worker.
pub const PROGRESS_INTERVAL_SECS: u64 = 5;

/// Upper bound on concurrently processed videos, regardless of core count.
pub const MAX_WORKERS: usize = 4;

/// Max tracker updates a track can go unmatched before removal. The tracker
/// only sees sampled frames, so this is counted in sampled frames.
pub const TRACKER_MAX_LOST: usize = 30;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv"];

/// Millisecond-resolution stamp embedded in crop filenames and records.
pub const DETECTION_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Second-resolution stamp used for per-video and per-run JSON names.
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
