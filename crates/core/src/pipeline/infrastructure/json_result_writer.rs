use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pipeline::domain::combined_result::CombinedResult;
use crate::pipeline::domain::result_writer::{ResultWriteError, ResultWriter};
use crate::pipeline::domain::video_result::VideoResult;
use crate::shared::constants::ARTIFACT_TIMESTAMP_FORMAT;

/// Writes result documents as pretty-printed JSON.
///
/// The document is serialized in memory, written to `<name>.part` and then
/// renamed into place, so a reader never sees a half-written file.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonResultWriter;

impl JsonResultWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn video_result_name(video_name: &str, stamp: &str) -> String {
        format!("results_{video_name}_{stamp}.json")
    }

    pub fn combined_result_name(stamp: &str) -> String {
        format!("combined_results_{stamp}.json")
    }

    fn write_document<T: Serialize>(
        &self,
        path: PathBuf,
        document: &T,
    ) -> Result<PathBuf, ResultWriteError> {
        let json = serde_json::to_string_pretty(document)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ResultWriteError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let part = path.with_extension("json.part");
        if let Err(source) = write_then_rename(&part, &path, json.as_bytes()) {
            let _ = std::fs::remove_file(&part);
            return Err(ResultWriteError::Io { path, source });
        }

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

fn write_then_rename(part: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(part)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(part, path)
}

fn stamp() -> String {
    chrono::Local::now()
        .format(ARTIFACT_TIMESTAMP_FORMAT)
        .to_string()
}

impl ResultWriter for JsonResultWriter {
    fn write_video_result(
        &self,
        dir: &Path,
        result: &VideoResult,
    ) -> Result<PathBuf, ResultWriteError> {
        let name = Self::video_result_name(&result.video_name, &stamp());
        self.write_document(dir.join(name), result)
    }

    fn write_combined_result(
        &self,
        dir: &Path,
        result: &CombinedResult,
    ) -> Result<PathBuf, ResultWriteError> {
        let name = Self::combined_result_name(&stamp());
        self.write_document(dir.join(name), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::garment_classifier::GarmentLabel;
    use crate::pipeline::domain::combined_result::ProcessingSummary;
    use crate::pipeline::domain::detection_record::DetectionRecord;
    use crate::pipeline::domain::video_result::ProcessingInfo;
    use crate::shared::bounding_box::PixelRect;

    fn video_result() -> VideoResult {
        VideoResult {
            video_file: PathBuf::from("videos/cctv_1.mp4"),
            video_name: "cctv_1".into(),
            processing_info: ProcessingInfo::new(1.5, 10.25, 1_700_000_000.0, "2024".into()),
            total_unique_people_detected: 1,
            total_frames_processed: 120,
            tracking_ids_detected: vec![7],
            detection_results: vec![DetectionRecord {
                video_file: "cctv_1".into(),
                global_person_number: 1,
                track_id: 7,
                local_person_number: 1,
                first_detected_frame: 10,
                timestamp: "20240101_120000_123".into(),
                person_confidence: 0.87,
                bounding_box: PixelRect::new(10, 20, 110, 220),
                garment_detections: vec![GarmentLabel::new("tshirt", 0.66)],
                person_image: "person.jpg".into(),
                annotated_image: None,
            }],
            output_directory: PathBuf::from("out/cctv_1"),
        }
    }

    #[test]
    fn test_video_result_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = JsonResultWriter::new()
            .write_video_result(dir.path(), &video_result())
            .unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("results_cctv_1_"));
        assert!(file_name.ends_with(".json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["video_name"], "cctv_1");
        assert_eq!(json["processing_info"]["total_time_seconds"], 11.75);
        let record = &json["detection_results"][0];
        assert_eq!(record["bounding_box"]["x2"], 110);
        assert_eq!(record["tshirt_detections"][0]["class"], "tshirt");
        assert!(record.get("garment_detections").is_none());
        assert!(record["annotated_image"].is_null());
    }

    #[test]
    fn test_written_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let result = video_result();
        let path = JsonResultWriter::new()
            .write_video_result(dir.path(), &result)
            .unwrap();

        let parsed: VideoResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_no_part_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        JsonResultWriter::new()
            .write_video_result(dir.path(), &video_result())
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_combined_result_name() {
        let dir = tempfile::tempdir().unwrap();
        let combined = CombinedResult {
            processing_summary: ProcessingSummary {
                total_videos_processed: 0,
                total_videos_requested: 1,
                max_workers_used: 1,
                overall_processing_time_seconds: 0.5,
                processing_timestamp: "2024".into(),
                total_people_detected_across_all_videos: 0,
                failed_videos: vec![],
            },
            individual_video_results: vec![],
        };
        let path = JsonResultWriter::new()
            .write_combined_result(dir.path(), &combined)
            .unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("combined_results_"));
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[test]
    fn test_unwritable_directory_reports_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = JsonResultWriter::new()
            .write_video_result(&file.path().join("sub"), &video_result())
            .unwrap_err();
        assert!(matches!(err, ResultWriteError::Io { .. }));
    }

    #[test]
    fn test_failed_rename_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("blocked.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"occupied").unwrap();

        let err = JsonResultWriter::new()
            .write_document(target.clone(), &video_result())
            .unwrap_err();
        assert!(matches!(err, ResultWriteError::Io { ref path, .. } if *path == target));

        assert!(!dir.path().join("blocked.json.part").exists());
        assert!(target.join("keep.txt").is_file());
    }
}
