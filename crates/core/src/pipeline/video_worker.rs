use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::detection::domain::garment_classifier::{GarmentClassifier, GarmentLabel};
use crate::detection::domain::model_provider::ModelProvider;
use crate::detection::domain::person_tracker::TrackedObject;
use crate::identity::person_sequence::PersonSequence;
use crate::pipeline::domain::detection_record::DetectionRecord;
use crate::pipeline::domain::progress::{ProgressObserver, ProgressThrottle, ProgressUpdate};
use crate::pipeline::domain::result_writer::ResultWriter;
use crate::pipeline::domain::track_dedup_table::TrackDedupTable;
use crate::pipeline::domain::video_result::{ProcessingInfo, VideoResult, VideoTask};
use crate::shared::constants::{
    DETECTION_TIMESTAMP_FORMAT, GARMENT_CONFIDENCE_THRESHOLD, MIN_CROP_SIDE,
    PERSON_CLASS_ID, PERSON_CONFIDENCE_THRESHOLD, PROGRESS_INTERVAL_SECS, SAMPLING_STRIDE,
};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// When local and global person numbers are taken relative to the crop
/// size check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IssuancePolicy {
    /// Numbers are taken only for crops that pass; every number has a record.
    #[default]
    AfterSizeCheck,
    /// Numbers are taken for every new track before the check, so rejected
    /// crops leave gaps and the people count can exceed the record count.
    BeforeSizeCheck,
}

/// Tunables for one video worker. All thresholds are strict `>` cuts.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerConfig {
    pub stride: usize,
    pub person_confidence: f64,
    pub garment_confidence: f64,
    pub min_crop_side: u32,
    pub progress_interval: Duration,
    pub issuance: IssuancePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            stride: SAMPLING_STRIDE,
            person_confidence: PERSON_CONFIDENCE_THRESHOLD,
            garment_confidence: GARMENT_CONFIDENCE_THRESHOLD,
            min_crop_side: MIN_CROP_SIDE,
            progress_interval: Duration::from_secs(PROGRESS_INTERVAL_SECS),
            issuance: IssuancePolicy::default(),
        }
    }
}

/// Builds a fresh, unopened reader for each video.
pub type ReaderFactory = Arc<dyn Fn() -> Box<dyn VideoReader> + Send + Sync>;

/// Collaborators shared by every worker of a run.
#[derive(Clone)]
pub struct WorkerContext {
    pub sequence: Arc<PersonSequence>,
    pub models: Arc<dyn ModelProvider>,
    pub readers: ReaderFactory,
    pub images: Arc<dyn ImageWriter>,
    pub results: Arc<dyn ResultWriter>,
    pub progress: Arc<dyn ProgressObserver>,
    pub cancelled: Arc<AtomicBool>,
    pub config: WorkerConfig,
}

/// How a worker run ended, short of a fault.
#[derive(Debug)]
pub enum WorkerOutcome {
    Completed(VideoResult),
    /// The video could not be opened; nothing was written.
    NotOpened(String),
    /// The run was cancelled between frames.
    Cancelled,
}

/// Closes the reader when dropped, so the stream is released on every exit
/// path including `?` and panics.
pub struct StreamGuard {
    reader: Box<dyn VideoReader>,
}

impl StreamGuard {
    pub fn new(reader: Box<dyn VideoReader>) -> Self {
        Self { reader }
    }

    pub fn reader(&mut self) -> &mut dyn VideoReader {
        self.reader.as_mut()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.reader.close();
    }
}

/// Per-video state, owned by one run and dropped with it.
struct Session {
    video_name: String,
    output_dir: PathBuf,
    table: TrackDedupTable,
    local_issued: u32,
}

impl Session {
    fn issue(&mut self, sequence: &PersonSequence) -> (u32, u64) {
        self.local_issued += 1;
        (self.local_issued, sequence.increment())
    }
}

/// Runs one video from open to per-video JSON.
///
/// A worker holds only shared, read-only collaborators; everything specific
/// to a video lives in the run, so one worker can serve many videos from
/// many threads.
pub struct VideoWorker {
    ctx: WorkerContext,
}

impl VideoWorker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    pub fn run(&self, task: &VideoTask) -> Result<WorkerOutcome, Box<dyn std::error::Error>> {
        let video_name = task.name();
        log::info!("[{video_name}] Starting processing...");

        let mut reader = (self.ctx.readers)();
        let metadata = match reader.open(&task.path) {
            Ok(metadata) => metadata,
            Err(e) => {
                reader.close();
                log::error!("[{video_name}] Error: Could not open video file: {e}");
                return Ok(WorkerOutcome::NotOpened(e.to_string()));
            }
        };
        let mut stream = StreamGuard::new(reader);

        let setup_start = Instant::now();
        let output_dir = task.output_dir();
        std::fs::create_dir_all(&output_dir)?;
        log::info!("[{video_name}] Loading models...");
        let mut tracker = self.ctx.models.create_tracker()?;
        let mut classifier = self.ctx.models.create_classifier()?;
        let setup = setup_start.elapsed();
        log::info!(
            "[{video_name}] Models loaded in {:.2} seconds",
            setup.as_secs_f64()
        );

        log::info!(
            "[{video_name}] Processing {} frames at {:.2} FPS...",
            metadata.total_frames,
            metadata.fps
        );
        let processing_start = Instant::now();
        let start_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        let mut session = Session {
            video_name,
            output_dir,
            table: TrackDedupTable::new(),
            local_issued: 0,
        };
        let stride = self.ctx.config.stride.max(1);
        let mut throttle =
            ProgressThrottle::new(self.ctx.config.progress_interval, processing_start);
        let mut frames_read = 0usize;

        for frame in stream.reader().frames() {
            if self.ctx.cancelled.load(Ordering::Relaxed) {
                log::warn!("[{}] Cancelled after {frames_read} frames", session.video_name);
                return Ok(WorkerOutcome::Cancelled);
            }
            let frame = frame?;
            frames_read += 1;
            if frame.number() % stride != 0 {
                continue;
            }

            let now = Instant::now();
            if throttle.due(now) {
                self.ctx.progress.progress(&ProgressUpdate {
                    video_name: session.video_name.clone(),
                    frame_number: frame.number(),
                    total_frames: metadata.total_frames,
                    elapsed: now.duration_since(processing_start),
                    people_found: session.local_issued,
                });
            }

            for object in tracker.track(&frame)? {
                self.consider(&mut session, &frame, object, classifier.as_mut())?;
            }
        }
        drop(stream);

        let processing = processing_start.elapsed();
        let processing_end = chrono::Local::now().to_rfc3339();
        let people = session.local_issued;
        let result = VideoResult {
            video_file: task.path.clone(),
            video_name: session.video_name.clone(),
            processing_info: ProcessingInfo::new(
                setup.as_secs_f64(),
                processing.as_secs_f64(),
                start_unix,
                processing_end,
            ),
            total_unique_people_detected: people,
            total_frames_processed: frames_read,
            tracking_ids_detected: session.table.track_ids(),
            detection_results: session.table.into_records(),
            output_directory: session.output_dir.clone(),
        };

        let results_path = self
            .ctx
            .results
            .write_video_result(&session.output_dir, &result)?;
        log::info!(
            "[{}] Complete! Processing time: {:.2}s, People detected: {people}, Results: {}",
            session.video_name,
            processing.as_secs_f64(),
            results_path.display()
        );
        Ok(WorkerOutcome::Completed(result))
    }

    /// Applies the person filter, dedup and size check to one tracked object
    /// and records it if it is a new person.
    fn consider(
        &self,
        session: &mut Session,
        frame: &Frame,
        object: TrackedObject,
        classifier: &mut dyn GarmentClassifier,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let config = &self.ctx.config;
        if object.class_id != PERSON_CLASS_ID || object.confidence <= config.person_confidence {
            return Ok(());
        }
        if session.table.contains(object.track_id) {
            return Ok(());
        }

        let early = match config.issuance {
            IssuancePolicy::BeforeSizeCheck => Some(session.issue(&self.ctx.sequence)),
            IssuancePolicy::AfterSizeCheck => None,
        };

        let bbox = object.bbox.to_pixels();
        let region = bbox.clamp_to(frame.width(), frame.height());
        let min_side = config.min_crop_side as i32;
        if region.width() < min_side || region.height() < min_side {
            log::debug!(
                "[{}] Track {} at frame {}: crop {}x{} below {min_side}px, skipped",
                session.video_name,
                object.track_id,
                frame.number(),
                region.width(),
                region.height()
            );
            return Ok(());
        }

        let (local, global) = match early {
            Some(numbers) => numbers,
            None => session.issue(&self.ctx.sequence),
        };

        let crop = frame.crop(&region);
        let classification = classifier.classify(&crop)?;
        let garments: Vec<GarmentLabel> = classification
            .labels
            .into_iter()
            .filter(|label| label.confidence > config.garment_confidence)
            .collect();

        let timestamp = chrono::Local::now()
            .format(DETECTION_TIMESTAMP_FORMAT)
            .to_string();
        let stem = artifact_stem(global, object.track_id, frame.number(), &timestamp);

        let person_image = format!("person_{stem}.jpg");
        self.write_image(&session.output_dir, &person_image, &crop)?;
        let annotated_image = match classification.annotated {
            Some(annotated) => {
                let name = format!("annotated_{stem}.jpg");
                self.write_image(&session.output_dir, &name, &annotated)?;
                Some(name)
            }
            None => None,
        };

        log::info!(
            "[{}] New person: Global #{global}, Track ID {}, Local #{local}, Garments: {}",
            session.video_name,
            object.track_id,
            garments.len()
        );

        session.table.insert(DetectionRecord {
            video_file: session.video_name.clone(),
            global_person_number: global,
            track_id: object.track_id,
            local_person_number: local,
            first_detected_frame: frame.number(),
            timestamp,
            person_confidence: object.confidence,
            bounding_box: bbox,
            garment_detections: garments,
            person_image,
            annotated_image,
        });
        Ok(())
    }

    fn write_image(
        &self,
        dir: &Path,
        name: &str,
        frame: &Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.ctx.images.write(&dir.join(name), frame)
    }
}

/// Shared part of the crop and annotated-crop file names.
pub fn artifact_stem(global: u64, track_id: u32, frame_number: usize, timestamp: &str) -> String {
    format!("global_{global:04}_track_{track_id:04}_frame_{frame_number}_{timestamp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use crate::detection::domain::garment_classifier::GarmentClassification;
    use crate::detection::domain::person_tracker::PersonTracker;
    use crate::pipeline::domain::combined_result::CombinedResult;
    use crate::pipeline::domain::progress::NullProgressObserver;
    use crate::pipeline::domain::result_writer::ResultWriteError;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::video_metadata::VideoMetadata;

    const W: u32 = 320;
    const H: u32 = 240;

    // --- Stubs ---

    struct StubReader {
        num_frames: usize,
        fail_open: bool,
        fail_at: Option<usize>,
        closed: Arc<AtomicUsize>,
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("cannot open".into());
            }
            Ok(VideoMetadata {
                width: W,
                height: H,
                fps: 25.0,
                total_frames: self.num_frames,
                codec: "stub".into(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_at = self.fail_at;
            Box::new((0..self.num_frames).map(move |i| {
                if Some(i) == fail_at {
                    return Err("decode error".into());
                }
                Ok(Frame::new(vec![0u8; (W * H * 3) as usize], W, H, 3, i))
            }))
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    type Script = HashMap<usize, Vec<TrackedObject>>;

    struct StubTracker {
        script: Arc<Script>,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl PersonTracker for StubTracker {
        fn track(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<TrackedObject>, Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(frame.number());
            Ok(self.script.get(&frame.number()).cloned().unwrap_or_default())
        }
    }

    struct StubClassifier {
        annotate: bool,
        crops: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl GarmentClassifier for StubClassifier {
        fn classify(
            &mut self,
            crop: &Frame,
        ) -> Result<GarmentClassification, Box<dyn std::error::Error>> {
            self.crops.lock().unwrap().push((crop.width(), crop.height()));
            Ok(GarmentClassification {
                labels: vec![
                    GarmentLabel::new("tshirt", 0.9),
                    GarmentLabel::new("hoodie", 0.3),
                    GarmentLabel::new("jacket", 0.31),
                ],
                annotated: self.annotate.then(|| crop.clone()),
            })
        }
    }

    struct StubModels {
        script: Arc<Script>,
        track_calls: Arc<Mutex<Vec<usize>>>,
        crops: Arc<Mutex<Vec<(u32, u32)>>>,
        annotate: bool,
        fail_load: bool,
    }

    impl ModelProvider for StubModels {
        fn create_tracker(&self) -> Result<Box<dyn PersonTracker>, Box<dyn std::error::Error>> {
            if self.fail_load {
                return Err("model missing".into());
            }
            Ok(Box::new(StubTracker {
                script: self.script.clone(),
                calls: self.track_calls.clone(),
            }))
        }

        fn create_classifier(
            &self,
        ) -> Result<Box<dyn GarmentClassifier>, Box<dyn std::error::Error>> {
            Ok(Box::new(StubClassifier {
                annotate: self.annotate,
                crops: self.crops.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct StubImageWriter {
        paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubResultWriter {
        written: Arc<Mutex<Vec<(PathBuf, VideoResult)>>>,
    }

    impl ResultWriter for StubResultWriter {
        fn write_video_result(
            &self,
            dir: &Path,
            result: &VideoResult,
        ) -> Result<PathBuf, ResultWriteError> {
            self.written
                .lock()
                .unwrap()
                .push((dir.to_path_buf(), result.clone()));
            Ok(dir.join("results.json"))
        }

        fn write_combined_result(
            &self,
            dir: &Path,
            _result: &CombinedResult,
        ) -> Result<PathBuf, ResultWriteError> {
            Ok(dir.join("combined.json"))
        }
    }

    // --- Harness ---

    fn person(track_id: u32, confidence: f64, bbox: [f64; 4]) -> TrackedObject {
        TrackedObject {
            class_id: PERSON_CLASS_ID,
            confidence,
            bbox: BoundingBox::from_array(bbox),
            track_id,
        }
    }

    const BIG: [f64; 4] = [10.0, 10.0, 110.0, 210.0];
    const SMALL: [f64; 4] = [10.0, 10.0, 40.0, 210.0];

    struct Harness {
        num_frames: usize,
        script: Script,
        config: WorkerConfig,
        fail_open: bool,
        fail_at: Option<usize>,
        fail_load: bool,
        annotate: bool,
        sequence: Arc<PersonSequence>,
        cancelled: Arc<AtomicBool>,
        closed: Arc<AtomicUsize>,
        track_calls: Arc<Mutex<Vec<usize>>>,
        crops: Arc<Mutex<Vec<(u32, u32)>>>,
        images: Arc<Mutex<Vec<PathBuf>>>,
        results: Arc<Mutex<Vec<(PathBuf, VideoResult)>>>,
        progress: Arc<dyn ProgressObserver>,
        output_root: tempfile::TempDir,
    }

    impl Harness {
        fn new(num_frames: usize) -> Self {
            Self {
                num_frames,
                script: Script::new(),
                config: WorkerConfig::default(),
                fail_open: false,
                fail_at: None,
                fail_load: false,
                annotate: false,
                sequence: Arc::new(PersonSequence::new()),
                cancelled: Arc::new(AtomicBool::new(false)),
                closed: Arc::new(AtomicUsize::new(0)),
                track_calls: Arc::default(),
                crops: Arc::default(),
                images: Arc::default(),
                results: Arc::default(),
                progress: Arc::new(NullProgressObserver),
                output_root: tempfile::tempdir().unwrap(),
            }
        }

        fn at(mut self, frame_number: usize, objects: Vec<TrackedObject>) -> Self {
            self.script.insert(frame_number, objects);
            self
        }

        fn run(&self) -> Result<WorkerOutcome, Box<dyn std::error::Error>> {
            let (num_frames, fail_open, fail_at) = (self.num_frames, self.fail_open, self.fail_at);
            let closed = self.closed.clone();
            let readers: ReaderFactory = Arc::new(move || -> Box<dyn VideoReader> {
                Box::new(StubReader {
                    num_frames,
                    fail_open,
                    fail_at,
                    closed: closed.clone(),
                })
            });
            let ctx = WorkerContext {
                sequence: self.sequence.clone(),
                models: Arc::new(StubModels {
                    script: Arc::new(self.script.clone()),
                    track_calls: self.track_calls.clone(),
                    crops: self.crops.clone(),
                    annotate: self.annotate,
                    fail_load: self.fail_load,
                }),
                readers,
                images: Arc::new(StubImageWriter {
                    paths: self.images.clone(),
                }),
                results: Arc::new(StubResultWriter {
                    written: self.results.clone(),
                }),
                progress: self.progress.clone(),
                cancelled: self.cancelled.clone(),
                config: self.config.clone(),
            };
            VideoWorker::new(ctx).run(&self.task())
        }

        fn task(&self) -> VideoTask {
            VideoTask::new("/videos/cctv_1.mp4", self.output_root.path())
        }

        fn completed(&self) -> VideoResult {
            match self.run().unwrap() {
                WorkerOutcome::Completed(result) => result,
                other => panic!("expected completion, got {other:?}"),
            }
        }
    }

    // --- Tests ---

    #[test]
    fn test_detection_runs_on_every_tenth_frame() {
        let h = Harness::new(95);
        let result = h.completed();

        assert_eq!(
            *h.track_calls.lock().unwrap(),
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90]
        );
        assert_eq!(result.total_frames_processed, 95);
    }

    #[test]
    fn test_fewer_frames_than_stride_never_detects() {
        let h = Harness::new(9);
        let result = h.completed();
        assert!(h.track_calls.lock().unwrap().is_empty());
        assert_eq!(result.total_unique_people_detected, 0);
        assert!(result.detection_results.is_empty());
    }

    #[test]
    fn test_repeat_track_keeps_first_record() {
        let h = Harness::new(40)
            .at(10, vec![person(7, 0.8, BIG)])
            .at(30, vec![person(7, 0.95, [50.0, 20.0, 150.0, 220.0])]);
        let result = h.completed();

        assert_eq!(result.detection_results.len(), 1);
        let record = &result.detection_results[0];
        assert_eq!(record.track_id, 7);
        assert_eq!(record.first_detected_frame, 10);
        assert_eq!(record.local_person_number, 1);
        assert_eq!(record.person_confidence, 0.8);
        assert_eq!(result.tracking_ids_detected, vec![7]);
        assert_eq!(h.crops.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_local_numbers_follow_encounter_order() {
        let h = Harness::new(30)
            .at(10, vec![person(4, 0.9, BIG), person(2, 0.9, BIG)])
            .at(20, vec![person(9, 0.9, BIG), person(4, 0.9, BIG)]);
        let result = h.completed();

        let seen: Vec<(u32, u32)> = result
            .detection_results
            .iter()
            .map(|r| (r.track_id, r.local_person_number))
            .collect();
        assert_eq!(seen, vec![(4, 1), (2, 2), (9, 3)]);
        assert_eq!(result.total_unique_people_detected, 3);
    }

    #[test]
    fn test_person_filter_is_strict() {
        let mut not_person = person(3, 0.9, BIG);
        not_person.class_id = 2;
        let h = Harness::new(10).at(
            10,
            vec![person(1, 0.4, BIG), not_person, person(5, 0.41, BIG)],
        );
        let result = h.completed();

        let ids: Vec<u32> = result.detection_results.iter().map(|r| r.track_id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn test_garment_filter_is_strict() {
        let h = Harness::new(10).at(10, vec![person(1, 0.9, BIG)]);
        let result = h.completed();

        let classes: Vec<&str> = result.detection_results[0]
            .garment_detections
            .iter()
            .map(|g| g.class_name.as_str())
            .collect();
        assert_eq!(classes, vec!["tshirt", "jacket"]);
    }

    #[test]
    fn test_small_crop_leaves_track_eligible() {
        let h = Harness::new(30)
            .at(10, vec![person(5, 0.9, SMALL)])
            .at(20, vec![person(5, 0.9, BIG)]);
        let result = h.completed();

        assert_eq!(result.detection_results.len(), 1);
        let record = &result.detection_results[0];
        assert_eq!(record.first_detected_frame, 20);
        assert_eq!(record.local_person_number, 1);
        assert_eq!(record.global_person_number, 1);
        assert_eq!(result.total_unique_people_detected, 1);
        assert_eq!(h.images.lock().unwrap().len(), 1);
        assert_eq!(*h.crops.lock().unwrap(), vec![(100, 200)]);
    }

    #[test]
    fn test_small_crop_alone_writes_nothing() {
        let h = Harness::new(10).at(10, vec![person(5, 0.9, [0.0, 0.0, 49.0, 49.0])]);
        let result = h.completed();

        assert!(result.detection_results.is_empty());
        assert!(h.images.lock().unwrap().is_empty());
        assert!(h.crops.lock().unwrap().is_empty());
        assert_eq!(h.sequence.issued(), 0);
    }

    #[test]
    fn test_crop_clamped_to_frame_before_size_check() {
        // 60px wide box, but only 20px of it lies inside the frame.
        let h = Harness::new(10).at(10, vec![person(1, 0.9, [300.0, 0.0, 360.0, 100.0])]);
        let result = h.completed();
        assert!(result.detection_results.is_empty());
    }

    #[test]
    fn test_eager_numbering_consumes_numbers_on_rejection() {
        let mut h = Harness::new(30)
            .at(10, vec![person(5, 0.9, SMALL)])
            .at(20, vec![person(5, 0.9, BIG)]);
        h.config.issuance = IssuancePolicy::BeforeSizeCheck;
        let result = h.completed();

        assert_eq!(result.detection_results.len(), 1);
        let record = &result.detection_results[0];
        assert_eq!(record.local_person_number, 2);
        assert_eq!(record.global_person_number, 2);
        assert_eq!(result.total_unique_people_detected, 2);
        assert_eq!(h.sequence.issued(), 2);
    }

    #[test]
    fn test_global_numbers_come_from_shared_sequence() {
        let h = Harness::new(10).at(10, vec![person(1, 0.9, BIG), person(2, 0.9, BIG)]);
        h.sequence.increment();
        h.sequence.increment();
        let result = h.completed();

        let globals: Vec<u64> = result
            .detection_results
            .iter()
            .map(|r| r.global_person_number)
            .collect();
        assert_eq!(globals, vec![3, 4]);
    }

    #[test]
    fn test_artifact_names_and_locations() {
        let mut h = Harness::new(20).at(20, vec![person(7, 0.9, BIG)]);
        h.annotate = true;
        let result = h.completed();

        let record = &result.detection_results[0];
        assert!(record
            .person_image
            .starts_with("person_global_0001_track_0007_frame_20_"));
        assert!(record.person_image.ends_with(".jpg"));
        let annotated = record.annotated_image.as_deref().unwrap();
        assert_eq!(
            annotated.strip_prefix("annotated_"),
            record.person_image.strip_prefix("person_")
        );
        assert!(record.person_image.contains(&record.timestamp));
        assert_eq!(record.video_file, "cctv_1");

        let out_dir = h.output_root.path().join("cctv_1");
        assert_eq!(
            *h.images.lock().unwrap(),
            vec![
                out_dir.join(&record.person_image),
                out_dir.join(annotated)
            ]
        );
        assert!(out_dir.is_dir());
        assert_eq!(result.output_directory, out_dir);
    }

    #[test]
    fn test_bounding_box_recorded_as_truncated_pixels() {
        let h = Harness::new(10).at(10, vec![person(1, 0.9, [10.7, 20.2, 110.9, 220.5])]);
        let result = h.completed();
        let bbox = result.detection_results[0].bounding_box;
        assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (10, 20, 110, 220));
    }

    #[test]
    fn test_result_written_to_video_directory() {
        let h = Harness::new(10).at(10, vec![person(1, 0.9, BIG)]);
        let result = h.completed();

        let written = h.results.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, h.output_root.path().join("cctv_1"));
        assert_eq!(written[0].1, result);
        assert_eq!(result.video_name, "cctv_1");
        assert_eq!(result.video_file, PathBuf::from("/videos/cctv_1.mp4"));
    }

    #[test]
    fn test_open_failure_reports_not_opened_without_artifacts() {
        let mut h = Harness::new(10);
        h.fail_open = true;

        assert!(matches!(h.run().unwrap(), WorkerOutcome::NotOpened(_)));
        assert!(h.track_calls.lock().unwrap().is_empty());
        assert!(h.results.lock().unwrap().is_empty());
        assert!(!h.output_root.path().join("cctv_1").exists());
        assert_eq!(h.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stream_closed_once_on_success() {
        let h = Harness::new(20);
        h.completed();
        assert_eq!(h.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decode_error_fails_and_closes_stream() {
        let mut h = Harness::new(30);
        h.fail_at = Some(15);

        assert!(h.run().is_err());
        assert_eq!(h.closed.load(Ordering::SeqCst), 1);
        assert!(h.results.lock().unwrap().is_empty());
    }

    #[test]
    fn test_model_load_failure_fails_and_closes_stream() {
        let mut h = Harness::new(30);
        h.fail_load = true;

        assert!(h.run().is_err());
        assert_eq!(h.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_run_stops_before_detection() {
        let h = Harness::new(30).at(10, vec![person(1, 0.9, BIG)]);
        h.cancelled.store(true, Ordering::SeqCst);

        assert!(matches!(h.run().unwrap(), WorkerOutcome::Cancelled));
        assert!(h.track_calls.lock().unwrap().is_empty());
        assert!(h.results.lock().unwrap().is_empty());
        assert_eq!(h.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_progress_reported_with_zero_interval() {
        struct Capture(Mutex<Vec<ProgressUpdate>>);
        impl ProgressObserver for Capture {
            fn progress(&self, update: &ProgressUpdate) {
                self.0.lock().unwrap().push(update.clone());
            }
        }

        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        let mut h = Harness::new(20).at(10, vec![person(1, 0.9, BIG)]);
        h.config.progress_interval = Duration::ZERO;
        h.progress = capture.clone();
        h.completed();

        let updates = capture.0.lock().unwrap();
        let frames: Vec<usize> = updates.iter().map(|u| u.frame_number).collect();
        assert_eq!(frames, vec![10, 20]);
        assert_eq!(updates[0].video_name, "cctv_1");
        assert_eq!(updates[0].total_frames, 20);
        assert_eq!(updates[0].people_found, 0);
        assert_eq!(updates[1].people_found, 1);
    }

    #[test]
    fn test_progress_throttled_by_interval() {
        struct Count(AtomicUsize);
        impl ProgressObserver for Count {
            fn progress(&self, _update: &ProgressUpdate) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(Count(AtomicUsize::new(0)));
        let mut h = Harness::new(100);
        h.progress = count.clone();
        h.completed();
        assert_eq!(count.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_artifact_stem_pads_ids() {
        assert_eq!(
            artifact_stem(12, 3, 150, "20240101_120000_042"),
            "global_0012_track_0003_frame_150_20240101_120000_042"
        );
    }
}
