use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::domain::combined_result::{CombinedResult, FailedVideo, ProcessingSummary};
use crate::pipeline::domain::result_writer::{ResultWriteError, ResultWriter};
use crate::pipeline::domain::video_result::{round2, VideoResult};
use crate::pipeline::orchestrator::RunReport;

/// Run-level facts the per-video results do not carry.
#[derive(Clone, Debug, PartialEq)]
pub struct RunMetadata {
    pub requested: usize,
    pub workers: usize,
    pub elapsed: Duration,
    /// RFC 3339.
    pub timestamp: String,
    pub failed: Vec<FailedVideo>,
}

/// Folds the settled per-video results into one run summary.
///
/// Pure: the result list keeps its order and nothing is read from the clock.
pub fn aggregate(results: Vec<VideoResult>, metadata: RunMetadata) -> CombinedResult {
    let total_people = results
        .iter()
        .map(|r| u64::from(r.total_unique_people_detected))
        .sum();

    CombinedResult {
        processing_summary: ProcessingSummary {
            total_videos_processed: results.len(),
            total_videos_requested: metadata.requested,
            max_workers_used: metadata.workers,
            overall_processing_time_seconds: round2(metadata.elapsed.as_secs_f64()),
            processing_timestamp: metadata.timestamp,
            total_people_detected_across_all_videos: total_people,
            failed_videos: metadata.failed,
        },
        individual_video_results: results,
    }
}

/// Writes the one combined document of a run.
pub struct ResultAggregator {
    writer: Arc<dyn ResultWriter>,
}

impl ResultAggregator {
    pub fn new(writer: Arc<dyn ResultWriter>) -> Self {
        Self { writer }
    }

    /// Aggregates the report, writes it into `output_root` and logs the run
    /// summary. Returns the path written.
    pub fn publish(
        &self,
        report: RunReport,
        output_root: &Path,
    ) -> Result<PathBuf, ResultWriteError> {
        let metadata = RunMetadata {
            requested: report.requested,
            workers: report.workers,
            elapsed: report.elapsed,
            timestamp: chrono::Local::now().to_rfc3339(),
            failed: report.failed_videos(),
        };
        let combined = aggregate(report.successes, metadata);
        let path = self.writer.write_combined_result(output_root, &combined)?;

        let summary = &combined.processing_summary;
        log::info!("{}", "=".repeat(60));
        log::info!("PROCESSING COMPLETE!");
        log::info!("{}", "=".repeat(60));
        log::info!(
            "Total videos processed: {}/{}",
            summary.total_videos_processed,
            summary.total_videos_requested
        );
        log::info!(
            "Overall processing time: {:.2} seconds",
            summary.overall_processing_time_seconds
        );
        log::info!(
            "Total unique people detected: {}",
            summary.total_people_detected_across_all_videos
        );
        for failed in &summary.failed_videos {
            log::warn!("Failed: {} ({})", failed.video_file.display(), failed.reason);
        }
        log::info!("Results saved to: {}", path.display());
        log::info!("Individual results saved in: {}", output_root.display());

        Ok(path)
    }
}
