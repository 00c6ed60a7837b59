use std::time::{Duration, Instant};

/// Snapshot of one worker's progress through its video.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub video_name: String,
    /// 1-based number of the frame just read.
    pub frame_number: usize,
    /// 0 when the container does not report a frame count.
    pub total_frames: usize,
    pub elapsed: Duration,
    pub people_found: u32,
}

impl ProgressUpdate {
    /// Share of the video decoded so far, or `None` when the total is unknown.
    pub fn ratio(&self) -> Option<f64> {
        if self.total_frames == 0 {
            return None;
        }
        Some((self.frame_number as f64 / self.total_frames as f64).min(1.0))
    }

    /// Remaining time by linear extrapolation of elapsed time over the
    /// decoded share.
    pub fn eta(&self) -> Option<Duration> {
        let ratio = self.ratio().filter(|r| *r > 0.0)?;
        let remaining = self.elapsed.as_secs_f64() * (1.0 / ratio - 1.0);
        Some(Duration::from_secs_f64(remaining.max(0.0)))
    }
}

/// Receives progress observations from workers.
///
/// One observer is shared by every worker of a run, hence `&self`.
pub trait ProgressObserver: Send + Sync {
    fn progress(&self, update: &ProgressUpdate);
}

/// Discards all observations. Used by tests.
pub struct NullProgressObserver;

impl ProgressObserver for NullProgressObserver {
    fn progress(&self, _update: &ProgressUpdate) {}
}

/// Writes each observation as an `info` log line.
pub struct LogProgressObserver;

impl LogProgressObserver {
    pub fn format(update: &ProgressUpdate) -> String {
        let percent = update
            .ratio()
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "?%".to_string());
        let eta = update
            .eta()
            .map(|d| format!("{:.1}s", d.as_secs_f64()))
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            "[{}] Progress: {percent} - Frame {}/{} - Elapsed: {:.1}s - ETA: {eta} - People found: {}",
            update.video_name,
            update.frame_number,
            update.total_frames,
            update.elapsed.as_secs_f64(),
            update.people_found
        )
    }
}

impl ProgressObserver for LogProgressObserver {
    fn progress(&self, update: &ProgressUpdate) {
        log::info!("{}", Self::format(update));
    }
}

/// Lets an observation through at most once per `interval`.
///
/// The clock starts at construction, so the first observation is due one
/// full interval after the worker starts reading frames.
pub struct ProgressThrottle {
    interval: Duration,
    last: Instant,
}

impl ProgressThrottle {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}
