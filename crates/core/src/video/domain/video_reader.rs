use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Decoded frame stream, as seen by a video worker.
pub type FrameStream<'a> = Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + 'a>;

/// Sequential frame source for one video.
///
/// A reader is opened once, drained through [`frames`](VideoReader::frames)
/// and closed. Frame indices are 0-based in decode order.
pub trait VideoReader: Send {
    /// Opens the container and returns its metadata. An error here means the
    /// video could not be processed at all.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    fn frames(&mut self) -> FrameStream<'_>;

    /// Releases the stream. Must be safe to call more than once.
    fn close(&mut self);
}
