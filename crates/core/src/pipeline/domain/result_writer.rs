use std::path::{Path, PathBuf};

use super::combined_result::CombinedResult;
use super::video_result::VideoResult;

#[derive(Debug, thiserror::Error)]
pub enum ResultWriteError {
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persists result documents. Each document is written completely or not
/// at all.
///
/// Implementations choose the file name inside `dir` and return the full
/// path written.
pub trait ResultWriter: Send + Sync {
    fn write_video_result(
        &self,
        dir: &Path,
        result: &VideoResult,
    ) -> Result<PathBuf, ResultWriteError>;

    fn write_combined_result(
        &self,
        dir: &Path,
        result: &CombinedResult,
    ) -> Result<PathBuf, ResultWriteError>;
}
