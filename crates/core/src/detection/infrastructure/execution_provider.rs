use std::path::Path;

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Builds an inference session for one worker.
///
/// Several workers run their own sessions side by side, so each session gets
/// a slice of the cores rather than all of them.
pub fn build_session(
    model_path: &Path,
    intra_threads: usize,
) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let session = ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads.max(1))?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Cores available to each of `workers` concurrent sessions.
pub fn intra_threads_per_worker(workers: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / workers.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intra_threads_never_zero() {
        assert!(intra_threads_per_worker(1) >= 1);
        assert_eq!(intra_threads_per_worker(usize::MAX), 1);
    }

    #[test]
    fn test_intra_threads_zero_workers_treated_as_one() {
        assert_eq!(intra_threads_per_worker(0), intra_threads_per_worker(1));
    }
}
