pub mod domain;
pub mod infrastructure;
pub mod orchestrator;
pub mod result_aggregator;
pub mod video_worker;
