pub mod combined_result;
pub mod detection_record;
pub mod progress;
pub mod result_writer;
pub mod track_dedup_table;
pub mod video_result;
