pub mod json_result_writer;
