pub mod bytetrack_tracker;
pub mod execution_provider;
pub mod math;
pub mod onnx_garment_classifier;
pub mod onnx_model_provider;
pub mod onnx_person_tracker;
pub mod yolo_decoder;
