pub mod analysis_result;
pub mod detector_backend;
pub mod face_analyzer;
pub mod warmup_observer;
