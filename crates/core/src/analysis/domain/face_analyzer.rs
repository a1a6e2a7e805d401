use thiserror::Error;

use crate::analysis::domain::analysis_result::AnalysisResult;
use crate::analysis::domain::detector_backend::DetectorBackend;
use crate::shared::frame::Frame;

/// Attribute the model can be asked to estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceAttribute {
    Age,
    Gender,
    Emotion,
}

impl FaceAttribute {
    pub const ALL: &[FaceAttribute] = &[
        FaceAttribute::Age,
        FaceAttribute::Gender,
        FaceAttribute::Emotion,
    ];
}

/// Parameters for a single inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub attributes: Vec<FaceAttribute>,
    pub detector: DetectorBackend,
    /// When true, "no face found" yields an empty result instead of an error.
    pub allow_no_detection: bool,
}

impl AnalysisRequest {
    pub fn new(attributes: &[FaceAttribute], detector: DetectorBackend) -> Self {
        Self {
            attributes: attributes.to_vec(),
            detector,
            allow_no_detection: true,
        }
    }

    /// Same request routed through a different detector.
    pub fn with_detector(&self, detector: DetectorBackend) -> Self {
        Self {
            detector,
            ..self.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{backend} detector failed: {message}")]
    Detector {
        backend: DetectorBackend,
        message: String,
    },
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Opaque face attribute model.
///
/// Calls may block for the full duration of the model run and may fail for
/// reasons the caller cannot distinguish. Implementations may keep state
/// (loaded weights, sessions), hence `&mut self`.
pub trait FaceAnalyzer: Send {
    fn analyze(
        &mut self,
        frame: &Frame,
        request: &AnalysisRequest,
    ) -> Result<Vec<AnalysisResult>, AnalysisError>;
}
