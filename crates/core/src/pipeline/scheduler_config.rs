use std::time::Duration;

use thiserror::Error;

use crate::analysis::domain::detector_backend::DetectorBackend;
use crate::analysis::domain::face_analyzer::{AnalysisRequest, FaceAttribute};
use crate::shared::constants::{
    DEFAULT_ANALYSIS_INTERVAL, DEFAULT_DETECTOR, DEFAULT_FALLBACK_DETECTOR, DEFAULT_RESULT_TTL,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerConfigError {
    #[error("analysis_interval must be >= 1")]
    ZeroInterval,
    #[error("result_ttl must be greater than zero")]
    ZeroTtl,
}

/// Tuning knobs for an [`AnalysisScheduler`](super::analysis_scheduler::AnalysisScheduler).
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Frames between dispatch opportunities.
    pub analysis_interval: usize,
    /// How long a published snapshot stays readable.
    pub result_ttl: Duration,
    /// Detector tried first on every attempt.
    pub detector: DetectorBackend,
    /// Detector retried once when the first one fails.
    pub fallback_detector: Option<DetectorBackend>,
    pub attributes: Vec<FaceAttribute>,
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedulerConfigError> {
        if self.analysis_interval == 0 {
            return Err(SchedulerConfigError::ZeroInterval);
        }
        if self.result_ttl.is_zero() {
            return Err(SchedulerConfigError::ZeroTtl);
        }
        Ok(())
    }

    pub(crate) fn primary_request(&self) -> AnalysisRequest {
        AnalysisRequest::new(&self.attributes, self.detector)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            analysis_interval: DEFAULT_ANALYSIS_INTERVAL,
            result_ttl: DEFAULT_RESULT_TTL,
            detector: DEFAULT_DETECTOR,
            fallback_detector: Some(DEFAULT_FALLBACK_DETECTOR),
            attributes: FaceAttribute::ALL.to_vec(),
        }
    }
}
