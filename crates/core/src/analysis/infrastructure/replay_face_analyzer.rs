use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::analysis::domain::analysis_result::AnalysisResult;
use crate::analysis::domain::detector_backend::DetectorBackend;
use crate::analysis::domain::face_analyzer::{AnalysisError, AnalysisRequest, FaceAnalyzer};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid replay script: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("replay script has no steps")]
    EmptyScript,
}

/// One scripted inference outcome.
///
/// In JSON a step is either an array of faces or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReplayStep {
    Faces(Vec<AnalysisResult>),
    Failure { error: String },
}

/// Plays back scripted analysis outcomes in order, cycling when exhausted.
///
/// Stands in for a real model when driving the scheduler from recorded
/// results: latency and warm-up cost can be simulated, and named detector
/// backends can be made to fail so the fallback path runs.
pub struct ReplayFaceAnalyzer {
    steps: Vec<ReplayStep>,
    cursor: usize,
    latency: Duration,
    warmup_latency: Duration,
    warmed_up: bool,
    failing_backends: HashSet<DetectorBackend>,
}

impl ReplayFaceAnalyzer {
    pub fn new(steps: Vec<ReplayStep>) -> Result<Self, ReplayError> {
        if steps.is_empty() {
            return Err(ReplayError::EmptyScript);
        }
        Ok(Self {
            steps,
            cursor: 0,
            latency: Duration::ZERO,
            warmup_latency: Duration::ZERO,
            warmed_up: false,
            failing_backends: HashSet::new(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let steps: Vec<ReplayStep> = serde_json::from_str(json).map_err(ReplayError::Parse)?;
        Self::new(steps)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let json = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Delay applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Extra delay applied once, on the first call.
    pub fn with_warmup_latency(mut self, latency: Duration) -> Self {
        self.warmup_latency = latency;
        self
    }

    /// Makes every call routed through `backend` fail without consuming a step.
    pub fn with_failing_backend(mut self, backend: DetectorBackend) -> Self {
        self.failing_backends.insert(backend);
        self
    }

    pub fn steps_played(&self) -> usize {
        self.cursor
    }
}

impl FaceAnalyzer for ReplayFaceAnalyzer {
    fn analyze(
        &mut self,
        _frame: &Frame,
        request: &AnalysisRequest,
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        if !self.warmed_up {
            self.warmed_up = true;
            if !self.warmup_latency.is_zero() {
                thread::sleep(self.warmup_latency);
            }
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        if self.failing_backends.contains(&request.detector) {
            return Err(AnalysisError::Detector {
                backend: request.detector,
                message: "backend unavailable".into(),
            });
        }

        let step = &self.steps[self.cursor % self.steps.len()];
        self.cursor += 1;
        match step {
            ReplayStep::Faces(faces) => Ok(faces.clone()),
            ReplayStep::Failure { error } => Err(AnalysisError::Inference(error.clone())),
        }
    }
}
