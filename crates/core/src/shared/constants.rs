use std::time::Duration;

use crate::analysis::domain::detector_backend::DetectorBackend;

/// Frames between dispatch opportunities.
pub const DEFAULT_ANALYSIS_INTERVAL: usize = 15;

/// How long a published snapshot stays visible to readers.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(2);

/// Message handed to the warm-up observer while the first inference runs.
pub const WARMUP_MESSAGE: &str = "Loading model...";

pub const DEFAULT_DETECTOR: DetectorBackend = DetectorBackend::RetinaFace;
pub const DEFAULT_FALLBACK_DETECTOR: DetectorBackend = DetectorBackend::OpenCv;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
