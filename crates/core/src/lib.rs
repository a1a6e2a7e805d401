//! Throttled background face attribute analysis.
//!
//! Frames are pushed into an [`pipeline::analysis_scheduler::AnalysisScheduler`]
//! at video rate; every few frames it runs a slow [`analysis::domain::face_analyzer::FaceAnalyzer`]
//! on its own thread and publishes the faces it finds into a
//! [`pipeline::result_store::ResultStore`] that readers poll without waiting.

pub mod analysis;
pub mod pipeline;
pub mod shared;
