use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::analysis::domain::analysis_result::AnalysisResult;
use crate::analysis::domain::detector_backend::DetectorBackend;
use crate::analysis::domain::face_analyzer::{AnalysisError, AnalysisRequest, FaceAnalyzer};
use crate::analysis::domain::warmup_observer::WarmupObserver;
use crate::pipeline::result_store::{Clock, ResultStore, SystemClock};
use crate::pipeline::scheduler_config::{SchedulerConfig, SchedulerConfigError};
use crate::shared::constants::WARMUP_MESSAGE;
use crate::shared::frame::Frame;

/// Counters describing what the scheduler has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub frames_submitted: u64,
    pub dispatched: u64,
    pub published: u64,
    /// Attempts that completed without finding a face.
    pub empty: u64,
    /// Attempts whose analyzer errored or panicked, after any fallback.
    pub failed: u64,
    /// Attempts that retried on the fallback detector.
    pub fallbacks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WarmupState {
    Cold,
    Warming,
    Warm,
}

struct SchedulerState {
    /// Position within the current dispatch interval, in `0..interval`.
    frame_counter: usize,
    analysis_in_flight: bool,
    warmup: WarmupState,
    stats: SchedulerStats,
}

/// State shared between the producer side and the background attempt.
struct Shared {
    state: Mutex<SchedulerState>,
    idle: Condvar,
    analyzer: Mutex<Box<dyn FaceAnalyzer>>,
    observer: Arc<dyn WarmupObserver>,
    store: Arc<ResultStore>,
    request: AnalysisRequest,
    fallback_detector: Option<DetectorBackend>,
}

/// Decides when to run the face analyzer and runs it off the caller's thread.
///
/// Every `analysis_interval`-th submitted frame is an opportunity to start a
/// background attempt; the opportunity is taken only if no attempt is in
/// flight, so there is never more than one and frames are never queued.
/// Attempts write into a [`ResultStore`] which callers poll independently.
///
/// Analyzer failures and panics stay inside the attempt: callers only ever
/// observe that no new snapshot was published.
pub struct AnalysisScheduler {
    shared: Arc<Shared>,
    analysis_interval: usize,
}

impl AnalysisScheduler {
    pub fn new(
        analyzer: Box<dyn FaceAnalyzer>,
        observer: Arc<dyn WarmupObserver>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerConfigError> {
        Self::with_clock(analyzer, observer, config, Arc::new(SystemClock))
    }

    /// Like [`AnalysisScheduler::new`], with the result store reading time from `clock`.
    pub fn with_clock(
        analyzer: Box<dyn FaceAnalyzer>,
        observer: Arc<dyn WarmupObserver>,
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerConfigError> {
        config.validate()?;

        let shared = Shared {
            state: Mutex::new(SchedulerState {
                frame_counter: 0,
                analysis_in_flight: false,
                warmup: WarmupState::Cold,
                stats: SchedulerStats::default(),
            }),
            idle: Condvar::new(),
            analyzer: Mutex::new(analyzer),
            observer,
            store: Arc::new(ResultStore::with_clock(config.result_ttl, clock)),
            request: config.primary_request(),
            fallback_detector: config.fallback_detector,
        };

        Ok(Self {
            shared: Arc::new(shared),
            analysis_interval: config.analysis_interval,
        })
    }

    /// Counts the frame and, if due and idle, starts analyzing a copy of it.
    ///
    /// Never blocks on inference.
    pub fn submit_frame(&self, frame: &Frame) {
        let dispatch = {
            let mut state = self.shared.lock_state();
            state.stats.frames_submitted += 1;
            state.frame_counter = (state.frame_counter + 1) % self.analysis_interval;
            if state.analysis_in_flight || state.frame_counter != 0 {
                false
            } else {
                state.analysis_in_flight = true;
                state.stats.dispatched += 1;
                true
            }
        };
        if !dispatch {
            return;
        }

        log::debug!("Dispatching face analysis for frame {}", frame.index());
        let frame = frame.clone();
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("face-analysis".into())
            .spawn(move || run_attempt(&shared, frame));

        if let Err(e) = spawned {
            log::error!("Failed to start face analysis thread: {e}");
            self.shared.abandon_dispatch();
        }
    }

    /// First face of the latest fresh snapshot.
    pub fn read_primary(&self) -> Option<AnalysisResult> {
        self.shared.store.read_primary()
    }

    /// All faces of the latest fresh snapshot.
    pub fn read_all(&self) -> Vec<AnalysisResult> {
        self.shared.store.read_all()
    }

    pub fn analysis_interval(&self) -> usize {
        self.analysis_interval
    }

    pub fn is_analyzing(&self) -> bool {
        self.shared.lock_state().analysis_in_flight
    }

    /// True between the warm-up begin and end notifications.
    pub fn is_warming_up(&self) -> bool {
        self.shared.lock_state().warmup == WarmupState::Warming
    }

    pub fn is_model_warmed_up(&self) -> bool {
        self.shared.lock_state().warmup == WarmupState::Warm
    }

    pub fn stats(&self) -> SchedulerStats {
        self.shared.lock_state().stats
    }

    /// Blocks until no attempt is in flight or `timeout` elapses.
    ///
    /// Returns `true` if the scheduler is idle. Meant for shutdown and tests,
    /// not for the frame path.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock_state();
        while state.analysis_in_flight {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .shared
                .idle
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        true
    }
}

impl Shared {
    // Counters and flags stay consistent even if a holder panicked.
    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_attempt(&self) {
        self.lock_state().analysis_in_flight = false;
        self.idle.notify_all();
    }

    /// Undoes a dispatch whose attempt never started.
    fn abandon_dispatch(&self) {
        {
            let mut state = self.lock_state();
            state.analysis_in_flight = false;
            state.stats.dispatched = state.stats.dispatched.saturating_sub(1);
        }
        self.idle.notify_all();
    }

    fn notify_observer(&self, message: Option<&str>) {
        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
            self.observer.on_warmup_state_changed(message)
        }));
        if notified.is_err() {
            log::error!("Warm-up observer panicked");
        }
    }

    fn begin_warmup(&self) {
        let cold = {
            let mut state = self.lock_state();
            let cold = state.warmup == WarmupState::Cold;
            if cold {
                state.warmup = WarmupState::Warming;
            }
            cold
        };
        if cold {
            log::info!("Warming up face analysis model");
            self.notify_observer(Some(WARMUP_MESSAGE));
        }
    }

    fn end_warmup(&self) {
        let warming = {
            let mut state = self.lock_state();
            let warming = state.warmup == WarmupState::Warming;
            if warming {
                state.warmup = WarmupState::Warm;
            }
            warming
        };
        if warming {
            log::info!("Face analysis model ready");
            self.notify_observer(None);
        }
    }

    fn analyze_with_fallback(&self, frame: &Frame) -> Result<Vec<AnalysisResult>, AnalysisError> {
        let mut analyzer = self.analyzer.lock().unwrap_or_else(PoisonError::into_inner);
        let err = match analyze_contained(&mut **analyzer, frame, &self.request) {
            Ok(results) => return Ok(results),
            Err(e) => e,
        };

        match self.fallback_detector {
            Some(fallback) if fallback != self.request.detector => {
                log::warn!(
                    "{} detector failed, falling back to {fallback}: {err}",
                    self.request.detector
                );
                self.lock_state().stats.fallbacks += 1;
                analyze_contained(
                    &mut **analyzer,
                    frame,
                    &self.request.with_detector(fallback),
                )
            }
            _ => Err(err),
        }
    }
}

/// Runs one analyzer call, turning a panic into an [`AnalysisError`].
fn analyze_contained(
    analyzer: &mut dyn FaceAnalyzer,
    frame: &Frame,
    request: &AnalysisRequest,
) -> Result<Vec<AnalysisResult>, AnalysisError> {
    panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(frame, request))).unwrap_or_else(
        |_| {
            Err(AnalysisError::Inference(format!(
                "{} analyzer panicked",
                request.detector
            )))
        },
    )
}

/// Clears `analysis_in_flight` when the attempt ends, however it ends.
struct InFlightGuard<'a>(&'a Shared);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_attempt();
    }
}

fn run_attempt(shared: &Shared, frame: Frame) {
    let _in_flight = InFlightGuard(shared);
    shared.begin_warmup();

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.analyze_with_fallback(&frame)));
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    shared.end_warmup();

    match outcome {
        Ok(Ok(results)) if results.is_empty() => {
            log::debug!("No faces in frame {} ({elapsed_ms:.0}ms)", frame.index());
            shared.lock_state().stats.empty += 1;
        }
        Ok(Ok(results)) => {
            log::debug!(
                "Publishing {} face(s) from frame {} ({elapsed_ms:.0}ms)",
                results.len(),
                frame.index()
            );
            shared.store.publish(results);
            shared.lock_state().stats.published += 1;
        }
        Ok(Err(e)) => {
            log::warn!("Face analysis failed for frame {}: {e}", frame.index());
            shared.lock_state().stats.failed += 1;
        }
        Err(_) => {
            log::error!("Face analyzer panicked on frame {}", frame.index());
            shared.lock_state().stats.failed += 1;
        }
    }
}
