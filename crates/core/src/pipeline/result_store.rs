use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::analysis::domain::analysis_result::AnalysisResult;
use crate::shared::constants::DEFAULT_RESULT_TTL;

/// Time source for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Results of one completed analysis run together with their capture time.
///
/// Never mutated after construction; a newer run replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSnapshot {
    results: Vec<AnalysisResult>,
    captured_at: Instant,
}

impl ResultSnapshot {
    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) < ttl
    }
}

/// Latest analysis output with TTL-gated reads.
///
/// Writers and readers share one short critical section, so a reader sees
/// either the previous snapshot or the new one, never a mix. Nothing here
/// waits on inference.
pub struct ResultStore {
    snapshot: Mutex<Option<Arc<ResultSnapshot>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshot: Mutex::new(None),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replaces the current snapshot, stamping it with the current time.
    pub fn publish(&self, results: Vec<AnalysisResult>) {
        let snapshot = Arc::new(ResultSnapshot {
            results,
            captured_at: self.clock.now(),
        });
        *self.lock() = Some(snapshot);
    }

    /// First face of the current snapshot, if the snapshot is still fresh.
    ///
    /// "First" is positional; it serves consumers that only show one face.
    pub fn read_primary(&self) -> Option<AnalysisResult> {
        self.fresh_snapshot()
            .and_then(|snapshot| snapshot.results.first().cloned())
    }

    /// All faces of the current snapshot, or empty if expired or never published.
    pub fn read_all(&self) -> Vec<AnalysisResult> {
        self.fresh_snapshot()
            .map(|snapshot| snapshot.results.clone())
            .unwrap_or_default()
    }

    /// The current snapshot if it has not expired.
    pub fn fresh_snapshot(&self) -> Option<Arc<ResultSnapshot>> {
        let now = self.clock.now();
        let guard = self.lock();
        guard
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh(now, self.ttl))
            .cloned()
    }

    /// Age of the most recent snapshot, expired or not.
    pub fn snapshot_age(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.lock()
            .as_ref()
            .map(|snapshot| now.saturating_duration_since(snapshot.captured_at))
    }

    // A panicking writer cannot leave a half-built snapshot behind, so a
    // poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Option<Arc<ResultSnapshot>>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_TTL)
    }
}
