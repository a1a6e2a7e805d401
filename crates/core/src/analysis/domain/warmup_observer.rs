/// Receives the one-time model warm-up notifications.
///
/// Called with a human-readable loading message when warm-up begins and
/// with `None` when it ends. Invoked from the background analysis thread.
pub trait WarmupObserver: Send + Sync {
    fn on_warmup_state_changed(&self, message: Option<&str>);
}

impl<F> WarmupObserver for F
where
    F: Fn(Option<&str>) + Send + Sync,
{
    fn on_warmup_state_changed(&self, message: Option<&str>) {
        self(message)
    }
}

/// Observer that ignores warm-up notifications.
pub struct NullWarmupObserver;

impl WarmupObserver for NullWarmupObserver {
    fn on_warmup_state_changed(&self, _message: Option<&str>) {}
}
