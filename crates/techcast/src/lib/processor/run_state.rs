use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the owning processor is mid-run. A run must hold the
/// [`RunToken`] obtained from [`RunState::try_begin`]; triggers arriving
/// while a token is alive are rejected.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
}

#[derive(Debug)]
pub struct RunToken<'a> {
    state: &'a RunState,
}

impl RunState {
    pub fn try_begin(&self) -> Option<RunToken<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunToken { state: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::Release);
    }
}
