//! Cancellable delayed execution for sequencer continuations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Handle to one scheduled task. Cancelling is advisory: a task that has
/// already started running cannot be stopped, which is why continuations
/// also re-check the playback id before acting.
#[derive(Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a task after a delay unless its handle was cancelled first.
pub trait DelayScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle;
}

/// Scheduler backed by one short-lived thread per task.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl DelayScheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        let timer = handle.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if timer.is_cancelled() {
                return;
            }
            task();
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn thread_scheduler_runs_task_after_delay() {
        let scheduler = ThreadScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let deadline = Instant::now() + Duration::from_secs(2);
        while fired.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let scheduler = ThreadScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        let handle = scheduler.schedule(
            Duration::from_millis(50),
            Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        handle.cancel();
        thread::sleep(Duration::from_millis(120));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
