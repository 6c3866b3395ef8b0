//! Periodic playback state reporter for UI updates.
//!
//! The store already notifies subscribers on every mutation; the reporter
//! is the throttled alternative for consumers that would otherwise drown in
//! time updates (progress bars, debug logging hooks).

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::Duration,
};

use crate::playback::store::StateStore;
use crate::verse::VerseKey;

/// Snapshot of playback state sent to report consumers.
#[derive(Clone, PartialEq)]
pub struct Report {
    pub verse: Option<VerseKey>,
    pub time: f64,
    pub duration: f64,
    pub volume: f32,
    pub playing: bool,
    pub loading: bool,
    pub error: Option<String>,
}

/// Background reporter that polls the [`StateStore`] at fixed intervals and
/// invokes the callback only when the report changed.
#[derive(Clone)]
pub struct Reporter {
    store: StateStore,
    report: Arc<Mutex<dyn Fn(Report) + Send>>,
    interval: Duration,
    finish: Arc<AtomicBool>,
    thread_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Reporter {
    /// Create a new reporter for the given store and callback.
    pub fn new(
        store: StateStore,
        report: Arc<Mutex<dyn Fn(Report) + Send>>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            report,
            interval,
            finish: Arc::new(AtomicBool::new(false)),
            thread_handle: Arc::new(Mutex::new(None)),
        }
    }

    fn current_report(&self) -> Report {
        let state = self.store.snapshot();
        Report {
            verse: state.current_verse,
            time: state.progress,
            duration: state.duration,
            volume: state.volume,
            playing: state.is_playing,
            loading: state.is_loading || state.is_buffering,
            error: state.error,
        }
    }

    fn run(&self) {
        let mut last_report: Option<Report> = None;

        loop {
            let report = self.current_report();
            if last_report.as_ref() != Some(&report) {
                (*self.report.lock().unwrap())(report.clone());
                last_report = Some(report);
            }

            if self.finish.load(Ordering::Relaxed) {
                break;
            }

            std::thread::sleep(self.interval);
        }
    }

    /// Start the background reporting thread.
    pub fn start(&self) {
        self.stop();
        self.finish.store(false, Ordering::Relaxed);
        let this = self.clone();
        let handle = std::thread::spawn(move || this.run());
        *self.thread_handle.lock().unwrap() = Some(handle);
    }

    /// Stop the background reporting thread.
    pub fn stop(&self) {
        self.finish.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.lock().unwrap().take() {
            if handle.thread().id() == std::thread::current().id() {
                log::warn!("reporter stop called from reporter thread; skipping join");
            } else if handle.join().is_err() {
                log::warn!("reporter thread panicked during join");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn reporter_delivers_changes_and_suppresses_duplicates() {
        let store = StateStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let reporter = Reporter::new(
            store.clone(),
            Arc::new(Mutex::new(move |_report: Report| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            Duration::from_millis(5),
        );

        reporter.start();
        let deadline = Instant::now() + Duration::from_secs(2);
        while calls.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        // Initial report delivered once; an unchanged store stays quiet.
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.update(|state| state.progress = 3.0);
        let deadline = Instant::now() + Duration::from_secs(2);
        while calls.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        reporter.stop();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
