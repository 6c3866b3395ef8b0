//! Test doubles for driving the playback controller without an audio
//! device: a recording media backend and a manually fired scheduler.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::playback::media::{
    EventSink, MediaBackend, MediaElement, MediaEvent, PlaybackError,
};
use crate::playback::scheduler::{DelayScheduler, TimerHandle};

/// Commands a mock element records, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    SetSource(String),
    Load,
    Play,
    Pause,
    SetVolume(f32),
    SetRate(f32),
    SetLooping(bool),
    Seek(f64),
}

#[derive(Default)]
struct MockElementInner {
    commands: Vec<MockCommand>,
    live: bool,
    fail_play: bool,
}

/// Test-side handle to one created element. Stays valid after the player
/// tears the element down, so tests can replay stale events.
#[derive(Clone)]
pub struct MockElementHandle {
    inner: Arc<Mutex<MockElementInner>>,
    events: EventSink,
}

impl MockElementHandle {
    /// Deliver a synthetic media event as this element.
    pub fn emit(&self, event: MediaEvent) {
        self.events.emit(event);
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> Vec<MockCommand> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// True while the player still owns this element.
    pub fn is_live(&self) -> bool {
        self.inner.lock().unwrap().live
    }
}

struct MockMediaElement {
    inner: Arc<Mutex<MockElementInner>>,
}

impl MediaElement for MockMediaElement {
    fn set_source(&mut self, url: &str) {
        self.record(MockCommand::SetSource(url.to_string()));
    }

    fn load(&mut self) {
        self.record(MockCommand::Load);
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.record(MockCommand::Play);
        if self.inner.lock().unwrap().fail_play {
            return Err(PlaybackError::Output("play request refused".to_string()));
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.record(MockCommand::Pause);
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(MockCommand::SetVolume(volume));
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.record(MockCommand::SetRate(rate));
    }

    fn set_looping(&mut self, looping: bool) {
        self.record(MockCommand::SetLooping(looping));
    }

    fn seek(&mut self, seconds: f64) {
        self.record(MockCommand::Seek(seconds));
    }
}

impl MockMediaElement {
    fn record(&self, command: MockCommand) {
        self.inner.lock().unwrap().commands.push(command);
    }
}

impl Drop for MockMediaElement {
    fn drop(&mut self) {
        self.inner.lock().unwrap().live = false;
    }
}

/// Media backend that hands out recording elements and keeps a handle to
/// every element it ever created.
#[derive(Clone, Default)]
pub struct MockMediaBackend {
    handles: Arc<Mutex<Vec<MockElementHandle>>>,
    fail_next_create: Arc<AtomicBool>,
    fail_next_play: Arc<AtomicBool>,
}

impl MockMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the `index`-th created element (creation order).
    ///
    /// # Panics
    /// Panics when fewer elements were created.
    pub fn handle(&self, index: usize) -> MockElementHandle {
        self.handles.lock().unwrap()[index].clone()
    }

    /// Number of elements created so far.
    pub fn created(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Number of elements the player currently owns.
    pub fn live_count(&self) -> usize {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .filter(|handle| handle.is_live())
            .count()
    }

    /// Make the next `create_element` call fail.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Make the next element reject its first play request.
    pub fn fail_next_play(&self) {
        self.fail_next_play.store(true, Ordering::SeqCst);
    }
}

impl MediaBackend for MockMediaBackend {
    fn create_element(&mut self, events: EventSink) -> Result<Box<dyn MediaElement>, PlaybackError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(PlaybackError::Output("element creation refused".to_string()));
        }
        let inner = Arc::new(Mutex::new(MockElementInner {
            commands: Vec::new(),
            live: true,
            fail_play: self.fail_next_play.swap(false, Ordering::SeqCst),
        }));
        self.handles.lock().unwrap().push(MockElementHandle {
            inner: inner.clone(),
            events,
        });
        Ok(Box::new(MockMediaElement { inner }))
    }
}

struct ScheduledTask {
    delay: Duration,
    task: Box<dyn FnOnce() + Send>,
    handle: TimerHandle,
}

/// Scheduler that queues tasks until the test fires them, making timer
/// interleavings deterministic.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<ScheduledTask>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Delay of the next queued task.
    pub fn next_delay(&self) -> Option<Duration> {
        self.queue.lock().unwrap().front().map(|entry| entry.delay)
    }

    /// Whether the next queued task's handle was cancelled.
    pub fn next_is_cancelled(&self) -> bool {
        self.queue
            .lock()
            .unwrap()
            .front()
            .map(|entry| entry.handle.is_cancelled())
            .unwrap_or(false)
    }

    /// Pop and run the next task (skipping its body when cancelled).
    /// Returns false when the queue is empty.
    pub fn fire_next(&self) -> bool {
        let entry = self.queue.lock().unwrap().pop_front();
        let Some(entry) = entry else {
            return false;
        };
        if !entry.handle.is_cancelled() {
            (entry.task)();
        }
        true
    }

    /// Fire queued tasks until none remain, including tasks queued while
    /// firing.
    pub fn fire_all(&self) {
        while self.fire_next() {}
    }
}

impl DelayScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        self.queue.lock().unwrap().push_back(ScheduledTask {
            delay,
            task,
            handle: handle.clone(),
        });
        handle
    }
}
