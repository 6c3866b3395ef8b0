//! High-level playback controller for the Tilawa library.

mod controls;
mod sequencer;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::playback::media::{EventSink, MediaBackend, MediaElement, MediaEvent};
use crate::playback::scheduler::{DelayScheduler, TimerHandle};
use crate::playback::state::{
    clamp_playback_rate, PlayMode, PlaybackState, LOAD_ERROR_MESSAGE, PLAY_ERROR_MESSAGE,
};
use crate::playback::store::StateStore;
use crate::prefs::{PreferenceStore, PLAYBACK_RATE_KEY};
use crate::verse::{self, SurahSpan, VerseKey};

/// Primary playback controller.
///
/// `Player` owns the single live media element, the playback id counter that
/// invalidates superseded attempts, and the shared state store UI consumers
/// subscribe to. It is explicitly constructed with its collaborators and is
/// cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Player {
    store: StateStore,
    backend: Arc<Mutex<Box<dyn MediaBackend>>>,
    scheduler: Arc<dyn DelayScheduler>,
    prefs: Arc<Mutex<Box<dyn PreferenceStore>>>,
    element: Arc<Mutex<Option<Box<dyn MediaElement>>>>,
    playback_id: Arc<AtomicU64>,
    pending_advance: Arc<Mutex<Option<TimerHandle>>>,
    /// Total-ayah limit supplied for the current attempt, when any.
    attempt_total_ayahs: Arc<Mutex<Option<u32>>>,
}

impl Player {
    /// Create a player with injected collaborators.
    ///
    /// The persisted playback rate is restored from `prefs` (falling back to
    /// the default when absent or unparsable).
    pub fn new(
        backend: Box<dyn MediaBackend>,
        scheduler: Arc<dyn DelayScheduler>,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        let mut initial = PlaybackState::default();
        if let Some(raw) = prefs.get(PLAYBACK_RATE_KEY) {
            match raw.parse::<f32>() {
                Ok(rate) => initial.playback_rate = clamp_playback_rate(rate),
                Err(_) => warn!("ignoring unparsable persisted playback rate {:?}", raw),
            }
        }

        Self {
            store: StateStore::new(initial),
            backend: Arc::new(Mutex::new(backend)),
            scheduler,
            prefs: Arc::new(Mutex::new(prefs)),
            element: Arc::new(Mutex::new(None)),
            playback_id: Arc::new(AtomicU64::new(0)),
            pending_advance: Arc::new(Mutex::new(None)),
            attempt_total_ayahs: Arc::new(Mutex::new(None)),
        }
    }

    /// The shared state store observed by UI consumers.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Current playback state snapshot.
    pub fn snapshot(&self) -> PlaybackState {
        self.store.snapshot()
    }

    /// Start one playback attempt. Always safe to call; any previous attempt
    /// is invalidated and torn down first.
    pub(crate) fn begin(&self, surah: u32, ayah: u32, mode: PlayMode, total_ayahs: Option<u32>) {
        let id = self.playback_id.fetch_add(1, Ordering::SeqCst) + 1;
        info!("playback attempt {}: verse {}:{} ({:?})", id, surah, ayah, mode);

        self.cancel_pending_advance();
        self.teardown_element();
        *self.attempt_total_ayahs.lock().unwrap() = total_ayahs;

        let url = verse::audio_url(surah, ayah);
        self.store.update(|state| {
            state.current_verse = Some(VerseKey::new(surah, ayah));
            state.is_loading = true;
            state.is_buffering = false;
            state.error = None;
            state.progress = 0.0;
            state.duration = 0.0;
            state.audio_url = Some(url.clone());
            state.play_mode = mode;
            match mode {
                PlayMode::Single => state.surah_data = None,
                PlayMode::Surah => {
                    if let Some(total) = total_ayahs {
                        state.surah_data = Some(SurahSpan {
                            surah,
                            total_ayahs: total,
                        });
                    }
                }
            }
        });

        let events = {
            let player = self.clone();
            EventSink::new(move |event| player.handle_media_event(id, event))
        };

        let created = self.backend.lock().unwrap().create_element(events);
        let mut element = match created {
            Ok(element) => element,
            Err(err) => {
                warn!("media element creation failed: {}", err);
                self.store.update(|state| {
                    state.error = Some(LOAD_ERROR_MESSAGE.to_string());
                    state.is_loading = false;
                    state.is_buffering = false;
                    state.is_playing = false;
                });
                return;
            }
        };

        let snapshot = self.store.snapshot();
        element.set_volume(snapshot.volume);
        element.set_playback_rate(snapshot.playback_rate);
        element.set_looping(snapshot.is_looping && mode == PlayMode::Single);
        element.set_source(&url);
        element.load();

        if let Err(err) = element.play() {
            warn!("play request rejected: {}", err);
            self.store.update(|state| {
                state.error = Some(PLAY_ERROR_MESSAGE.to_string());
                state.is_loading = false;
                state.is_buffering = false;
                state.is_playing = false;
            });
            return;
        }

        *self.element.lock().unwrap() = Some(element);
    }

    /// Dispatch one media event, dropping it when the attempt that produced
    /// it has been superseded.
    fn handle_media_event(&self, id: u64, event: MediaEvent) {
        if self.playback_id.load(Ordering::SeqCst) != id {
            debug!("dropping stale media event from attempt {}: {:?}", id, event);
            return;
        }

        match event {
            MediaEvent::Ended => self.on_ended(id),
            other => self.store.update(|state| state.apply(&other)),
        }
    }

    /// Pause, clear, and release the live element, if any.
    pub(crate) fn teardown_element(&self) {
        let taken = self.element.lock().unwrap().take();
        if let Some(mut element) = taken {
            debug!("tearing down live media element");
            element.pause();
            element.set_source("");
        }
    }

    pub(crate) fn cancel_pending_advance(&self) {
        if let Some(handle) = self.pending_advance.lock().unwrap().take() {
            handle.cancel();
        }
    }

    pub(crate) fn invalidate_session(&self) -> u64 {
        self.playback_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn current_playback_id(&self) -> u64 {
        self.playback_id.load(Ordering::SeqCst)
    }

    pub(crate) fn store_handle(&self) -> StateStore {
        self.store.clone()
    }

    pub(crate) fn with_element(&self, apply: impl FnOnce(&mut Box<dyn MediaElement>)) {
        if let Some(element) = self.element.lock().unwrap().as_mut() {
            apply(element);
        }
    }

    pub(crate) fn try_element_play(&self) -> Option<Result<(), crate::playback::media::PlaybackError>> {
        self.element.lock().unwrap().as_mut().map(|element| element.play())
    }

    pub(crate) fn attempt_total_ayahs(&self) -> Option<u32> {
        *self.attempt_total_ayahs.lock().unwrap()
    }

    pub(crate) fn set_pending_advance(&self, handle: TimerHandle) {
        *self.pending_advance.lock().unwrap() = Some(handle);
    }

    pub(crate) fn persist_playback_rate(&self, rate: f32) {
        self.prefs
            .lock()
            .unwrap()
            .set(PLAYBACK_RATE_KEY, &rate.to_string());
    }
}
