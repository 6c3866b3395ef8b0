//! Shared state store with change notification.

use std::sync::{Arc, Mutex};

use crate::playback::state::PlaybackState;

type Listener = Arc<dyn Fn(&PlaybackState) + Send + Sync>;

/// Process-wide holder of the [`PlaybackState`].
///
/// Mutations go through [`StateStore::update`], which applies one closure
/// under the lock and then notifies subscribers with the resulting snapshot.
/// Subscribers are read-only observers; they must not call back into the
/// store from the notification.
#[derive(Clone)]
pub struct StateStore {
    state: Arc<Mutex<PlaybackState>>,
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl StateStore {
    pub fn new(initial: PlaybackState) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> PlaybackState {
        self.state.lock().unwrap().clone()
    }

    /// Apply one mutation and notify subscribers once.
    pub fn update(&self, mutate: impl FnOnce(&mut PlaybackState)) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            mutate(&mut state);
            state.clone()
        };
        self.notify(&snapshot);
    }

    /// Register a subscriber invoked after every mutation.
    pub fn subscribe(&self, listener: impl Fn(&PlaybackState) + Send + Sync + 'static) {
        self.listeners.lock().unwrap().push(Arc::new(listener));
    }

    fn notify(&self, snapshot: &PlaybackState) {
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(PlaybackState::default())
    }
}
