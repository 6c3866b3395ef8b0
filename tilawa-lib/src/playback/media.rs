//! Media element abstraction and the events it reports.
//!
//! The controller never talks to an audio device directly; it drives a
//! [`MediaElement`] obtained from a [`MediaBackend`] and reacts to the
//! [`MediaEvent`] stream the element delivers through its [`EventSink`].
//! This is the seam that lets the whole state machine run against a
//! recording mock in tests.

pub mod rodio;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Error type for media backend and transport failures.
#[derive(Debug)]
pub enum PlaybackError {
    Io(std::io::Error),
    /// The audio source could not be fetched or decoded.
    Source(String),
    /// The output device or play request failed.
    Output(String),
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Source(err) => write!(f, "source error: {}", err),
            Self::Output(err) => write!(f, "output error: {}", err),
        }
    }
}

impl std::error::Error for PlaybackError {}

impl From<std::io::Error> for PlaybackError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Asynchronous notifications a media element reports while loading and
/// playing one track.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Loading of the source has begun.
    LoadStart,
    /// Enough data arrived to leave the buffering state.
    DataLoaded,
    /// Track metadata is available; `duration` is in seconds.
    MetadataLoaded { duration: f64 },
    /// Playback can start without further buffering.
    CanPlay,
    /// Playback position moved; `seconds` since the start of the track.
    TimeUpdate { seconds: f64 },
    /// Playback stalled waiting for data.
    Waiting,
    /// Audio is audibly playing.
    Playing,
    /// Playback was paused.
    Paused,
    /// The element failed; `message` carries backend detail for logging.
    Error { message: String },
    /// The track finished naturally.
    Ended,
}

/// Channel through which a media element delivers events to its owner.
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(MediaEvent) + Send + Sync>);

impl EventSink {
    pub fn new(handler: impl Fn(MediaEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    pub fn emit(&self, event: MediaEvent) {
        (self.0)(event)
    }
}

/// One playable track. Created per playback attempt, dropped on teardown;
/// dropping the element must release its transport and stop any worker.
pub trait MediaElement: Send {
    /// Set the source URL. An empty string clears the source.
    fn set_source(&mut self, url: &str);
    /// Begin fetching and decoding the configured source.
    fn load(&mut self);
    /// Request playback. May start audio later, once loading completes.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn set_playback_rate(&mut self, rate: f32);
    /// Native single-track looping; surah looping is sequenced above this.
    fn set_looping(&mut self, looping: bool);
    /// Move the playback position to `seconds`.
    fn seek(&mut self, seconds: f64);
}

/// Factory for media elements.
pub trait MediaBackend: Send {
    fn create_element(&mut self, events: EventSink) -> Result<Box<dyn MediaElement>, PlaybackError>;
}
