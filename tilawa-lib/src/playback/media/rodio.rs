//! Real media backend: rodio output plus a blocking HTTPS fetch.
//!
//! Each element runs one worker thread that fetches and decodes the verse
//! mp3, drives a rodio [`Sink`], and synthesizes the [`MediaEvent`] stream
//! the controller expects from a media element.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};

use super::{EventSink, MediaBackend, MediaElement, MediaEvent, PlaybackError};

const OUTPUT_STREAM_OPEN_RETRIES: usize = 10;
const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;
const POLL_INTERVAL_MS: u64 = 100;

/// Backend producing [`RodioElement`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioBackend;

impl RodioBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for RodioBackend {
    fn create_element(&mut self, events: EventSink) -> Result<Box<dyn MediaElement>, PlaybackError> {
        Ok(Box::new(RodioElement::new(events)))
    }
}

/// Shared transport state between the element and its worker thread.
struct Transport {
    sink: Mutex<Option<Sink>>,
    abort: AtomicBool,
    want_playing: AtomicBool,
    volume: Mutex<f32>,
    rate: Mutex<f32>,
    looping: AtomicBool,
    pending_seek: Mutex<Option<f64>>,
}

impl Transport {
    fn new() -> Self {
        Self {
            sink: Mutex::new(None),
            abort: AtomicBool::new(false),
            want_playing: AtomicBool::new(false),
            volume: Mutex::new(1.0),
            rate: Mutex::new(1.0),
            looping: AtomicBool::new(false),
            pending_seek: Mutex::new(None),
        }
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }
}

/// One rodio-backed track.
pub struct RodioElement {
    url: Option<String>,
    events: EventSink,
    transport: Arc<Transport>,
}

impl RodioElement {
    fn new(events: EventSink) -> Self {
        Self {
            url: None,
            events,
            transport: Arc::new(Transport::new()),
        }
    }
}

impl MediaElement for RodioElement {
    fn set_source(&mut self, url: &str) {
        self.url = if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        };
    }

    fn load(&mut self) {
        let Some(url) = self.url.clone() else {
            self.events.emit(MediaEvent::Error {
                message: "no source configured".to_string(),
            });
            return;
        };
        let transport = self.transport.clone();
        let events = self.events.clone();
        thread::spawn(move || run_worker(url, transport, events));
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.transport.want_playing.store(true, Ordering::SeqCst);
        let resumed = {
            let sink = self.transport.sink.lock().unwrap();
            match sink.as_ref() {
                Some(sink) => {
                    sink.play();
                    true
                }
                None => false,
            }
        };
        if resumed {
            self.events.emit(MediaEvent::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.transport.want_playing.store(false, Ordering::SeqCst);
        let paused = {
            let sink = self.transport.sink.lock().unwrap();
            match sink.as_ref() {
                Some(sink) => {
                    sink.pause();
                    true
                }
                None => false,
            }
        };
        if paused {
            self.events.emit(MediaEvent::Paused);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        *self.transport.volume.lock().unwrap() = volume;
        if let Some(sink) = self.transport.sink.lock().unwrap().as_ref() {
            sink.set_volume(volume);
        }
    }

    fn set_playback_rate(&mut self, rate: f32) {
        *self.transport.rate.lock().unwrap() = rate;
        if let Some(sink) = self.transport.sink.lock().unwrap().as_ref() {
            sink.set_speed(rate);
        }
    }

    fn set_looping(&mut self, looping: bool) {
        // Only honored before the worker appends the source; the player
        // configures the flag at element creation.
        self.transport.looping.store(looping, Ordering::SeqCst);
    }

    fn seek(&mut self, seconds: f64) {
        let sink = self.transport.sink.lock().unwrap();
        match sink.as_ref() {
            Some(sink) => {
                if let Err(err) = sink.try_seek(Duration::from_secs_f64(seconds)) {
                    warn!("seek to {:.2}s failed: {}", seconds, err);
                }
            }
            None => {
                *self.transport.pending_seek.lock().unwrap() = Some(seconds);
            }
        }
    }
}

impl Drop for RodioElement {
    fn drop(&mut self) {
        self.transport.abort.store(true, Ordering::SeqCst);
        if let Some(sink) = self.transport.sink.lock().unwrap().take() {
            sink.stop();
        }
    }
}

fn run_worker(url: String, transport: Arc<Transport>, events: EventSink) {
    events.emit(MediaEvent::LoadStart);

    let bytes = match fetch(&url) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to fetch {}: {}", url, err);
            events.emit(MediaEvent::Error {
                message: err.to_string(),
            });
            return;
        }
    };
    if transport.aborted() {
        return;
    }
    events.emit(MediaEvent::DataLoaded);

    let source = match Decoder::new(Cursor::new(bytes)) {
        Ok(source) => source.buffered(),
        Err(err) => {
            warn!("failed to decode {}: {}", url, err);
            events.emit(MediaEvent::Error {
                message: format!("decode failed: {}", err),
            });
            return;
        }
    };
    let duration = source
        .total_duration()
        .map(|total| total.as_secs_f64())
        .unwrap_or(0.0);
    events.emit(MediaEvent::MetadataLoaded { duration });

    let mut stream = None;
    for attempt in 1..=OUTPUT_STREAM_OPEN_RETRIES {
        if transport.aborted() {
            return;
        }
        match OutputStreamBuilder::open_default_stream() {
            Ok(opened) => {
                stream = Some(opened);
                break;
            }
            Err(err) => {
                if attempt == OUTPUT_STREAM_OPEN_RETRIES {
                    warn!(
                        "failed to open default output stream after {} attempts: {}",
                        OUTPUT_STREAM_OPEN_RETRIES, err
                    );
                    events.emit(MediaEvent::Error {
                        message: format!("output stream unavailable: {}", err),
                    });
                    return;
                }
                debug!(
                    "open_default_stream attempt {}/{} failed: {}",
                    attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                );
                thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
            }
        }
    }
    let stream = match stream {
        Some(stream) => stream,
        None => return,
    };
    let mixer = stream.mixer().clone();

    {
        let sink = Sink::connect_new(&mixer);
        sink.pause();
        sink.set_volume(*transport.volume.lock().unwrap());
        sink.set_speed(*transport.rate.lock().unwrap());
        if transport.looping.load(Ordering::SeqCst) {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        *transport.sink.lock().unwrap() = Some(sink);
    }
    events.emit(MediaEvent::CanPlay);

    if let Some(seconds) = transport.pending_seek.lock().unwrap().take() {
        if let Some(sink) = transport.sink.lock().unwrap().as_ref() {
            if let Err(err) = sink.try_seek(Duration::from_secs_f64(seconds)) {
                warn!("deferred seek to {:.2}s failed: {}", seconds, err);
            }
        }
    }

    if transport.want_playing.load(Ordering::SeqCst) {
        if let Some(sink) = transport.sink.lock().unwrap().as_ref() {
            sink.play();
        }
        events.emit(MediaEvent::Playing);
    }

    // Poll the sink until the track drains or the element is torn down.
    // The output stream must outlive this loop.
    let mut started = false;
    loop {
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        if transport.aborted() {
            if let Some(sink) = transport.sink.lock().unwrap().take() {
                sink.stop();
            }
            return;
        }

        let (paused, empty, position) = {
            let sink = transport.sink.lock().unwrap();
            let Some(sink) = sink.as_ref() else {
                return;
            };
            (sink.is_paused(), sink.empty(), sink.get_pos())
        };

        if !paused && !empty {
            started = true;
            events.emit(MediaEvent::TimeUpdate {
                seconds: position.as_secs_f64(),
            });
        }
        if started && empty {
            debug!("track drained: {}", url);
            events.emit(MediaEvent::Ended);
            return;
        }
    }
}

fn fetch(url: &str) -> Result<Vec<u8>, PlaybackError> {
    let response = reqwest::blocking::get(url)
        .map_err(|err| PlaybackError::Source(format!("request failed: {}", err)))?;
    if !response.status().is_success() {
        return Err(PlaybackError::Source(format!(
            "http status {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|err| PlaybackError::Source(format!("body read failed: {}", err)))?;
    Ok(bytes.to_vec())
}
