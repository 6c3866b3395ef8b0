//! Playback state snapshot and the media event transition function.

use serde::Serialize;

use crate::playback::media::MediaEvent;
use crate::verse::{SurahSpan, VerseKey};

pub const DEFAULT_VOLUME: f32 = 0.8;
pub const DEFAULT_PLAYBACK_RATE: f32 = 1.0;
pub const MIN_PLAYBACK_RATE: f32 = 0.5;
pub const MAX_PLAYBACK_RATE: f32 = 2.0;

/// Message shown when a source fails to load or decode.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load audio. Please try again.";
/// Message shown when a play request is rejected.
pub const PLAY_ERROR_MESSAGE: &str = "Failed to play audio. Please check your connection.";

/// How the sequencer treats the end of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayMode {
    /// One verse, optionally looping that same verse.
    Single,
    /// Sequential advance through a surah from a starting verse.
    Surah,
}

/// Authoritative playback state. One instance lives for the whole session;
/// UI consumers observe immutable snapshots of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_loading: bool,
    pub is_buffering: bool,
    pub error: Option<String>,
    /// Track currently associated with the media element, independent of
    /// whether it has started producing sound.
    pub current_verse: Option<VerseKey>,
    pub audio_url: Option<String>,
    /// Seconds elapsed in the current track.
    pub progress: f64,
    /// Track duration in seconds; 0 until metadata loads.
    pub duration: f64,
    pub volume: f32,
    pub playback_rate: f32,
    pub play_mode: PlayMode,
    /// Only meaningful while `play_mode` is [`PlayMode::Surah`].
    pub surah_data: Option<SurahSpan>,
    pub is_looping: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_loading: false,
            is_buffering: false,
            error: None,
            current_verse: None,
            audio_url: None,
            progress: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            play_mode: PlayMode::Single,
            surah_data: None,
            is_looping: false,
        }
    }
}

impl PlaybackState {
    /// Apply one media event to the state.
    ///
    /// [`MediaEvent::Ended`] is deliberately not handled here; end-of-track
    /// is a sequencing decision, not a state transition.
    pub fn apply(&mut self, event: &MediaEvent) {
        match event {
            MediaEvent::LoadStart => {
                self.is_loading = true;
                self.is_buffering = true;
            }
            MediaEvent::DataLoaded => {
                self.is_buffering = false;
            }
            MediaEvent::MetadataLoaded { duration } => {
                self.duration = *duration;
                self.is_loading = false;
            }
            MediaEvent::CanPlay => {
                self.is_loading = false;
                self.is_buffering = false;
            }
            MediaEvent::TimeUpdate { seconds } => {
                self.progress = *seconds;
            }
            MediaEvent::Waiting => {
                self.is_buffering = true;
            }
            MediaEvent::Playing => {
                self.is_playing = true;
                self.is_buffering = false;
            }
            MediaEvent::Paused => {
                self.is_playing = false;
            }
            MediaEvent::Error { .. } => {
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
                self.is_loading = false;
                self.is_buffering = false;
                self.is_playing = false;
            }
            MediaEvent::Ended => {}
        }
    }

    /// Clear everything back to initial defaults, preserving the user
    /// preferences (`volume`, `playback_rate`, `is_looping`).
    pub fn reset(&mut self) {
        let volume = self.volume;
        let playback_rate = self.playback_rate;
        let is_looping = self.is_looping;
        *self = Self::default();
        self.volume = volume;
        self.playback_rate = playback_rate;
        self.is_looping = is_looping;
    }
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        DEFAULT_VOLUME
    }
}

pub fn clamp_playback_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    } else {
        DEFAULT_PLAYBACK_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_start_marks_loading_and_buffering() {
        let mut state = PlaybackState::default();
        state.apply(&MediaEvent::LoadStart);
        assert!(state.is_loading);
        assert!(state.is_buffering);
    }

    #[test]
    fn metadata_sets_duration_and_clears_loading() {
        let mut state = PlaybackState::default();
        state.apply(&MediaEvent::LoadStart);
        state.apply(&MediaEvent::MetadataLoaded { duration: 12.5 });
        assert_eq!(state.duration, 12.5);
        assert!(!state.is_loading);
        assert!(state.is_buffering);
        state.apply(&MediaEvent::CanPlay);
        assert!(!state.is_buffering);
    }

    #[test]
    fn playing_and_paused_toggle_is_playing() {
        let mut state = PlaybackState::default();
        state.apply(&MediaEvent::Playing);
        assert!(state.is_playing);
        assert!(!state.is_buffering);
        state.apply(&MediaEvent::Paused);
        assert!(!state.is_playing);
    }

    #[test]
    fn waiting_marks_buffering_without_stopping_playback() {
        let mut state = PlaybackState::default();
        state.apply(&MediaEvent::Playing);
        state.apply(&MediaEvent::Waiting);
        assert!(state.is_playing);
        assert!(state.is_buffering);
    }

    #[test]
    fn error_clears_activity_and_sets_message() {
        let mut state = PlaybackState::default();
        state.apply(&MediaEvent::LoadStart);
        state.apply(&MediaEvent::Playing);
        state.apply(&MediaEvent::Error {
            message: "http status 404".to_string(),
        });
        assert_eq!(state.error.as_deref(), Some(LOAD_ERROR_MESSAGE));
        assert!(!state.is_loading);
        assert!(!state.is_buffering);
        assert!(!state.is_playing);
    }

    #[test]
    fn ended_is_not_a_state_transition() {
        let mut state = PlaybackState::default();
        state.apply(&MediaEvent::Playing);
        let before = state.clone();
        state.apply(&MediaEvent::Ended);
        assert_eq!(state, before);
    }

    #[test]
    fn reset_preserves_preferences_only() {
        let mut state = PlaybackState {
            is_playing: true,
            is_loading: true,
            error: Some("boom".to_string()),
            current_verse: Some(VerseKey::new(2, 5)),
            audio_url: Some("x".to_string()),
            progress: 3.0,
            duration: 9.0,
            volume: 0.3,
            playback_rate: 1.5,
            play_mode: PlayMode::Surah,
            surah_data: Some(SurahSpan {
                surah: 2,
                total_ayahs: 286,
            }),
            is_looping: true,
            ..PlaybackState::default()
        };
        state.reset();
        assert_eq!(state.volume, 0.3);
        assert_eq!(state.playback_rate, 1.5);
        assert!(state.is_looping);
        assert!(state.current_verse.is_none());
        assert!(state.surah_data.is_none());
        assert!(state.error.is_none());
        assert!(!state.is_playing);
        assert_eq!(state.play_mode, PlayMode::Single);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.duration, 0.0);
    }

    #[test]
    fn clamps_cover_out_of_range_and_non_finite_input() {
        assert_eq!(clamp_volume(-1.0), 0.0);
        assert_eq!(clamp_volume(5.0), 1.0);
        assert_eq!(clamp_volume(f32::NAN), DEFAULT_VOLUME);
        assert_eq!(clamp_playback_rate(0.1), MIN_PLAYBACK_RATE);
        assert_eq!(clamp_playback_rate(10.0), MAX_PLAYBACK_RATE);
        assert_eq!(clamp_playback_rate(f32::INFINITY), DEFAULT_PLAYBACK_RATE);
    }
}
