//! Verb-level control surface consumed by UI layers.
//!
//! Every verb here is fire-and-forget: failures become `state.error`, never
//! a value the caller has to handle. Button handlers should not need
//! try/catch semantics around playback.

use log::{info, warn};

use crate::playback::state::{clamp_playback_rate, clamp_volume, PlayMode, PLAY_ERROR_MESSAGE};
use crate::verse::SurahSpan;

use super::Player;

impl Player {
    /// Play a single verse, replacing whatever was playing.
    pub fn play_verse(&self, surah: u32, ayah: u32) {
        self.begin(surah, ayah, PlayMode::Single, None);
    }

    /// Play a surah continuously, starting at `start_from_ayah`.
    pub fn play_surah(&self, surah: u32, total_ayahs: u32, start_from_ayah: u32) {
        self.begin(surah, start_from_ayah, PlayMode::Surah, Some(total_ayahs));
    }

    /// Pause the live element; no-op when nothing is playing.
    pub fn pause_audio(&self) {
        if !self.snapshot().is_playing {
            return;
        }
        self.with_element(|element| element.pause());
    }

    /// Resume the live element; no-op without one. Re-issuing `play_verse`
    /// is the recovery path once an attempt has failed.
    pub fn resume_audio(&self) {
        if let Some(Err(err)) = self.try_element_play() {
            warn!("resume rejected: {}", err);
            self.store_handle().update(|state| {
                state.error = Some(PLAY_ERROR_MESSAGE.to_string());
                state.is_playing = false;
            });
        }
    }

    /// Tear down playback entirely and reset state, keeping the user's
    /// volume, rate, and loop preferences.
    pub fn stop_audio(&self) {
        info!("stopping playback");
        self.invalidate_session();
        self.cancel_pending_advance();
        self.teardown_element();
        self.store_handle().update(|state| state.reset());
    }

    /// Seek to `seconds`, clamped to `[0, duration]`. Negative or
    /// non-finite input is a contract violation from the caller and is
    /// silently ignored.
    pub fn seek_to(&self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            return;
        }
        let duration = self.snapshot().duration;
        let target = seconds.min(duration);
        self.with_element(|element| element.seek(target));
    }

    /// Set the volume, clamped to `[0, 1]`, on state and the live element.
    pub fn set_volume(&self, volume: f32) {
        let volume = clamp_volume(volume);
        self.store_handle().update(|state| state.volume = volume);
        self.with_element(|element| element.set_volume(volume));
    }

    /// Set the playback rate, clamped to `[0.5, 2]`, and persist it for
    /// future sessions.
    pub fn set_playback_rate(&self, rate: f32) {
        let rate = clamp_playback_rate(rate);
        self.store_handle()
            .update(|state| state.playback_rate = rate);
        self.with_element(|element| element.set_playback_rate(rate));
        self.persist_playback_rate(rate);
    }

    /// Toggle looping. The element's native loop flag is only driven in
    /// single mode; surah looping is handled by the sequencer.
    pub fn set_looping(&self, looping: bool) {
        self.store_handle().update(|state| state.is_looping = looping);
        if self.snapshot().play_mode == PlayMode::Single {
            self.with_element(|element| element.set_looping(looping));
        }
    }

    /// Advance to the next verse. In surah mode the advance is bounded by
    /// the surah's total ayahs; past the last verse this is a no-op.
    pub fn play_next_verse(&self) {
        let snapshot = self.snapshot();
        let Some(verse) = snapshot.current_verse else {
            return;
        };
        let next = verse.ayah + 1;
        let limit = snapshot.surah_data.map(|span: SurahSpan| span.total_ayahs);
        if snapshot.play_mode == PlayMode::Surah {
            if let Some(limit) = limit {
                if next > limit {
                    return;
                }
            }
        }
        self.begin(verse.surah, next, snapshot.play_mode, limit);
    }

    /// Go back one verse. Clamped at ayah 1: there is no verse zero to
    /// request from the CDN.
    pub fn play_previous_verse(&self) {
        let snapshot = self.snapshot();
        let Some(verse) = snapshot.current_verse else {
            return;
        };
        if verse.ayah <= 1 {
            return;
        }
        let limit = snapshot.surah_data.map(|span| span.total_ayahs);
        self.begin(verse.surah, verse.ayah - 1, snapshot.play_mode, limit);
    }

    /// Clear a surfaced error without touching playback.
    pub fn clear_error(&self) {
        self.store_handle().update(|state| state.error = None);
    }
}
