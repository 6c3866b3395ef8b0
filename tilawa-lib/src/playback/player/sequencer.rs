//! End-of-track sequencing: loop, advance, wrap, or terminate.

use std::time::Duration;

use log::{debug, info};

use crate::playback::state::PlayMode;

use super::Player;

/// Pause before replaying the same verse in a single-verse loop. Gives the
/// UI a visible reset instead of a tight replay.
pub(crate) const SINGLE_LOOP_DELAY: Duration = Duration::from_millis(200);
/// Pause between consecutive verses in surah mode.
pub(crate) const SURAH_ADVANCE_DELAY: Duration = Duration::from_millis(400);

impl Player {
    /// Decide what happens after a track ends naturally.
    ///
    /// Priority order: single-verse loop, surah advance, surah wrap-around,
    /// terminate. Every scheduled continuation re-checks the playback id
    /// before firing, so a user navigation in the gap wins.
    pub(crate) fn on_ended(&self, id: u64) {
        let snapshot = self.snapshot();
        self.store_handle().update(|state| state.is_playing = false);

        let Some(verse) = snapshot.current_verse else {
            return;
        };

        if snapshot.is_looping && snapshot.play_mode == PlayMode::Single {
            debug!("looping verse {}", verse);
            self.schedule_begin(id, SINGLE_LOOP_DELAY, verse.surah, verse.ayah, PlayMode::Single, None);
            return;
        }

        if snapshot.play_mode == PlayMode::Surah {
            let limit = self
                .attempt_total_ayahs()
                .or(snapshot.surah_data.map(|span| span.total_ayahs));
            if let Some(limit) = limit {
                if verse.ayah + 1 <= limit {
                    self.schedule_begin(
                        id,
                        SURAH_ADVANCE_DELAY,
                        verse.surah,
                        verse.ayah + 1,
                        PlayMode::Surah,
                        Some(limit),
                    );
                    return;
                }
                if snapshot.is_looping {
                    debug!("wrapping surah {} back to its first verse", verse.surah);
                    self.schedule_begin(
                        id,
                        SURAH_ADVANCE_DELAY,
                        verse.surah,
                        1,
                        PlayMode::Surah,
                        Some(limit),
                    );
                    return;
                }
            }
        }

        info!("playback finished at verse {}", verse);
        self.store_handle().update(|state| {
            state.play_mode = PlayMode::Single;
            state.surah_data = None;
        });
    }

    fn schedule_begin(
        &self,
        id: u64,
        delay: Duration,
        surah: u32,
        ayah: u32,
        mode: PlayMode,
        total_ayahs: Option<u32>,
    ) {
        let player = self.clone();
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if player.current_playback_id() != id {
                    debug!("dropping stale advance to {}:{}", surah, ayah);
                    return;
                }
                player.begin(surah, ayah, mode, total_ayahs);
            }),
        );
        self.set_pending_advance(handle);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::playback::media::MediaEvent;
    use crate::playback::player::Player;
    use crate::playback::state::PlayMode;
    use crate::prefs::MemoryPreferences;
    use crate::test_support::{ManualScheduler, MockMediaBackend};
    use crate::verse::VerseKey;

    use super::{SINGLE_LOOP_DELAY, SURAH_ADVANCE_DELAY};

    fn fixture() -> (Player, MockMediaBackend, ManualScheduler) {
        let backend = MockMediaBackend::new();
        let scheduler = ManualScheduler::new();
        let player = Player::new(
            Box::new(backend.clone()),
            Arc::new(scheduler.clone()),
            Box::new(MemoryPreferences::default()),
        );
        (player, backend, scheduler)
    }

    #[test]
    fn single_verse_loop_replays_the_same_verse() {
        let (player, backend, scheduler) = fixture();
        player.set_looping(true);
        player.play_verse(1, 1);
        backend.handle(0).emit(MediaEvent::Ended);

        assert_eq!(scheduler.next_delay(), Some(SINGLE_LOOP_DELAY));
        assert!(scheduler.fire_next());

        assert_eq!(backend.created(), 2);
        assert_eq!(player.snapshot().current_verse, Some(VerseKey::new(1, 1)));
    }

    #[test]
    fn surah_mode_advances_to_the_next_verse_after_a_delay() {
        let (player, backend, scheduler) = fixture();
        player.play_surah(2, 286, 4);
        backend.handle(0).emit(MediaEvent::Ended);

        assert_eq!(scheduler.next_delay(), Some(SURAH_ADVANCE_DELAY));
        assert!(scheduler.fire_next());

        let state = player.snapshot();
        assert_eq!(state.current_verse, Some(VerseKey::new(2, 5)));
        assert_eq!(state.play_mode, PlayMode::Surah);
    }

    #[test]
    fn surah_end_without_looping_terminates() {
        let (player, backend, scheduler) = fixture();
        player.play_surah(2, 5, 5);
        backend.handle(0).emit(MediaEvent::Ended);

        assert_eq!(scheduler.pending(), 0);
        let state = player.snapshot();
        assert_eq!(state.play_mode, PlayMode::Single);
        assert!(state.surah_data.is_none());
        assert!(!state.is_playing);
        assert_eq!(backend.created(), 1);
    }

    #[test]
    fn surah_end_with_looping_wraps_to_the_first_verse() {
        let (player, backend, scheduler) = fixture();
        player.set_looping(true);
        player.play_surah(2, 3, 3);
        backend.handle(0).emit(MediaEvent::Ended);

        assert!(scheduler.fire_next());

        let state = player.snapshot();
        assert_eq!(state.current_verse, Some(VerseKey::new(2, 1)));
        assert_eq!(state.play_mode, PlayMode::Surah);
        assert_eq!(state.surah_data.map(|span| span.total_ayahs), Some(3));
    }

    #[test]
    fn scheduled_advance_from_a_superseded_attempt_is_dropped() {
        let (player, backend, scheduler) = fixture();
        player.play_surah(2, 286, 1);
        backend.handle(0).emit(MediaEvent::Ended);
        assert_eq!(scheduler.pending(), 1);

        // The user navigates away before the advance timer fires.
        player.play_verse(7, 3);
        assert!(scheduler.fire_next());

        assert_eq!(backend.created(), 2);
        assert_eq!(player.snapshot().current_verse, Some(VerseKey::new(7, 3)));
    }

    #[test]
    fn new_attempt_cancels_the_pending_advance_timer() {
        let (player, backend, scheduler) = fixture();
        player.play_surah(2, 286, 1);
        backend.handle(0).emit(MediaEvent::Ended);

        player.play_verse(7, 3);
        assert!(scheduler.next_is_cancelled());
    }

    #[test]
    fn stale_ended_event_cannot_schedule_an_advance() {
        let (player, backend, scheduler) = fixture();
        player.play_surah(2, 286, 1);
        player.play_verse(7, 3);

        backend.handle(0).emit(MediaEvent::Ended);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn chained_advances_walk_the_whole_surah() {
        let (player, backend, scheduler) = fixture();
        player.play_surah(114, 6, 5);

        backend.handle(0).emit(MediaEvent::Ended);
        assert!(scheduler.fire_next());
        assert_eq!(player.snapshot().current_verse, Some(VerseKey::new(114, 6)));

        backend.handle(1).emit(MediaEvent::Ended);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(player.snapshot().play_mode, PlayMode::Single);
    }
}
