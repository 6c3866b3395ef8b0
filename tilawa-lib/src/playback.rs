//! Playback controller: state store, media element lifecycle, sequencing.

pub mod media;
pub mod player;
pub mod scheduler;
pub mod state;
pub mod store;
