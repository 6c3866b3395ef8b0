//! # Tilawa Audio Library
//!
//! This library provides the core playback controller for the Tilawa
//! recitation player. It includes modules for the playback state machine,
//! media element lifecycle management, verse addressing, and preference
//! persistence.

pub mod playback;
pub mod prefs;
pub mod reporter;
pub mod test_support;
pub mod verse;
