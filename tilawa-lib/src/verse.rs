//! Verse addressing and the recitation CDN contract.

use serde::{Deserialize, Serialize};

/// Number of surahs in the Quran.
pub const SURAH_COUNT: u32 = 114;

/// Total number of ayahs across all surahs (Kufan count).
pub const TOTAL_AYAH_COUNT: u32 = 6236;

const AUDIO_CDN_BASE: &str = "https://verses.quran.com/Alafasy/mp3";

/// Per-surah ayah counts, indexed by `surah - 1`.
const AYAH_COUNTS: [u32; SURAH_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Identifies one ayah within a surah. Both ids are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseKey {
    pub surah: u32,
    pub ayah: u32,
}

impl VerseKey {
    pub fn new(surah: u32, ayah: u32) -> Self {
        Self { surah, ayah }
    }
}

impl std::fmt::Display for VerseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

/// Extent of a surah used by continuous playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurahSpan {
    pub surah: u32,
    pub total_ayahs: u32,
}

/// Build the recitation audio URL for a verse.
///
/// The CDN path is deterministic: zero-padded 3-digit surah and ayah
/// segments concatenated into a single file name.
pub fn audio_url(surah: u32, ayah: u32) -> String {
    format!("{AUDIO_CDN_BASE}/{surah:03}{ayah:03}.mp3")
}

/// Ayah count for a surah, or `None` when the surah id is out of range.
pub fn ayah_count(surah: u32) -> Option<u32> {
    if surah == 0 || surah > SURAH_COUNT {
        return None;
    }
    Some(AYAH_COUNTS[(surah - 1) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_url_pads_segments() {
        assert_eq!(
            audio_url(7, 3),
            "https://verses.quran.com/Alafasy/mp3/007003.mp3"
        );
        assert_eq!(
            audio_url(114, 6),
            "https://verses.quran.com/Alafasy/mp3/114006.mp3"
        );
        assert_eq!(
            audio_url(2, 255),
            "https://verses.quran.com/Alafasy/mp3/002255.mp3"
        );
    }

    #[test]
    fn ayah_counts_match_canonical_totals() {
        assert_eq!(ayah_count(1), Some(7));
        assert_eq!(ayah_count(2), Some(286));
        assert_eq!(ayah_count(114), Some(6));
        assert_eq!(ayah_count(0), None);
        assert_eq!(ayah_count(115), None);

        let total: u32 = (1..=SURAH_COUNT).map(|s| ayah_count(s).unwrap()).sum();
        assert_eq!(total, TOTAL_AYAH_COUNT);
    }

    #[test]
    fn verse_key_displays_as_surah_colon_ayah() {
        assert_eq!(VerseKey::new(2, 255).to_string(), "2:255");
    }
}
