//! The chord vocabulary
//!
//! [`VOCABULARY`] lists every named chord quality in identification priority
//! order. Identification scans it front to back and takes the first exact
//! interval-set match, so the order here is load-bearing.

/// Broad grouping of a chord quality, used for display and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum QualityFamily {
    Triad,
    Seventh,
    Extended,
    Altered,
    Suspended,
    Added,
    Power,
    Sixth,
}

/// A named chord quality: a canonical interval set above the root plus its symbol suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChordQuality {
    pub name: &'static str,
    pub intervals: &'static [u8],
    pub suffix: &'static str,
    pub family: QualityFamily,
}

/// Quality name used when nothing in the vocabulary matches
pub const UNKNOWN: &str = "unknown";

const fn quality(
    name: &'static str,
    intervals: &'static [u8],
    suffix: &'static str,
    family: QualityFamily,
) -> ChordQuality {
    ChordQuality {
        name,
        intervals,
        suffix,
        family,
    }
}

use QualityFamily::*;

pub static VOCABULARY: &[ChordQuality] = &[
    quality("major", &[0, 4, 7], "", Triad),
    quality("minor", &[0, 3, 7], "m", Triad),
    quality("diminished", &[0, 3, 6], "dim", Triad),
    quality("augmented", &[0, 4, 8], "aug", Triad),
    quality("dominant7", &[0, 4, 7, 10], "7", Seventh),
    quality("major7", &[0, 4, 7, 11], "maj7", Seventh),
    quality("minor7", &[0, 3, 7, 10], "m7", Seventh),
    quality("minor_major7", &[0, 3, 7, 11], "mMaj7", Seventh),
    quality("diminished7", &[0, 3, 6, 9], "dim7", Seventh),
    quality("half_diminished7", &[0, 3, 6, 10], "m7b5", Seventh),
    quality("augmented7", &[0, 4, 8, 10], "aug7", Seventh),
    quality("augmented_major7", &[0, 4, 8, 11], "augMaj7", Seventh),
    quality("dominant9", &[0, 2, 4, 7, 10], "9", Extended),
    quality("major9", &[0, 2, 4, 7, 11], "maj9", Extended),
    quality("minor9", &[0, 2, 3, 7, 10], "m9", Extended),
    quality("dominant11", &[0, 2, 4, 5, 7, 10], "11", Extended),
    quality("minor11", &[0, 2, 3, 5, 7, 10], "m11", Extended),
    quality("major11", &[0, 2, 4, 5, 7, 11], "maj11", Extended),
    quality("dominant13", &[0, 2, 4, 7, 9, 10], "13", Extended),
    quality("major13", &[0, 2, 4, 7, 9, 11], "maj13", Extended),
    quality("minor13", &[0, 2, 3, 7, 9, 10], "m13", Extended),
    quality("dominant7_flat5", &[0, 4, 6, 10], "7b5", Altered),
    quality("dominant7_flat9", &[0, 1, 4, 7, 10], "7b9", Altered),
    quality("dominant7_sharp9", &[0, 3, 4, 7, 10], "7#9", Altered),
    quality("dominant7_sharp11", &[0, 4, 6, 7, 10], "7#11", Altered),
    quality("dominant7_flat13", &[0, 4, 7, 8, 10], "7b13", Altered),
    quality("altered", &[0, 1, 3, 4, 6, 8, 10], "7alt", Altered),
    quality("sus2", &[0, 2, 7], "sus2", Suspended),
    quality("sus4", &[0, 5, 7], "sus4", Suspended),
    quality("dominant7_sus4", &[0, 5, 7, 10], "7sus4", Suspended),
    quality("dominant7_sus2", &[0, 2, 7, 10], "7sus2", Suspended),
    quality("dominant9_sus4", &[0, 2, 5, 7, 10], "9sus4", Suspended),
    quality("add9", &[0, 2, 4, 7], "add9", Added),
    quality("minor_add9", &[0, 2, 3, 7], "madd9", Added),
    quality("add11", &[0, 4, 5, 7], "add11", Added),
    quality("minor_add11", &[0, 3, 5, 7], "madd11", Added),
    quality("power", &[0, 7], "5", Power),
    quality("major6", &[0, 4, 7, 9], "6", Sixth),
    quality("minor6", &[0, 3, 7, 9], "m6", Sixth),
    quality("major6_9", &[0, 2, 4, 7, 9], "69", Sixth),
    quality("minor6_9", &[0, 2, 3, 7, 9], "m69", Sixth),
];

/// Alternative spellings accepted when parsing chord symbols
static ALIASES: &[(&str, &str)] = &[
    ("M", "major"),
    ("maj", "major"),
    ("min", "minor"),
    ("-", "minor"),
    ("°", "diminished"),
    ("o", "diminished"),
    ("+", "augmented"),
    ("dom7", "dominant7"),
    ("M7", "major7"),
    ("Δ", "major7"),
    ("Δ7", "major7"),
    ("ma7", "major7"),
    ("min7", "minor7"),
    ("-7", "minor7"),
    ("mM7", "minor_major7"),
    ("m(maj7)", "minor_major7"),
    ("minmaj7", "minor_major7"),
    ("°7", "diminished7"),
    ("o7", "diminished7"),
    ("ø", "half_diminished7"),
    ("ø7", "half_diminished7"),
    ("-7b5", "half_diminished7"),
    ("min7b5", "half_diminished7"),
    ("+7", "augmented7"),
    ("7#5", "augmented7"),
    ("+M7", "augmented_major7"),
    ("maj7#5", "augmented_major7"),
    ("M9", "major9"),
    ("Δ9", "major9"),
    ("min9", "minor9"),
    ("-9", "minor9"),
    ("min11", "minor11"),
    ("-11", "minor11"),
    ("M11", "major11"),
    ("M13", "major13"),
    ("Δ13", "major13"),
    ("min13", "minor13"),
    ("-13", "minor13"),
    ("alt", "altered"),
    ("sus", "sus4"),
    ("7sus", "dominant7_sus4"),
    ("9sus", "dominant9_sus4"),
    ("2", "add9"),
    ("add2", "add9"),
    ("madd2", "minor_add9"),
    ("m(add9)", "minor_add9"),
    ("add4", "add11"),
    ("6/9", "major6_9"),
    ("m6/9", "minor6_9"),
    ("min6", "minor6"),
    ("-6", "minor6"),
];

impl ChordQuality {
    /// Whether `interval` (mod 12) is part of this quality
    pub fn contains(&self, interval: u8) -> bool {
        self.intervals.contains(&(interval % 12))
    }

    /// Number of distinct pitch classes in the quality
    pub fn size(&self) -> usize {
        self.intervals.len()
    }

    /// Pitch classes of the quality built on `root_pc`
    pub fn pitch_classes(&self, root_pc: u8) -> Vec<u8> {
        self.intervals
            .iter()
            .map(|&interval| (root_pc + interval) % 12)
            .collect()
    }
}

/// Look up a quality by its vocabulary name
pub fn lookup(name: &str) -> Option<&'static ChordQuality> {
    VOCABULARY.iter().find(|quality| quality.name == name)
}

/// Look up a quality by name, falling back to major for unknown names
pub fn lookup_or_major(name: &str) -> &'static ChordQuality {
    lookup(name).unwrap_or(&VOCABULARY[0])
}

/// Resolve a symbol suffix or alias token to a quality ("" is major)
pub fn from_token(token: &str) -> Option<&'static ChordQuality> {
    if let Some(quality) = VOCABULARY.iter().find(|q| q.suffix == token) {
        return Some(quality);
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .and_then(|(_, name)| lookup(name))
}

/// Display suffix for a quality name; unknown qualities get a "?" marker
pub fn suffix_for(name: &str) -> &'static str {
    match lookup(name) {
        Some(quality) => quality.suffix,
        None if name == UNKNOWN => "?",
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_intervals_well_formed() {
        for quality in VOCABULARY {
            assert_eq!(quality.intervals[0], 0, "{} must contain the root", quality.name);
            for pair in quality.intervals.windows(2) {
                assert!(pair[0] < pair[1], "{} must ascend strictly", quality.name);
            }
            assert!(quality.intervals.iter().all(|&i| i < 12));
        }
    }

    #[test]
    fn test_vocabulary_entries_distinct() {
        assert_eq!(VOCABULARY.len(), 41);
        let names: HashSet<_> = VOCABULARY.iter().map(|q| q.name).collect();
        let intervals: HashSet<_> = VOCABULARY.iter().map(|q| q.intervals).collect();
        let suffixes: HashSet<_> = VOCABULARY.iter().map(|q| q.suffix).collect();
        assert_eq!(names.len(), VOCABULARY.len());
        assert_eq!(intervals.len(), VOCABULARY.len());
        assert_eq!(suffixes.len(), VOCABULARY.len());
    }

    #[test]
    fn test_aliases_resolve() {
        for (alias, name) in ALIASES {
            assert!(lookup(name).is_some(), "alias {} points at missing {}", alias, name);
        }
        assert_eq!(from_token("").unwrap().name, "major");
        assert_eq!(from_token("-7").unwrap().name, "minor7");
        assert_eq!(from_token("ø").unwrap().name, "half_diminished7");
        assert!(from_token("xyz").is_none());
    }

    #[test]
    fn test_lookup_falls_back_to_major() {
        assert_eq!(lookup_or_major("minor7").name, "minor7");
        assert_eq!(lookup_or_major("nonsense").name, "major");
        assert_eq!(suffix_for(UNKNOWN), "?");
    }
}
