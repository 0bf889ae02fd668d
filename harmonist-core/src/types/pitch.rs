//! Pitches, pitch classes and pitch sets
//!
//! A [`Pitch`] is an absolute semitone number with MIDI semantics (60 = middle C).
//! A [`PitchClass`] is a pitch taken modulo 12: 0=C, 1=C#/Db, 2=D, ... 11=B.

use crate::error::{HarmonyError, Result};
use std::fmt;

pub type Pitch = i32;
pub type PitchClass = u8;

/// Reference pitch for symbol parsing and function resolution
pub const MIDDLE_C: Pitch = 60;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Key roots conventionally spelled with flats (Db, Eb, F, Gb, Ab, Bb)
pub const FLAT_KEY_ROOTS: [PitchClass; 6] = [1, 3, 5, 6, 8, 10];

/// Pitch class of a pitch (Euclidean, so negative pitches still land in 0-11)
pub fn pitch_class(pitch: Pitch) -> PitchClass {
    pitch.rem_euclid(12) as PitchClass
}

/// Sharp spelling of a pitch class
pub fn pitch_class_name(pc: PitchClass) -> &'static str {
    SHARP_NAMES[(pc % 12) as usize]
}

/// Spell a pitch class with sharps or flats
pub fn spelled_name(pc: PitchClass, use_flats: bool) -> &'static str {
    if use_flats {
        FLAT_NAMES[(pc % 12) as usize]
    } else {
        SHARP_NAMES[(pc % 12) as usize]
    }
}

/// Scientific pitch name, e.g. 60 -> "C4", 58 -> "A#3"
pub fn pitch_name(pitch: Pitch) -> String {
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", pitch_class_name(pitch_class(pitch)), octave)
}

fn letter_pitch_class(letter: char) -> Option<PitchClass> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Parse a letter (A-G, uppercase) plus optional `#`/`b`/`♯`/`♭` from the start of `text`.
///
/// Returns the pitch class and the number of bytes consumed, so callers can
/// continue parsing a quality suffix or an octave number.
pub fn parse_pitch_class_prefix(text: &str) -> Result<(PitchClass, usize)> {
    let mut chars = text.char_indices();
    let (_, letter) = chars
        .next()
        .ok_or_else(|| HarmonyError::InvalidNote(text.to_string()))?;
    let base =
        letter_pitch_class(letter).ok_or_else(|| HarmonyError::InvalidNote(text.to_string()))?;

    let mut consumed = letter.len_utf8();
    let mut offset: i32 = 0;
    if let Some((_, c)) = chars.next() {
        match c {
            '#' | '♯' => {
                offset = 1;
                consumed += c.len_utf8();
            }
            'b' | '♭' => {
                offset = -1;
                consumed += c.len_utf8();
            }
            _ => {}
        }
    }

    Ok((((base as i32 + offset).rem_euclid(12)) as PitchClass, consumed))
}

/// Parse a bare pitch class name such as "C", "F#" or "Bb"
pub fn parse_pitch_class(text: &str) -> Result<PitchClass> {
    let text = text.trim();
    let (pc, consumed) = parse_pitch_class_prefix(text)?;
    if consumed != text.len() {
        return Err(HarmonyError::InvalidNote(text.to_string()));
    }
    Ok(pc)
}

/// Parse a pitch from either a MIDI number ("60") or a scientific name ("C4", "Bb3", "F#-1").
///
/// A name without an octave is placed in octave 4.
pub fn parse_pitch(text: &str) -> Result<Pitch> {
    let text = text.trim();
    if let Ok(number) = text.parse::<Pitch>() {
        return Ok(number);
    }

    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        normalized.push(first.to_ascii_uppercase());
    }
    normalized.extend(chars);

    let (pc, consumed) = parse_pitch_class_prefix(&normalized)?;
    let octave_text = &normalized[consumed..];
    let octave: i32 = if octave_text.is_empty() {
        4
    } else {
        octave_text
            .parse()
            .map_err(|_| HarmonyError::InvalidNote(text.to_string()))?
    };

    octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|base| base.checked_add(pc as Pitch))
        .ok_or_else(|| HarmonyError::InvalidNote(text.to_string()))
}

/// An ordered set of distinct pitches, always sorted ascending.
///
/// The first element is the bass (lowest sounding pitch), which is not
/// necessarily the harmonic root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PitchSet {
    pitches: Vec<Pitch>,
}

impl PitchSet {
    /// Build a pitch set from any pitches; duplicates are removed and the result sorted
    pub fn new(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        let mut pitches: Vec<Pitch> = pitches.into_iter().collect();
        pitches.sort_unstable();
        pitches.dedup();
        PitchSet { pitches }
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Lowest sounding pitch
    pub fn bass(&self) -> Option<Pitch> {
        self.pitches.first().copied()
    }

    /// Highest sounding pitch
    pub fn top(&self) -> Option<Pitch> {
        self.pitches.last().copied()
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.pitches.binary_search(&pitch).is_ok()
    }

    /// Position of a pitch within the sorted set
    pub fn position(&self, pitch: Pitch) -> Option<usize> {
        self.pitches.binary_search(&pitch).ok()
    }

    /// Distinct pitch classes, sorted
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let mut pcs: Vec<PitchClass> = self.pitches.iter().map(|&p| pitch_class(p)).collect();
        pcs.sort_unstable();
        pcs.dedup();
        pcs
    }

    pub fn iter(&self) -> impl Iterator<Item = Pitch> + '_ {
        self.pitches.iter().copied()
    }

    /// Transpose every pitch by a number of semitones
    pub fn transpose(&self, semitones: i32) -> Self {
        PitchSet {
            pitches: self.pitches.iter().map(|p| p + semitones).collect(),
        }
    }

    pub fn into_vec(self) -> Vec<Pitch> {
        self.pitches
    }
}

impl FromIterator<Pitch> for PitchSet {
    fn from_iter<I: IntoIterator<Item = Pitch>>(iter: I) -> Self {
        PitchSet::new(iter)
    }
}

impl From<Vec<Pitch>> for PitchSet {
    fn from(pitches: Vec<Pitch>) -> Self {
        PitchSet::new(pitches)
    }
}

impl From<&[Pitch]> for PitchSet {
    fn from(pitches: &[Pitch]) -> Self {
        PitchSet::new(pitches.iter().copied())
    }
}

impl<const N: usize> From<[Pitch; N]> for PitchSet {
    fn from(pitches: [Pitch; N]) -> Self {
        PitchSet::new(pitches)
    }
}

impl fmt::Display for PitchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.pitches.iter().map(|&p| pitch_name(p)).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_wraps_negative() {
        assert_eq!(pitch_class(60), 0);
        assert_eq!(pitch_class(71), 11);
        assert_eq!(pitch_class(-1), 11);
    }

    #[test]
    fn test_pitch_names() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(69), "A4");
        assert_eq!(pitch_name(58), "A#3");
        assert_eq!(spelled_name(10, true), "Bb");
    }

    #[test]
    fn test_parse_pitch() {
        assert_eq!(parse_pitch("60").unwrap(), 60);
        assert_eq!(parse_pitch("C4").unwrap(), 60);
        assert_eq!(parse_pitch("A4").unwrap(), 69);
        assert_eq!(parse_pitch("Bb3").unwrap(), 58);
        assert_eq!(parse_pitch("f#2").unwrap(), 42);
        assert_eq!(parse_pitch("E").unwrap(), 64);
        assert!(parse_pitch("X4").is_err());
        assert!(parse_pitch("C#x").is_err());
        assert_eq!(
            parse_pitch("C999999999"),
            Err(HarmonyError::InvalidNote("C999999999".to_string()))
        );
        assert!(parse_pitch("B-999999999").is_err());
    }

    #[test]
    fn test_parse_pitch_class_prefix() {
        assert_eq!(parse_pitch_class_prefix("Bbm7").unwrap(), (10, 2));
        assert_eq!(parse_pitch_class_prefix("C7b9").unwrap(), (0, 1));
        assert_eq!(parse_pitch_class_prefix("Cb").unwrap(), (11, 2));
        assert!(parse_pitch_class_prefix("").is_err());
        assert!(parse_pitch_class("H").is_err());
    }

    #[test]
    fn test_pitch_set_sorts_and_dedups() {
        let set = PitchSet::new(vec![67, 60, 64, 60]);
        assert_eq!(set.pitches(), &[60, 64, 67]);
        assert_eq!(set.bass(), Some(60));
        assert_eq!(set.top(), Some(67));
        assert_eq!(set.position(64), Some(1));
    }

    #[test]
    fn test_pitch_classes() {
        let set = PitchSet::from([48, 60, 64, 79]);
        assert_eq!(set.pitch_classes(), vec![0, 4, 7]);
        assert_eq!(set.to_string(), "[C3, C4, E4, G5]");
    }
}
