//! Chord symbols in both directions: "Cmaj7/E" <-> pitches

use crate::error::{HarmonyError, Result};
use crate::types::pitch::parse_pitch_class_prefix;
use crate::types::quality::{self, ChordQuality};
use crate::types::{
    parse_pitch_class, pitch_class, pitch_class_name, spelled_name, Pitch, PitchClass, PitchSet,
    MIDDLE_C,
};

/// Symbol for a root and quality, e.g. (60, "minor7") -> "Cm7"
pub fn symbol_from_chord(root: Pitch, quality_name: &str) -> String {
    format!(
        "{}{}",
        pitch_class_name(pitch_class(root)),
        quality::suffix_for(quality_name)
    )
}

/// Symbol with a slash bass, appended only when the bass differs from the root
pub fn symbol_with_bass(root: Pitch, quality_name: &str, bass: Pitch) -> String {
    spelled_symbol(root, quality_name, bass, false)
}

/// Symbol for the given inversion: inversion `n` puts the n-th chord tone in the bass
pub fn symbol_with_inversion(root: Pitch, quality_name: &str, inversion: usize) -> String {
    let intervals = quality::lookup_or_major(quality_name).intervals;
    let bass = root + intervals[inversion % intervals.len()] as Pitch;
    symbol_with_bass(root, quality_name, bass)
}

/// Symbol spelled with flats or sharps
pub fn spelled_symbol(root: Pitch, quality_name: &str, bass: Pitch, use_flats: bool) -> String {
    let root_pc = pitch_class(root);
    let bass_pc = pitch_class(bass);
    let mut symbol = format!(
        "{}{}",
        spelled_name(root_pc, use_flats),
        quality::suffix_for(quality_name)
    );
    if bass_pc != root_pc {
        symbol.push('/');
        symbol.push_str(spelled_name(bass_pc, use_flats));
    }
    symbol
}

/// A parsed chord symbol before it is voiced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub root: PitchClass,
    pub quality: &'static ChordQuality,
    pub bass: Option<PitchClass>,
}

/// Parse `<A-G><#|b>?<quality>?(/<bass>)?`
pub fn parse_symbol(text: &str) -> Result<ParsedSymbol> {
    let text = text.trim();
    let (root, consumed) =
        parse_pitch_class_prefix(text).map_err(|_| HarmonyError::InvalidSymbol(text.to_string()))?;
    let rest = &text[consumed..];

    // Tokens such as "6/9" contain a slash themselves
    if let Some(quality) = quality::from_token(rest) {
        return Ok(ParsedSymbol {
            root,
            quality,
            bass: None,
        });
    }

    let (token, bass) = match rest.rfind('/') {
        Some(index) => {
            let bass = parse_pitch_class(&rest[index + 1..])
                .map_err(|_| HarmonyError::InvalidSymbol(text.to_string()))?;
            (&rest[..index], Some(bass))
        }
        None => (rest, None),
    };

    let quality = quality::from_token(token)
        .ok_or_else(|| HarmonyError::UnknownQuality(token.to_string()))?;

    Ok(ParsedSymbol {
        root,
        quality,
        bass,
    })
}

/// Walk pitches low to high so each sits above the previous, within an octave where possible
pub fn voice_ascending(pitches: &[Pitch]) -> Vec<Pitch> {
    let mut voiced: Vec<Pitch> = Vec::with_capacity(pitches.len());
    for &pitch in pitches {
        let mut pitch = pitch;
        if let Some(&previous) = voiced.last() {
            while pitch <= previous {
                pitch += 12;
            }
            while pitch - previous > 12 && pitch - 12 > previous {
                pitch -= 12;
            }
        }
        voiced.push(pitch);
    }
    voiced
}

/// Voice a chord symbol around middle C; `None` for malformed or unknown symbols.
///
/// A slash bass lands on the nearest matching pitch below the root and any
/// chord tone sharing its pitch class is dropped from the upper structure.
pub fn chord_from_symbol(text: &str) -> Option<PitchSet> {
    let parsed = parse_symbol(text).ok()?;
    let root = MIDDLE_C + parsed.root as Pitch;
    let mut pitches: Vec<Pitch> = parsed
        .quality
        .intervals
        .iter()
        .map(|&i| root + i as Pitch)
        .collect();

    if let Some(bass_pc) = parsed.bass.filter(|&b| b != parsed.root) {
        let bass = root - (parsed.root as Pitch - bass_pc as Pitch).rem_euclid(12);
        pitches.retain(|&p| p >= bass && pitch_class(p) != bass_pc);
        pitches.insert(0, bass);
    }

    let voiced = voice_ascending(&pitches);
    debug_assert!(voiced.windows(2).all(|w| w[0] < w[1]));
    Some(PitchSet::new(voiced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symbol_from_chord() {
        assert_eq!(symbol_from_chord(60, "major"), "C");
        assert_eq!(symbol_from_chord(61, "minor7"), "C#m7");
        assert_eq!(symbol_from_chord(70, "half_diminished7"), "A#m7b5");
        assert_eq!(symbol_from_chord(60, "nonsense"), "C");
    }

    #[test]
    fn test_symbol_with_bass_and_inversion() {
        assert_eq!(symbol_with_bass(60, "major", 64), "C/E");
        assert_eq!(symbol_with_bass(60, "major", 48), "C");
        assert_eq!(symbol_with_inversion(60, "dominant7", 3), "C7/A#");
        assert_eq!(spelled_symbol(70, "major7", 62, true), "Bbmaj7/D");
    }

    #[test]
    fn test_chord_from_symbol_simple() {
        assert_eq!(chord_from_symbol("C").unwrap().pitches(), &[60, 64, 67]);
        assert_eq!(chord_from_symbol("Am7").unwrap().pitches(), &[69, 72, 76, 79]);
        assert_eq!(chord_from_symbol("Bbmaj7").unwrap().pitches(), &[70, 74, 77, 81]);
        assert_eq!(chord_from_symbol("Dm-7").map(|s| s.len()), None);
    }

    #[test]
    fn test_chord_from_symbol_slash_bass() {
        // E below C, then G above
        assert_eq!(chord_from_symbol("C/E").unwrap().pitches(), &[52, 60, 67]);
        // non-chord bass is simply added underneath
        assert_eq!(chord_from_symbol("C/D").unwrap().pitches(), &[50, 60, 64, 67]);
    }

    #[test]
    fn test_chord_from_symbol_aliases() {
        assert_eq!(chord_from_symbol("C-7"), chord_from_symbol("Cm7"));
        assert_eq!(chord_from_symbol("CΔ7"), chord_from_symbol("Cmaj7"));
        assert_eq!(chord_from_symbol("C6/9"), chord_from_symbol("C69"));
    }

    #[test]
    fn test_chord_from_symbol_rejects_malformed() {
        assert!(chord_from_symbol("").is_none());
        assert!(chord_from_symbol("H7").is_none());
        assert!(chord_from_symbol("Cxyz").is_none());
        assert!(chord_from_symbol("C/Q").is_none());
        assert!(matches!(
            parse_symbol("Cwhat"),
            Err(HarmonyError::UnknownQuality(_))
        ));
    }
}
