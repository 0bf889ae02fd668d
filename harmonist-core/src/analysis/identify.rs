//! Chord identification from raw pitch sets

use super::roman::function_symbol;
use super::tension::{extract_tensions, tension_score};
use crate::types::quality::{self, ChordQuality, UNKNOWN, VOCABULARY};
use crate::types::{ChordAnalysis, InversionCandidate, KeyContext, Pitch, PitchSet};
use tracing::trace;

/// Distinct intervals (mod 12) of every pitch above `reference`, sorted
pub fn intervals_above(pitches: &[Pitch], reference: Pitch) -> Vec<u8> {
    let mut intervals: Vec<u8> = pitches
        .iter()
        .map(|&p| (p - reference).rem_euclid(12) as u8)
        .collect();
    intervals.sort_unstable();
    intervals.dedup();
    intervals
}

/// First vocabulary entry whose interval set equals `intervals` exactly
pub fn exact_match(intervals: &[u8]) -> Option<&'static ChordQuality> {
    VOCABULARY.iter().find(|quality| quality.intervals == intervals)
}

/// Exact match, else major/minor when the triad core is present, else "unknown"
pub fn match_intervals(intervals: &[u8]) -> &'static str {
    if let Some(quality) = exact_match(intervals) {
        return quality.name;
    }
    let has = |i: u8| intervals.contains(&i);
    if has(4) && has(7) {
        "major"
    } else if has(3) && has(7) {
        "minor"
    } else {
        UNKNOWN
    }
}

/// Name the quality of a pitch set, reading intervals above its lowest pitch.
///
/// Never fails: empty input or an unmatched set yields "unknown".
pub fn identify_quality(pitches: &[Pitch]) -> &'static str {
    match pitches.iter().min() {
        Some(&bass) => match_intervals(&intervals_above(pitches, bass)),
        None => UNKNOWN,
    }
}

/// Try every pitch as the root and keep the readings that identify as something
pub fn enumerate_inversions(pitches: &[Pitch]) -> Vec<InversionCandidate> {
    let set = PitchSet::from(pitches);
    let Some(bass) = set.bass() else {
        return Vec::new();
    };

    set.iter()
        .enumerate()
        .filter_map(|(inversion, root)| {
            let quality = match_intervals(&intervals_above(set.pitches(), root));
            trace!(root, inversion, quality, "inversion candidate");
            (quality != UNKNOWN).then(|| InversionCandidate {
                root,
                bass,
                inversion,
                quality: quality.to_string(),
            })
        })
        .collect()
}

/// Full analysis of a pitch set, optionally naming its function in `key`.
///
/// The root is the first pitch (lowest first) whose intervals exactly match a
/// vocabulary entry; with no exact reading the bass is taken as root with the
/// major/minor/unknown fallback.
pub fn analyze(pitches: &[Pitch], key: Option<&KeyContext>) -> ChordAnalysis {
    let set = PitchSet::from(pitches);
    let Some(bass) = set.bass() else {
        return ChordAnalysis {
            root: 0,
            quality: UNKNOWN.to_string(),
            bass: 0,
            inversion: 0,
            tensions: Vec::new(),
            alterations: Vec::new(),
            tension: 0.0,
            function: None,
            pitches: Vec::new(),
        };
    };

    let exact = set.iter().enumerate().find_map(|(inversion, root)| {
        exact_match(&intervals_above(set.pitches(), root)).map(|q| (root, inversion, q.name))
    });
    let (root, inversion, quality_name) = exact
        .unwrap_or_else(|| (bass, 0, match_intervals(&intervals_above(set.pitches(), bass))));

    build_analysis(root, quality_name, inversion, set.pitches(), key)
}

/// Assemble an analysis for a known root and quality
pub(crate) fn build_analysis(
    root: Pitch,
    quality_name: &str,
    inversion: usize,
    pitches: &[Pitch],
    key: Option<&KeyContext>,
) -> ChordAnalysis {
    let bass = pitches.iter().min().copied().unwrap_or(root);
    let (tensions, alterations) = extract_tensions(root, pitches);
    let function = key.map(|key| function_symbol(root, quality_name, key));

    ChordAnalysis {
        root,
        quality: quality_name.to_string(),
        bass,
        inversion,
        tensions,
        alterations,
        tension: tension_score(pitches),
        function,
        pitches: pitches.to_vec(),
    }
}

/// Pitches of `quality_name` stacked on `root` (unknown names read as major)
pub fn chord_tones(root: Pitch, quality_name: &str) -> Vec<Pitch> {
    quality::lookup_or_major(quality_name)
        .intervals
        .iter()
        .map(|&i| root + i as Pitch)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identify_basic_triads() {
        assert_eq!(identify_quality(&[60, 64, 67]), "major");
        assert_eq!(identify_quality(&[62, 65, 69]), "minor");
        assert_eq!(identify_quality(&[71, 74, 77]), "diminished");
        assert_eq!(identify_quality(&[60, 64, 68]), "augmented");
    }

    #[test]
    fn test_identify_fallbacks() {
        // Major triad plus a chromatic cluster tone: no exact entry, but {4,7} present
        assert_eq!(identify_quality(&[60, 61, 64, 66, 67]), "major");
        assert_eq!(identify_quality(&[60, 61, 63, 67, 68]), "minor");
        assert_eq!(identify_quality(&[60, 61, 62]), UNKNOWN);
        assert_eq!(identify_quality(&[]), UNKNOWN);
    }

    #[test]
    fn test_identify_ignores_octave_doubling() {
        assert_eq!(identify_quality(&[48, 60, 64, 67, 72]), "major");
        assert_eq!(identify_quality(&[67, 64, 60]), "major");
    }

    #[test]
    fn test_enumerate_inversions_first_inversion() {
        // E G C: only C as root yields a quality
        let candidates = enumerate_inversions(&[64, 67, 72]);
        assert_eq!(
            candidates,
            vec![InversionCandidate {
                root: 72,
                bass: 64,
                inversion: 2,
                quality: "major".to_string(),
            }]
        );
    }

    #[test]
    fn test_enumerate_inversions_ambiguous_sixth() {
        // C E G A reads as C6 and as Am7
        let candidates = enumerate_inversions(&[60, 64, 67, 69]);
        let readings: Vec<(Pitch, &str)> = candidates
            .iter()
            .map(|c| (c.root, c.quality.as_str()))
            .collect();
        assert_eq!(readings, vec![(60, "major6"), (69, "minor7")]);
    }

    #[test]
    fn test_analyze_inversion() {
        let analysis = analyze(&[64, 67, 72], None);
        assert_eq!(analysis.root, 72);
        assert_eq!(analysis.quality, "major");
        assert_eq!(analysis.bass, 64);
        assert_eq!(analysis.inversion, 2);
        assert_eq!(analysis.symbol(), "C/E");
        assert_eq!(analysis.function, None);
    }

    #[test]
    fn test_analyze_in_key() {
        let key = KeyContext::major(0);
        let analysis = analyze(&[67, 71, 74, 77], Some(&key));
        assert_eq!(analysis.quality, "dominant7");
        assert_eq!(analysis.function.as_deref(), Some("V7"));
    }

    #[test]
    fn test_analyze_empty() {
        let analysis = analyze(&[], None);
        assert!(analysis.is_unknown());
        assert!(analysis.pitches.is_empty());
        assert_eq!(analysis.tension, 0.0);
    }
}
